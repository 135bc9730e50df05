//! HTTP router and handlers

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, RawQuery, State},
    http::header::CONTENT_TYPE,
    response::{IntoResponse, Redirect, Response},
    routing::get,
};
use serde_json::json;
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};

use crate::oauth::{CallbackOutcome, OAuthRelay, UpstreamResponse};

/// Shared application state
pub struct AppState {
    /// Relay handling both OAuth entry points
    pub relay: Arc<OAuthRelay>,
}

/// Authorization callback query parameters
#[derive(Debug, Default, PartialEq, Eq)]
pub struct CallbackParams {
    /// Authorization code (present on the provider's redirect back)
    pub code: Option<String>,
    /// Opaque caller state; a `bot` prefix selects bot scopes
    pub state: Option<String>,
}

impl CallbackParams {
    /// Parse a raw query string, keeping the first value of each key
    ///
    /// Repeated or unknown keys are never an error here, so every request
    /// reaches the relay and gets its configuration and state checks.
    pub fn from_query(query: Option<&str>) -> Self {
        let mut params = Self::default();
        for (key, value) in url::form_urlencoded::parse(query.unwrap_or_default().as_bytes()) {
            let slot = match &*key {
                "code" => &mut params.code,
                "state" => &mut params.state,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value.into_owned());
            }
        }
        params
    }
}

/// Create the router
///
/// Routes:
/// - `GET /health`
/// - `GET {callback_path}` consent redirect or code exchange
/// - `GET {callback_path}/refresh/{token}` refresh exchange
pub fn create_router(state: Arc<AppState>, callback_path: &str) -> Router {
    let callback_path = format!("/{}", callback_path.trim_matches('/'));

    Router::new()
        .route("/health", get(health_handler))
        .route(&callback_path, get(callback_handler))
        .route(&format!("{callback_path}/refresh/{{token}}"), get(refresh_handler))
        .layer(CatchPanicLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET /health
async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "configured": state.relay.is_configured(),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// GET {callback_path}
async fn callback_handler(
    State(state): State<Arc<AppState>>,
    RawQuery(query): RawQuery,
) -> Response {
    let params = CallbackParams::from_query(query.as_deref());
    match state
        .relay
        .callback(params.code.as_deref(), params.state.as_deref())
        .await
    {
        Ok(CallbackOutcome::Redirect(url)) => Redirect::to(url.as_str()).into_response(),
        Ok(CallbackOutcome::Exchanged(upstream)) => relay_response(upstream),
        Err(e) => e.into_response(),
    }
}

/// GET {callback_path}/refresh/{token}
async fn refresh_handler(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
) -> Response {
    match state.relay.refresh(&token).await {
        Ok(upstream) => relay_response(upstream),
        Err(e) => e.into_response(),
    }
}

/// Provider status and body, unchanged, as JSON
fn relay_response(upstream: UpstreamResponse) -> Response {
    (
        upstream.status,
        [(CONTENT_TYPE, "application/json")],
        upstream.body,
    )
        .into_response()
}
