//! Shared helpers for relay integration tests

#![allow(dead_code)]

use std::io;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    Router,
    body::{Body, Bytes},
    extract::RawQuery,
    http::{HeaderMap, Request, StatusCode},
    routing::post,
};
use oauth_relay::{
    Error, Result,
    app::{AppState, create_router},
    config::ProviderConfig,
    oauth::{Denylist, OAuthRelay, TokenRequest, TokenTransport, UpstreamResponse},
};
use tokio::net::TcpListener;

pub const CALLBACK_PATH: &str = "/credentials/twitch";
pub const BANNED: &str = "zkfsdt0m1sknz8f0vdrd2yp6ldk4fx2exvkfg5nhybhug3fryz";

/// Test double for the token endpoint: records requests, replays a canned answer
pub struct FakeTransport {
    requests: Mutex<Vec<TokenRequest>>,
    reply: std::result::Result<(StatusCode, &'static str), &'static str>,
}

impl FakeTransport {
    pub fn replying(status: StatusCode, body: &'static str) -> Arc<Self> {
        Arc::new(Self {
            requests: Mutex::new(Vec::new()),
            reply: Ok((status, body)),
        })
    }

    pub fn failing(reason: &'static str) -> Arc<Self> {
        Arc::new(Self {
            requests: Mutex::new(Vec::new()),
            reply: Err(reason),
        })
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn last_request(&self) -> Option<TokenRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl TokenTransport for FakeTransport {
    async fn send(&self, request: TokenRequest) -> Result<UpstreamResponse> {
        self.requests.lock().unwrap().push(request);
        match self.reply {
            Ok((status, body)) => Ok(UpstreamResponse {
                status,
                body: Bytes::from_static(body.as_bytes()),
            }),
            Err(reason) => Err(Error::Transport(reason.to_string())),
        }
    }
}

pub fn provider() -> ProviderConfig {
    ProviderConfig {
        client_id: Some("test-client".to_string()),
        client_secret: Some("test-secret".to_string()),
        redirect_uri: Some("https://relay.example".to_string()),
        ..ProviderConfig::default()
    }
}

pub fn router_with(provider: &ProviderConfig, transport: Arc<dyn TokenTransport>) -> Router {
    let relay = OAuthRelay::new(provider, Denylist::new([BANNED]), transport).unwrap();
    create_router(
        Arc::new(AppState {
            relay: Arc::new(relay),
        }),
        &provider.callback_path,
    )
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub async fn body_string(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// In-memory sink for formatted log output
#[derive(Clone, Default)]
pub struct LogCapture(Arc<Mutex<Vec<u8>>>);

impl LogCapture {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }

    /// Install as the thread-local subscriber until the guard drops
    pub fn install(&self) -> tracing::subscriber::DefaultGuard {
        let sink = self.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || sink.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::DEBUG)
            .finish();
        tracing::subscriber::set_default(subscriber)
    }
}

impl io::Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// What the stub token endpoint saw
#[derive(Debug, Clone, Default)]
pub struct SeenRequest {
    pub query: Option<String>,
    pub body: String,
    pub content_type: Option<String>,
}

/// Local token endpoint answering every POST with a fixed status and body
pub struct StubProvider {
    pub base_url: String,
    seen: Arc<Mutex<Vec<SeenRequest>>>,
}

impl StubProvider {
    pub async fn start(status: StatusCode, reply: &'static str) -> Self {
        let seen: Arc<Mutex<Vec<SeenRequest>>> = Arc::default();
        let recorder = Arc::clone(&seen);
        let app = Router::new().route(
            "/oauth2/token",
            post(
                move |RawQuery(query): RawQuery, headers: HeaderMap, body: String| async move {
                    recorder.lock().unwrap().push(SeenRequest {
                        query,
                        body,
                        content_type: headers
                            .get("content-type")
                            .and_then(|v| v.to_str().ok())
                            .map(String::from),
                    });
                    (status, reply)
                },
            ),
        );

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{addr}"),
            seen,
        }
    }

    pub fn requests(&self) -> Vec<SeenRequest> {
        self.seen.lock().unwrap().clone()
    }
}
