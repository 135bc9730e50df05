//! OAuth Relay Library
//!
//! Stateless OAuth2 authorization-code relay for a single identity provider
//! (Twitch by default).
//!
//! # Features
//!
//! - **Consent redirect**: scope set chosen by the caller's `state` prefix
//!   (`bot…` → bot scopes, anything else → broadcaster scopes)
//! - **Token exchange**: authorization code and refresh token grants proxied
//!   to the provider's token endpoint; status and body relayed verbatim
//! - **Denylist**: known-bad refresh tokens rejected without a network call
//! - **Failure isolation**: provider timeouts and read errors become `502`
//!   for that request only

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod app;
pub mod cli;
pub mod config;
pub mod error;
pub mod oauth;

pub use error::{Error, Result};

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Setup tracing/logging
///
/// `RUST_LOG` takes precedence over `level`. `format` is `"json"` or text.
pub fn setup_tracing(level: &str, format: Option<&str>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::registry().with(filter);

    let installed = match format {
        Some("json") => subscriber.with(fmt::layer().json()).try_init(),
        _ => subscriber.with(fmt::layer()).try_init(),
    };

    installed.map_err(|e| Error::Internal(format!("Failed to install tracing subscriber: {e}")))
}
