//! Relay server

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tokio::signal;
use tokio::sync::broadcast;
use tracing::{error, info, warn};

use super::router::{AppState, create_router};
use crate::config::Config;
use crate::oauth::{Denylist, HttpTransport, OAuthRelay};
use crate::{Error, Result};

/// OAuth relay HTTP server
pub struct RelayServer {
    /// Configuration
    config: Config,
    /// Relay shared by all handlers
    relay: Arc<OAuthRelay>,
}

impl RelayServer {
    /// Create a server using the reqwest transport
    ///
    /// # Errors
    ///
    /// Returns an error if the denylist file cannot be read, the provider
    /// host is invalid, or the HTTP client cannot be built.
    pub fn new(config: Config) -> Result<Self> {
        let transport = HttpTransport::new(
            config.provider.request_timeout,
            config.provider.connect_timeout,
        )?;
        let denylist = Denylist::from_config(&config.denylist)?;
        info!(entries = denylist.len(), "Refresh-token denylist loaded");

        let relay = OAuthRelay::new(&config.provider, denylist, Arc::new(transport))?;
        Ok(Self::with_relay(config, Arc::new(relay)))
    }

    /// Create a server around an existing relay
    #[must_use]
    pub fn with_relay(config: Config, relay: Arc<OAuthRelay>) -> Self {
        Self { config, relay }
    }

    /// Relay used by this server
    #[must_use]
    pub fn relay(&self) -> &Arc<OAuthRelay> {
        &self.relay
    }

    /// Build the router
    pub fn router(&self) -> Router {
        let state = Arc::new(AppState {
            relay: Arc::clone(&self.relay),
        });
        create_router(state, &self.config.provider.callback_path)
    }

    /// Run until Ctrl-C / SIGTERM, then drain for at most `shutdown_timeout`
    pub async fn run(self) -> Result<()> {
        let addr = SocketAddr::new(
            self.config
                .server
                .host
                .parse()
                .map_err(|e| Error::Config(format!("Invalid host: {e}")))?,
            self.config.server.port,
        );

        let app = self.router();
        let listener = TcpListener::bind(addr).await?;

        let callback = &self.config.provider.callback_path;
        info!(host = %self.config.server.host, port = %self.config.server.port, "Listening");
        info!("  GET {callback}                  (consent redirect / code exchange)");
        info!("  GET {callback}/refresh/{{token}}  (refresh exchange)");
        info!("  GET /health");
        if !self.relay.is_configured() {
            warn!("Provider credentials incomplete - OAuth endpoints will answer 500");
        }

        let (shutdown_tx, mut shutdown_rx) = broadcast::channel(1);
        let mut server = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(shutdown_signal(shutdown_tx))
                .await
        });

        tokio::select! {
            joined = &mut server => return flatten(joined),
            _ = shutdown_rx.recv() => {}
        }

        match tokio::time::timeout(self.config.server.shutdown_timeout, &mut server).await {
            Ok(joined) => flatten(joined),
            Err(_) => {
                warn!(
                    timeout = ?self.config.server.shutdown_timeout,
                    "In-flight requests did not drain in time, aborting"
                );
                server.abort();
                Ok(())
            }
        }
    }
}

fn flatten(
    joined: std::result::Result<std::io::Result<()>, tokio::task::JoinError>,
) -> Result<()> {
    match joined {
        Ok(served) => served.map_err(Error::from),
        Err(e) => Err(Error::Internal(format!("Server task failed: {e}"))),
    }
}

/// Shutdown signal handler
async fn shutdown_signal(shutdown_tx: broadcast::Sender<()>) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("Shutdown signal received");
    let _ = shutdown_tx.send(());
}
