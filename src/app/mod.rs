//! HTTP surface of the relay

mod router;
mod server;

pub use router::{AppState, CallbackParams, create_router};
pub use server::RelayServer;
