//! OAuth 2.0 authorization-code relay
//!
//! - Consent redirect with a scope set picked from the `state` prefix
//! - Authorization code and refresh token exchange against the provider's
//!   token endpoint, relayed verbatim
//! - Refresh-token denylist

mod denylist;
mod relay;
mod scopes;
mod transport;

pub use denylist::Denylist;
pub use relay::{CallbackOutcome, Grant, OAuthRelay, decode_state};
pub use scopes::{AuthMode, AuthorizationRequest, BOT_SCOPES, BROADCASTER_SCOPES};
pub use transport::{HttpTransport, ParamEncoding, TokenRequest, TokenTransport, UpstreamResponse};
