//! Authorization redirect and token exchange relay
//!
//! Two inbound shapes are translated into calls to the identity provider:
//!
//! - **Callback without `code`**: decode `state`, pick the scope set and
//!   redirect the user to the provider's consent screen.
//! - **Callback with `code`** / **refresh**: POST to the token endpoint and
//!   hand the provider's status and body back unchanged.
//!
//! Nothing outlives a single request.

use std::fmt;
use std::sync::Arc;

use axum::http::StatusCode;
use tracing::{debug, error, info, warn};
use url::Url;

use super::denylist::Denylist;
use super::scopes::AuthorizationRequest;
use super::transport::{ParamEncoding, TokenRequest, TokenTransport, UpstreamResponse};
use crate::config::{ProviderConfig, ProviderCredentials};
use crate::{Error, Result};

/// Grant used for a token exchange
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum Grant<'a> {
    /// Authorization code returned by the consent redirect
    AuthorizationCode(&'a str),
    /// Previously issued refresh token
    RefreshToken(&'a str),
}

impl Grant<'_> {
    /// OAuth `grant_type` value
    #[must_use]
    pub fn grant_type(&self) -> &'static str {
        match self {
            Self::AuthorizationCode(_) => "authorization_code",
            Self::RefreshToken(_) => "refresh_token",
        }
    }
}

impl fmt::Debug for Grant<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.grant_type())
    }
}

impl fmt::Display for Grant<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.grant_type())
    }
}

/// Result of handling the authorization callback
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackOutcome {
    /// No code yet: send the user to the consent screen
    Redirect(Url),
    /// Code exchanged: relay the provider response
    Exchanged(UpstreamResponse),
}

/// Stateless relay between inbound callers and the identity provider
pub struct OAuthRelay {
    /// `None` when configuration was incomplete at startup
    credentials: Option<ProviderCredentials>,
    authorize_url: Url,
    token_url: String,
    callback_path: String,
    denylist: Denylist,
    transport: Arc<dyn TokenTransport>,
}

impl OAuthRelay {
    /// Create a relay from provider configuration
    ///
    /// Incomplete credentials do not fail construction: they are reported
    /// once here and every request is then answered with a configuration error.
    ///
    /// # Errors
    ///
    /// Returns an error if `id_host` does not form a valid URL.
    pub fn new(
        provider: &ProviderConfig,
        denylist: Denylist,
        transport: Arc<dyn TokenTransport>,
    ) -> Result<Self> {
        let host = provider.id_host.trim_end_matches('/');
        let authorize_url = Url::parse(&format!("{host}/oauth2/authorize"))
            .map_err(|e| Error::Config(format!("Invalid provider id_host: {e}")))?;
        let token_url = Url::parse(&format!("{host}/oauth2/token"))
            .map_err(|e| Error::Config(format!("Invalid provider id_host: {e}")))?
            .to_string();

        let credentials = match provider.credentials() {
            Ok(creds) => {
                info!(id_host = %host, "Provider credentials loaded");
                Some(creds)
            }
            Err(e) => {
                error!(error = %e, "Identity provider is not configured; all requests will fail");
                None
            }
        };

        Ok(Self {
            credentials,
            authorize_url,
            token_url,
            callback_path: provider.callback_path.clone(),
            denylist,
            transport,
        })
    }

    /// Whether provider credentials are complete
    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.credentials.is_some()
    }

    /// Refresh-token denylist in use
    #[must_use]
    pub fn denylist(&self) -> &Denylist {
        &self.denylist
    }

    /// Token endpoint URL
    #[must_use]
    pub fn token_url(&self) -> &str {
        &self.token_url
    }

    fn credentials(&self) -> Result<&ProviderCredentials> {
        self.credentials.as_ref().ok_or_else(|| {
            warn!("Rejecting request: identity provider credentials are not configured");
            Error::Config("provider credentials not configured".to_string())
        })
    }

    /// Handle the authorization callback endpoint
    ///
    /// An absent or empty `code` starts the authorization step; otherwise the
    /// code is exchanged for tokens. `state` is the query value as received.
    ///
    /// # Errors
    ///
    /// [`Error::Config`] if credentials are missing, [`Error::InvalidState`]
    /// for a missing or undecodable state, [`Error::Transport`] if the
    /// provider cannot be reached.
    pub async fn callback(&self, code: Option<&str>, state: Option<&str>) -> Result<CallbackOutcome> {
        self.credentials()?;

        match code.filter(|c| !c.is_empty()) {
            None => self.authorization_url(state).map(CallbackOutcome::Redirect),
            Some(code) => self
                .exchange(Grant::AuthorizationCode(code))
                .await
                .map(CallbackOutcome::Exchanged),
        }
    }

    /// Build the provider consent URL for a raw `state` value
    ///
    /// # Errors
    ///
    /// [`Error::Config`] if credentials are missing, [`Error::InvalidState`]
    /// for a missing or undecodable state.
    pub fn authorization_url(&self, state: Option<&str>) -> Result<Url> {
        let creds = self.credentials()?;
        let request = AuthorizationRequest::new(decode_state(state.unwrap_or_default())?);

        let mut url = self.authorize_url.clone();
        url.query_pairs_mut()
            .append_pair("client_id", &creds.client_id)
            .append_pair("redirect_uri", &creds.callback_uri(&self.callback_path))
            .append_pair("response_type", "code")
            .append_pair("state", &request.state)
            .append_pair("scope", &request.mode.scope_param())
            .append_pair("force_verify", "true");

        debug!(mode = %request.mode, "Redirecting to provider consent screen");
        Ok(url)
    }

    /// Exchange a refresh token
    ///
    /// # Errors
    ///
    /// [`Error::BannedToken`] if the token is denylisted (checked before
    /// anything else), [`Error::Config`] if credentials are missing,
    /// [`Error::Transport`] if the provider cannot be reached.
    pub async fn refresh(&self, refresh_token: &str) -> Result<UpstreamResponse> {
        if self.denylist.contains(refresh_token) {
            warn!(token = %refresh_token, "Denylisted refresh token used");
            return Err(Error::BannedToken);
        }

        self.exchange(Grant::RefreshToken(refresh_token)).await
    }

    /// Perform a token exchange and return the provider response as-is
    ///
    /// # Errors
    ///
    /// [`Error::Config`] if credentials are missing, [`Error::Transport`] if
    /// the provider cannot be reached or the body cannot be read.
    pub async fn exchange(&self, grant: Grant<'_>) -> Result<UpstreamResponse> {
        let request = self.token_request(self.credentials()?, grant);

        let response = self.transport.send(request).await.inspect_err(|e| {
            error!(grant = %grant, error = %e, "Token exchange transport failure");
        })?;

        if response.status == StatusCode::BAD_REQUEST {
            match grant {
                Grant::AuthorizationCode(_) => warn!(
                    grant = %grant,
                    status = %response.status,
                    body = %response.body_text(),
                    "Identity provider rejected token request"
                ),
                Grant::RefreshToken(token) => warn!(
                    grant = %grant,
                    status = %response.status,
                    token = %token,
                    body = %response.body_text(),
                    "Identity provider rejected token request"
                ),
            }
        } else {
            debug!(grant = %grant, status = %response.status, "Token exchange completed");
        }

        Ok(response)
    }

    fn token_request(&self, creds: &ProviderCredentials, grant: Grant<'_>) -> TokenRequest {
        let mut params = vec![
            ("client_id", creds.client_id.clone()),
            ("client_secret", creds.client_secret.clone()),
        ];

        let encoding = match grant {
            Grant::AuthorizationCode(code) => {
                params.push(("redirect_uri", creds.callback_uri(&self.callback_path)));
                params.push(("grant_type", grant.grant_type().to_string()));
                params.push(("code", code.to_string()));
                ParamEncoding::FormBody
            }
            Grant::RefreshToken(token) => {
                params.push(("refresh_token", token.to_string()));
                params.push(("grant_type", grant.grant_type().to_string()));
                ParamEncoding::QueryString
            }
        };

        TokenRequest {
            url: self.token_url.clone(),
            encoding,
            params,
        }
    }
}

impl fmt::Debug for OAuthRelay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuthRelay")
            .field("configured", &self.is_configured())
            .field("authorize_url", &self.authorize_url.as_str())
            .field("token_url", &self.token_url)
            .field("denylist", &self.denylist)
            .finish_non_exhaustive()
    }
}

/// Percent-decode a `state` value with form semantics (`+` is a space)
///
/// The value has already been through query parsing once; this second pass
/// matches what existing clients send. A `%` not followed by two hex digits,
/// invalid UTF-8, or an empty result is rejected.
///
/// # Errors
///
/// Returns [`Error::InvalidState`].
pub fn decode_state(raw: &str) -> Result<String> {
    if raw.is_empty() {
        return Err(Error::InvalidState("state is missing".to_string()));
    }

    let malformed_escape = raw.match_indices('%').any(|(i, _)| {
        raw.get(i + 1..i + 3)
            .is_none_or(|hex| !hex.bytes().all(|b| b.is_ascii_hexdigit()))
    });
    if malformed_escape {
        return Err(Error::InvalidState("malformed percent escape".to_string()));
    }

    let decoded = urlencoding::decode(&raw.replace('+', " "))
        .map_err(|e| Error::InvalidState(format!("state is not UTF-8: {e}")))?
        .into_owned();

    if decoded.is_empty() {
        return Err(Error::InvalidState("state is empty".to_string()));
    }
    Ok(decoded)
}
