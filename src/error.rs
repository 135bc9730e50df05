//! Error types for the OAuth relay

use std::io;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Result type alias for the OAuth relay
pub type Result<T> = std::result::Result<T, Error>;

/// OAuth relay errors
///
/// Each variant that can surface on a request maps to a fixed status code and
/// plain-text body (see [`Error::status_code`] and [`Error::public_message`]).
/// The `Display` text is for logs and may carry more detail than the body.
#[derive(Error, Debug)]
pub enum Error {
    /// Provider credentials or other configuration are missing or invalid
    #[error("Configuration error: {0}")]
    Config(String),

    /// `state` query parameter missing, empty or not percent-decodable
    #[error("Invalid state parameter: {0}")]
    InvalidState(String),

    /// Refresh token is on the denylist
    #[error("Refresh token is denylisted")]
    BannedToken,

    /// Network or body-read failure talking to the identity provider
    #[error("Transport error: {0}")]
    Transport(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// HTTP status returned to the inbound caller
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidState(_) => StatusCode::BAD_REQUEST,
            Self::BannedToken => StatusCode::FORBIDDEN,
            Self::Transport(_) => StatusCode::BAD_GATEWAY,
            Self::Config(_) | Self::Io(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Fixed response body. Never includes credentials or upstream detail.
    #[must_use]
    pub fn public_message(&self) -> &'static str {
        match self {
            Self::Config(_) => "Twitch service was not properly configured.",
            Self::InvalidState(_) => "State value couldn't be decoded or is missing.",
            Self::BannedToken => "Banned refresh token used.",
            Self::Transport(_) => "Failed to reach identity provider.",
            Self::Io(_) | Self::Internal(_) => "Internal server error.",
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        (self.status_code(), self.public_message()).into_response()
    }
}
