//! Auth errors

use thiserror::Error;

/// Token verification and configuration errors
#[derive(Error, Debug)]
pub enum AuthError {
    /// Token failed verification (malformed, unknown kid, bad signature,
    /// expired, wrong audience). The message states the exact cause.
    #[error("{0}")]
    InvalidToken(String),

    /// JWKS could not be fetched or parsed. Deliberately distinct from
    /// `InvalidToken` so a transport fault is never treated as a bad token.
    #[error("key fetch failed: {0}")]
    KeyFetch(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl AuthError {
    pub(crate) fn invalid_token(reason: impl Into<String>) -> Self {
        Self::InvalidToken(reason.into())
    }

    /// Get HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidToken(_) => 401,
            Self::KeyFetch(_) | Self::Configuration(_) => 500,
        }
    }
}
