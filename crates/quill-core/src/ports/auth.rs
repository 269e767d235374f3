//! Identity provider port.

use crate::domain::Session;

/// Verifies session tokens issued by the identity provider.
pub trait SessionVerifier: Send + Sync {
    /// Issue a token carrying this session.
    fn issue(&self, session: &Session) -> Result<String, AuthError>;

    /// Validate and decode a token.
    fn verify(&self, token: &str) -> Result<Session, AuthError>;

    /// Lifetime of issued tokens.
    fn expiration_seconds(&self) -> i64;
}

/// Authentication errors.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Session expired")]
    SessionExpired,

    #[error("Invalid session token: {0}")]
    InvalidToken(String),

    #[error("Missing authorization header")]
    MissingAuth,

    #[error("Token signing failed: {0}")]
    Signing(String),
}
