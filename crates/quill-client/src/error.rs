use quill_core::{DomainError, RepoError};
use quill_shared::ErrorResponse;

/// Failures talking to the API.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Invalid base URL: {0}")]
    BaseUrl(String),

    #[error("HTTP transport failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server answered with a non-2xx status.
    #[error("{status} {}", .body.message)]
    Api { status: u16, body: ErrorResponse },
}

impl ClientError {
    pub(crate) fn from_status(status: u16, body: Option<ErrorResponse>) -> Self {
        let body = body.unwrap_or_else(|| {
            ErrorResponse::new(status, "Unexpected response", format!("HTTP status {status}"))
        });
        Self::Api { status, body }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            Self::BaseUrl(_) => None,
        }
    }
}

/// Server answers map back onto the domain errors they were rendered from.
/// Transport failures and 5xx answers count as transient connection errors.
impl From<ClientError> for DomainError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Api { status, body } => match status {
                400 => DomainError::Validation(body.message),
                401 => DomainError::Unauthorized,
                403 => DomainError::Forbidden(body.message),
                404 => DomainError::NotFound {
                    entity_type: "post",
                    key: body.message,
                },
                409 => RepoError::Constraint(body.message).into(),
                500.. => RepoError::Connection(format!("server error {status}")).into(),
                _ => RepoError::Query(format!("{status}: {}", body.message)).into(),
            },
            ClientError::Transport(e) => RepoError::Connection(e.to_string()).into(),
            ClientError::BaseUrl(url) => {
                DomainError::Validation(format!("Invalid base URL: {url}"))
            }
        }
    }
}
