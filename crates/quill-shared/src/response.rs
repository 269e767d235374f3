//! Error body returned by every non-2xx response.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// The HTTP status code.
    pub status: u16,

    /// Reason phrase of the status.
    pub title: String,

    /// What went wrong, safe to show to the user.
    pub message: String,

    /// Request ID for debugging purposes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

impl ErrorResponse {
    pub fn new(status: u16, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status,
            title: title.into(),
            message: message.into(),
            request_id: None,
        }
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    // Common error constructors
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(400, "Bad Request", message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(401, "Unauthorized", message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(403, "Forbidden", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(404, "Not Found", message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(409, "Conflict", message)
    }

    pub fn internal_error() -> Self {
        Self::new(500, "Internal Server Error", "Something went wrong")
    }

    /// Body for a method a known resource does not accept.
    pub fn method_not_supported(method: &str) -> Self {
        Self::bad_request(format!("HTTP method {method} is not supported."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_id_omitted_when_absent() {
        let json = serde_json::to_value(ErrorResponse::not_found("Post missing")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "status": 404, "title": "Not Found", "message": "Post missing" })
        );

        let tagged = ErrorResponse::internal_error().with_request_id("req-1");
        let json = serde_json::to_value(tagged).unwrap();
        assert_eq!(json["request_id"], "req-1");
    }

    #[test]
    fn test_method_not_supported_message() {
        let body = ErrorResponse::method_not_supported("PUT");
        assert_eq!(body.status, 400);
        assert_eq!(body.message, "HTTP method PUT is not supported.");
    }
}
