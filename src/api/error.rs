//! Backend error mapping
//!
//! Turns HTTP status codes and transport failures into typed errors with
//! user-facing messages, preferring the server's own `message` field.

use serde::Deserialize;
use thiserror::Error;

const GENERIC_SERVER_MESSAGE: &str = "Internal server error. Please try again later.";
const GENERIC_VALIDATION_MESSAGE: &str = "Invalid input data.";
const GENERIC_STATUS_MESSAGE: &str = "Connection error.";

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApiError {
    #[error("Session expired. Please log in again.")]
    Unauthorized,

    #[error("You do not have permission to perform this action.")]
    Forbidden,

    #[error("Resource not found.")]
    NotFound,

    #[error("{0}")]
    Validation(String),

    #[error("{}", .message.as_deref().unwrap_or(GENERIC_SERVER_MESSAGE))]
    Server { status: u16, message: Option<String> },

    #[error("{message}")]
    Status { status: u16, message: String },

    #[error("Connection error. Check your internet connection. ({0})")]
    Network(String),

    #[error("Unexpected response from server: {0}")]
    Decode(String),
}

/// Error bodies the backend sends; only `message` is of interest.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    error: Option<String>,
}

impl ApiError {
    /// Map a non-success status and its raw body to an error.
    pub fn from_status(status: u16, body: &str) -> Self {
        let server_message = serde_json::from_str::<ErrorBody>(body)
            .ok()
            .and_then(|b| b.message.or(b.error))
            .filter(|m| !m.trim().is_empty());

        match status {
            401 => ApiError::Unauthorized,
            403 => ApiError::Forbidden,
            404 => ApiError::NotFound,
            422 => ApiError::Validation(
                server_message.unwrap_or_else(|| GENERIC_VALIDATION_MESSAGE.to_string()),
            ),
            500..=599 => ApiError::Server {
                status,
                message: server_message,
            },
            _ => ApiError::Status {
                status,
                message: server_message.unwrap_or_else(|| GENERIC_STATUS_MESSAGE.to_string()),
            },
        }
    }

    /// Transport failures, 5xx, request timeout (408) and rate limiting (429).
    /// Any other 4xx will fail the same way on a resend.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ApiError::Server { .. }
                | ApiError::Network(_)
                | ApiError::Status { status: 408 | 429, .. }
        )
    }

    /// 409: the backend already holds a record the request would duplicate.
    pub fn is_conflict(&self) -> bool {
        matches!(self, ApiError::Status { status: 409, .. })
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Unauthorized => "UNAUTHORIZED",
            ApiError::Forbidden => "FORBIDDEN",
            ApiError::NotFound => "NOT_FOUND",
            ApiError::Validation(_) => "VALIDATION_ERROR",
            ApiError::Server { .. } => "SERVER_ERROR",
            ApiError::Status { .. } => "UNKNOWN_ERROR",
            ApiError::Network(_) => "NETWORK_ERROR",
            ApiError::Decode(_) => "DECODE_ERROR",
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else {
            ApiError::Network(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_statuses() {
        assert_eq!(ApiError::from_status(401, ""), ApiError::Unauthorized);
        assert_eq!(ApiError::from_status(403, "{}"), ApiError::Forbidden);
        assert_eq!(ApiError::from_status(404, "not json"), ApiError::NotFound);
    }

    #[test]
    fn test_server_message_is_preferred() {
        let err = ApiError::from_status(422, r#"{"message":"Image URL is required"}"#);
        assert_eq!(err.to_string(), "Image URL is required");

        let err = ApiError::from_status(503, r#"{"message":"Evidence service is restarting"}"#);
        assert_eq!(err.to_string(), "Evidence service is restarting");
        assert!(err.is_retryable());
    }

    #[test]
    fn test_generic_fallbacks() {
        assert_eq!(ApiError::from_status(500, "").to_string(), GENERIC_SERVER_MESSAGE);
        assert_eq!(ApiError::from_status(422, "{}").to_string(), GENERIC_VALIDATION_MESSAGE);
        assert_eq!(
            ApiError::from_status(409, r#"{"message":"  "}"#),
            ApiError::Status { status: 409, message: GENERIC_STATUS_MESSAGE.to_string() }
        );
    }

    #[test]
    fn test_only_transient_statuses_are_retryable() {
        assert!(ApiError::from_status(408, "").is_retryable());
        assert!(ApiError::from_status(429, "").is_retryable());
        assert!(ApiError::from_status(502, "").is_retryable());
        assert!(!ApiError::from_status(400, "").is_retryable());
        assert!(!ApiError::from_status(422, "").is_retryable());

        let conflict = ApiError::from_status(409, r#"{"message":"Already submitted today"}"#);
        assert!(!conflict.is_retryable());
        assert!(conflict.is_conflict());
        assert!(!ApiError::from_status(400, "").is_conflict());
    }
}
