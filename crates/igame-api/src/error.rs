//! Error types for the gateway and the typed API.

use igame_common::ValidationError;

/// Failures of the gateway itself. Application-level errors are not
/// classified here; callers inspect the returned response.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("invalid HTTP method: {0}")]
    InvalidMethod(String),

    #[error("invalid header {name}: {reason}")]
    InvalidHeader { name: String, reason: String },

    #[error("failed to build HTTP client: {0}")]
    Build(String),

    #[error("invalid base URL {url}: {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("cookie jar: {0}")]
    Cookies(String),

    #[error(transparent)]
    Transport(#[from] reqwest::Error),
}

/// Classified outcome of a failed backend call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// The request never completed.
    #[error("network error: {0}")]
    Network(String),

    /// The backend answered with an `error` field or a failing status.
    #[error("{message} (HTTP {status})")]
    Application { status: u16, message: String },

    /// 401/403 with an invalid-token message; the session must be dropped.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The body was not the JSON shape expected.
    #[error("parse error: {0}")]
    Parse(String),

    /// Rejected client-side before any request was made.
    #[error("{0}")]
    Invalid(String),
}

impl ApiError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized(_))
    }

    /// Text suitable for an inline message. Transport and parse failures
    /// fall back to `fallback` since their details are not user-facing.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            Self::Application { message, .. } => message.clone(),
            Self::Invalid(message) | Self::Unauthorized(message) => message.clone(),
            Self::Network(_) | Self::Parse(_) => fallback.to_string(),
        }
    }
}

impl From<GatewayError> for ApiError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::Transport(e) => Self::Network(e.to_string()),
            other => Self::Invalid(other.to_string()),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        Self::Invalid(err.to_string())
    }
}

/// Whether a backend message denotes a rejected credential.
pub(crate) fn is_invalid_token_message(message: &str) -> bool {
    message.to_ascii_lowercase().contains("invalid token")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_message_prefers_backend_text() {
        let err = ApiError::Application {
            status: 409,
            message: "Game already started".into(),
        };
        assert_eq!(err.user_message("fallback"), "Game already started");
        assert_eq!(err.to_string(), "Game already started (HTTP 409)");
    }

    #[test]
    fn user_message_hides_transport_details() {
        let err = ApiError::Network("dns error: no such host".into());
        assert_eq!(
            err.user_message("Error while starting new game session"),
            "Error while starting new game session"
        );
    }

    #[test]
    fn invalid_token_detection_is_case_insensitive() {
        assert!(is_invalid_token_message("Invalid token"));
        assert!(is_invalid_token_message("Unauthorized: invalid token provided"));
        assert!(!is_invalid_token_message("Token expired"));
    }

    #[test]
    fn validation_error_becomes_invalid() {
        let err: ApiError = ValidationError::TooShort.into();
        assert_eq!(
            err,
            ApiError::Invalid("Input must be at least 3 characters long".into())
        );
    }
}
