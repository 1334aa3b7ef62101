use serde::Deserialize;
use thiserror::Error;

use crate::models::FieldError;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("validation failed with {} field error(s)", .0.len())]
    Validation(Vec<FieldError>),

    #[error("Unauthorized - token may be expired or invalid")]
    Unauthorized,

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

/// Failure body shape shared by every auth endpoint.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    errors: Vec<FieldError>,
}

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            format!(
                "{}... (truncated, {} total bytes)",
                &body[..MAX_ERROR_BODY_LENGTH],
                body.len()
            )
        }
    }

    /// Classify a non-2xx response.
    ///
    /// A structured `errors` list is a validation failure no matter the
    /// status code. Anything else collapses by status; field errors are
    /// never invented when the server gives none.
    pub fn from_response(status: reqwest::StatusCode, body: &str) -> Self {
        if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) {
            if !parsed.errors.is_empty() {
                return ApiError::Validation(parsed.errors);
            }
        }

        let truncated = Self::truncate_body(body);
        match status.as_u16() {
            401 => ApiError::Unauthorized,
            500..=599 => ApiError::ServerError(truncated),
            _ => ApiError::InvalidResponse(format!("Status {}: {}", status, truncated)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_structured_errors_become_validation() {
        let body = r#"{"errors":[{"msg":"Invalid credentials"}]}"#;
        let err = ApiError::from_response(StatusCode::BAD_REQUEST, body);
        match err {
            ApiError::Validation(fields) => {
                assert_eq!(fields.len(), 1);
                assert_eq!(fields[0].msg, "Invalid credentials");
            }
            other => panic!("Expected Validation, got {:?}", other),
        }
    }

    #[test]
    fn test_errors_list_preserves_server_order() {
        let body = r#"{"errors":[{"msg":"Name is required"},{"msg":"Password too short"}]}"#;
        let err = ApiError::from_response(StatusCode::UNPROCESSABLE_ENTITY, body);
        match err {
            ApiError::Validation(fields) => {
                assert_eq!(fields[0].msg, "Name is required");
                assert_eq!(fields[1].msg, "Password too short");
            }
            other => panic!("Expected Validation, got {:?}", other),
        }
    }

    #[test]
    fn test_401_without_errors_is_unauthorized() {
        let err = ApiError::from_response(StatusCode::UNAUTHORIZED, "No token, access denied");
        assert!(matches!(err, ApiError::Unauthorized));
    }

    #[test]
    fn test_missing_errors_field_is_not_validation() {
        // Malformed or unexpected bodies must not be dressed up as field errors
        let err = ApiError::from_response(StatusCode::BAD_REQUEST, r#"{"message":"nope"}"#);
        assert!(matches!(err, ApiError::InvalidResponse(_)));

        let err = ApiError::from_response(StatusCode::BAD_REQUEST, r#"{"errors":[]}"#);
        assert!(matches!(err, ApiError::InvalidResponse(_)));
    }

    #[test]
    fn test_5xx_is_server_error() {
        let err = ApiError::from_response(StatusCode::BAD_GATEWAY, "upstream down");
        assert!(matches!(err, ApiError::ServerError(_)));
    }

    #[test]
    fn test_long_bodies_are_truncated() {
        let body = "x".repeat(2000);
        let err = ApiError::from_response(StatusCode::INTERNAL_SERVER_ERROR, &body);
        match err {
            ApiError::ServerError(msg) => assert!(msg.contains("truncated, 2000 total bytes")),
            other => panic!("Expected ServerError, got {:?}", other),
        }
    }
}
