//! Route-facing error types.
//!
//! Mandatory-path failures (authentication, validation, persistence) map
//! onto [`ApiError`] and end the request. Best-effort provisioning
//! failures never appear here; they are reported inline in the success
//! body by `routes::intake`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Authentication required: {0}")]
    Unauthenticated(String),

    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("{message}")]
    Internal { message: String, expose: bool },
}

impl ApiError {
    /// Internal failure; `expose` controls whether the caller sees the
    /// underlying message (development) or a generic one (everywhere else).
    pub fn internal(message: impl Into<String>, expose: bool) -> Self {
        ApiError::Internal {
            message: message.into(),
            expose,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Unauthenticated(message) => error_body(
                StatusCode::UNAUTHORIZED,
                "unauthenticated",
                &message,
            ),
            ApiError::Validation(message) => {
                error_body(StatusCode::BAD_REQUEST, "validation", &message)
            }
            ApiError::NotFound(path) => (
                StatusCode::NOT_FOUND,
                Json(json!({ "error": "Not found", "path": path })),
            )
                .into_response(),
            ApiError::Internal { message, expose } => {
                let shown = if expose {
                    message.as_str()
                } else {
                    "Internal server error"
                };
                error_body(StatusCode::INTERNAL_SERVER_ERROR, "internal", shown)
            }
        }
    }
}

fn error_body(status: StatusCode, error_type: &str, message: &str) -> Response {
    (
        status,
        Json(json!({
            "error": {
                "type": error_type,
                "message": message
            }
        })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unauthenticated_maps_to_401() {
        let response = ApiError::Unauthenticated("sign in".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_validation_maps_to_400() {
        let response = ApiError::Validation("email required".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_not_found_maps_to_404() {
        let response = ApiError::NotFound("/nope".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_internal_maps_to_500() {
        let response = ApiError::internal("db down", false).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_internal_display_keeps_message() {
        let err = ApiError::internal("connection refused", false);
        assert_eq!(err.to_string(), "connection refused");
    }
}
