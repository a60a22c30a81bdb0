//! Engine error to HTTP status translation.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::error;

use ledgergate_core::KeyParseError;
use ledgergate_cursor::CursorError;

/// A request-terminal error with its client-facing shape.
#[derive(Debug)]
pub enum ApiError {
    /// Malformed key or unknown enum value: 409.
    InvalidArgument(String),
    /// No document behind the supplied anchor: 404.
    NotFound,
    /// Store fault: 500, message redacted.
    Internal(String),
}

impl From<CursorError> for ApiError {
    fn from(err: CursorError) -> Self {
        match err {
            CursorError::InvalidFormat(message) => ApiError::InvalidArgument(message),
            CursorError::NotFound => ApiError::NotFound,
            CursorError::Store(err) => ApiError::Internal(err.to_string()),
        }
    }
}

impl From<KeyParseError> for ApiError {
    fn from(err: KeyParseError) -> Self {
        ApiError::InvalidArgument(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            ApiError::InvalidArgument(message) => {
                (StatusCode::CONFLICT, "InvalidArgument", message)
            }
            ApiError::NotFound => (
                StatusCode::NOT_FOUND,
                "ResourceNotFound",
                "no resource exists with the supplied identifier".to_string(),
            ),
            ApiError::Internal(detail) => {
                // full detail stays in the log, not in the response
                error!(%detail, "store error while serving request");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal",
                    "internal server error".to_string(),
                )
            }
        };
        let body = Json(json!({ "code": code, "message": message }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledgergate_store::StoreError;

    #[test]
    fn cursor_errors_map_to_statuses() {
        let invalid: ApiError = CursorError::InvalidFormat("bad key".into()).into();
        assert!(matches!(invalid, ApiError::InvalidArgument(_)));

        let missing: ApiError = CursorError::NotFound.into();
        assert!(matches!(missing, ApiError::NotFound));

        let store: ApiError = CursorError::Store(StoreError::Malformed("x")).into();
        assert!(matches!(store, ApiError::Internal(_)));
    }

    #[test]
    fn responses_carry_the_expected_codes() {
        let response = ApiError::NotFound.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = ApiError::InvalidArgument("nope".into()).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let response = ApiError::Internal("secret".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
