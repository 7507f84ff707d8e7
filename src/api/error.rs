//! API Error Types
//!
//! Defines error types for the API layer and implements conversion
//! to HTTP responses with appropriate status codes.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::api::dto::EXAMPLE_REQUEST;
use crate::series::SeriesError;

/// API error types
#[derive(Error, Debug)]
pub enum ApiError {
    /// Request validation failed
    #[error("Validation error: {0}")]
    Validation(String),

    /// Series could not be built
    #[error(transparent)]
    Series(#[from] SeriesError),

    /// Store layer error outside of aggregation
    #[error("Store error: {0}")]
    Store(#[from] crate::storage::StoreError),

    /// Aggregation did not finish within the request timeout
    #[error("Request timed out after {0} ms")]
    Timeout(u64),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ApiError {
    /// Whether the caller sent a bad request
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ApiError::Validation(_)
                | ApiError::Series(SeriesError::InvalidGranularity(_))
                | ApiError::Series(SeriesError::InvalidRange { .. })
        )
    }

    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            ApiError::Series(SeriesError::InvalidGranularity(_)) => {
                (StatusCode::BAD_REQUEST, "INVALID_GRANULARITY")
            }
            ApiError::Series(SeriesError::InvalidRange { .. }) => {
                (StatusCode::BAD_REQUEST, "INVALID_RANGE")
            }
            ApiError::Series(SeriesError::StoreUnavailable(_)) | ApiError::Store(_) => {
                (StatusCode::SERVICE_UNAVAILABLE, "STORE_UNAVAILABLE")
            }
            ApiError::Timeout(_) => (StatusCode::GATEWAY_TIMEOUT, "TIMEOUT"),
            ApiError::Series(SeriesError::Task(_)) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
            }
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            ApiError::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, "IO_ERROR"),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

/// Error response body
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
    pub request_id: String,
}

/// Error details
#[derive(Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
    /// Well-formed request, included for client errors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        let request_id = uuid::Uuid::new_v4().to_string();

        if status.is_server_error() {
            tracing::error!(
                request_id = %request_id,
                error_code = %code,
                error_message = %self,
                "API error occurred"
            );
        } else {
            tracing::debug!(
                request_id = %request_id,
                error_code = %code,
                error_message = %self,
                "Rejected request"
            );
        }

        let body = ErrorResponse {
            error: ErrorBody {
                code: code.to_string(),
                message: self.to_string(),
                example: self
                    .is_client_error()
                    .then(|| EXAMPLE_REQUEST.to_string()),
            },
            request_id,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type for API operations
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::StoreError;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (ApiError::Validation("bad".into()), StatusCode::BAD_REQUEST),
            (
                SeriesError::InvalidGranularity("week".into()).into(),
                StatusCode::BAD_REQUEST,
            ),
            (
                SeriesError::StoreUnavailable(StoreError::Lock("x".into())).into(),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (ApiError::Timeout(10), StatusCode::GATEWAY_TIMEOUT),
            (ApiError::Internal("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (
                SeriesError::Task("cancelled".into()).into(),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }

    #[test]
    fn test_client_errors() {
        assert!(ApiError::Validation("bad".into()).is_client_error());
        assert!(ApiError::from(SeriesError::InvalidGranularity("week".into())).is_client_error());
        assert!(!ApiError::Timeout(1).is_client_error());
        assert!(!ApiError::Store(StoreError::Lock("x".into())).is_client_error());
    }
}
