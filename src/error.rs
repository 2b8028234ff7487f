//! Structured error types for API responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::Serialize;
use std::fmt;

use crate::types::ApiResponse;

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Validation errors (400)
    ValidationFailed,
    EmptyUpdate,
    InvalidParent,
    HierarchyCycle,

    // Not found errors (404)
    TaskNotFound,

    // Upstream / internal errors (500)
    GeneratorFailed,
    DatabaseError,
    InternalError,
}

impl ErrorCode {
    /// HTTP status this code maps to at the request boundary.
    pub fn status(self) -> StatusCode {
        match self {
            ErrorCode::ValidationFailed
            | ErrorCode::EmptyUpdate
            | ErrorCode::InvalidParent
            | ErrorCode::HierarchyCycle => StatusCode::BAD_REQUEST,
            ErrorCode::TaskNotFound => StatusCode::NOT_FOUND,
            ErrorCode::GeneratorFailed | ErrorCode::DatabaseError | ErrorCode::InternalError => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// Structured error surfaced through the JSON envelope.
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    // Convenience constructors

    /// Aggregate a list of validation messages into one error.
    pub fn validation(errors: Vec<String>) -> Self {
        Self::new(ErrorCode::ValidationFailed, errors.join("; "))
    }

    pub fn invalid_value(reason: impl Into<String>) -> Self {
        Self::new(ErrorCode::ValidationFailed, reason)
    }

    pub fn empty_update() -> Self {
        Self::new(
            ErrorCode::EmptyUpdate,
            "update payload contains no recognized fields",
        )
    }

    pub fn invalid_parent(parent_id: i64) -> Self {
        Self::new(
            ErrorCode::InvalidParent,
            format!("Parent task not found: {}", parent_id),
        )
    }

    pub fn self_parent(task_id: i64) -> Self {
        Self::new(
            ErrorCode::HierarchyCycle,
            format!("Task {} cannot be its own parent", task_id),
        )
    }

    pub fn cycle(task_id: i64, parent_id: i64) -> Self {
        Self::new(
            ErrorCode::HierarchyCycle,
            format!(
                "Setting parent of task {} to {} would create a cycle",
                task_id, parent_id
            ),
        )
    }

    pub fn task_not_found(task_id: i64) -> Self {
        Self::new(
            ErrorCode::TaskNotFound,
            format!("Task not found: {}", task_id),
        )
    }

    pub fn generator(err: impl fmt::Display) -> Self {
        Self::new(
            ErrorCode::GeneratorFailed,
            format!("Text generator failed: {}", err),
        )
    }

    pub fn database(err: impl fmt::Display) -> Self {
        Self::new(ErrorCode::DatabaseError, err.to_string())
    }

    pub fn internal(err: impl fmt::Display) -> Self {
        Self::new(ErrorCode::InternalError, err.to_string())
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ApiError {}

// Allow using ? with anyhow errors by converting them
impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<ApiError>() {
            Ok(api_err) => api_err,
            Err(err) => ApiError::database(err),
        }
    }
}

impl From<rusqlite::Error> for ApiError {
    fn from(err: rusqlite::Error) -> Self {
        ApiError::database(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.code.status();
        if status.is_server_error() {
            tracing::error!(code = ?self.code, "{}", self.message);
        }
        (status, Json(ApiResponse::<()>::err(self.message))).into_response()
    }
}

/// Result type for API operations.
pub type ApiResult<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_aggregates_messages() {
        let err = ApiError::validation(vec!["a".to_string(), "b".to_string()]);
        assert_eq!(err.message, "a; b");
        assert_eq!(err.code.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn status_mapping() {
        assert_eq!(
            ApiError::task_not_found(9).code.status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::generator("boom").code.status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError::self_parent(1).code.status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn empty_update_carries_its_own_code() {
        let err = ApiError::empty_update();
        assert_eq!(err.code, ErrorCode::EmptyUpdate);
        assert_eq!(err.code.status(), StatusCode::BAD_REQUEST);
        assert!(err.message.contains("no recognized fields"));
    }

    #[test]
    fn rusqlite_errors_map_to_the_database_code() {
        let err: ApiError = rusqlite::Error::QueryReturnedNoRows.into();
        assert_eq!(err.code, ErrorCode::DatabaseError);
    }

    #[test]
    fn anyhow_downcast_preserves_api_errors() {
        let inner = ApiError::task_not_found(3);
        let err: anyhow::Error = inner.into();
        let back: ApiError = err.into();
        assert_eq!(back.code, ErrorCode::TaskNotFound);
    }
}
