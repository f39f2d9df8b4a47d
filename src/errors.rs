use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

/// Core error taxonomy shared by services and handlers.
///
/// Synchronous callers get these back directly; failures inside an async
/// processing run are never re-raised to the caller that triggered the run,
/// they only surface as the folder's terminal `failed` status.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Bad input shape or values
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Referenced id does not exist
    #[error("{0} not found")]
    NotFound(String),

    /// Operation illegal given the current state
    #[error("Precondition failed: {0}")]
    PreconditionFailed(String),

    /// Illegal status transition
    #[error("Invalid state transition: {from} -> {to}")]
    InvalidState { from: String, to: String },

    /// Folder file-count limit reached
    #[error("Folder capacity exceeded: holds {current} of {capacity} files")]
    CapacityExceeded { capacity: usize, current: usize },

    /// Extraction backend error or timeout
    #[error("Extraction backend failure: {0}")]
    Upstream(String),

    /// Object storage failure
    #[error("Object storage error: {0}")]
    Storage(String),

    /// Database operation failed
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),
}

impl CoreError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            CoreError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            CoreError::NotFound(_) => StatusCode::NOT_FOUND,
            CoreError::PreconditionFailed(_)
            | CoreError::InvalidState { .. }
            | CoreError::CapacityExceeded { .. } => StatusCode::CONFLICT,
            CoreError::Upstream(_) => StatusCode::BAD_GATEWAY,
            CoreError::Storage(_) | CoreError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_kind(&self) -> &'static str {
        match self {
            CoreError::Validation(_) => "validation_failed",
            CoreError::NotFound(_) => "not_found",
            CoreError::PreconditionFailed(_) => "precondition_failed",
            CoreError::InvalidState { .. } => "invalid_state",
            CoreError::CapacityExceeded { .. } => "capacity_exceeded",
            CoreError::Upstream(_) => "upstream_failure",
            CoreError::Storage(_) => "storage_error",
            CoreError::Database(_) => "database_error",
        }
    }
}

impl IntoResponse for CoreError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({
            "error": self.error_kind(),
            "message": self.to_string(),
        });
        (self.status_code(), Json(body)).into_response()
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
