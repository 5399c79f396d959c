//! Unified error type for the attendance service.
//!
//! Every layer (store, manager, HTTP handlers, binaries) returns [`AppError`] so that domain
//! failures reach the caller as distinct, non-fatal outcomes.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Error, Debug)]
pub enum AppError {
    // ---------------------------
    // Caller mistakes
    // ---------------------------
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("Invalid session: {0}")]
    InvalidSession(String),

    #[error("Invalid student: {0}")]
    InvalidStudent(String),

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    /// The store rejected a write on a unique key. Callers may retry.
    #[error("Conflict: {0}")]
    Conflict(String),

    // ---------------------------
    // Infrastructure
    // ---------------------------
    #[error("Database error: {0}")]
    Db(#[from] diesel::result::Error),

    #[error("Database connection error: {0}")]
    Connection(#[from] diesel::ConnectionError),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// Short machine-readable name used in response bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "validation",
            AppError::NotFound(_) => "not_found",
            AppError::InvalidSession(_) => "invalid_session",
            AppError::InvalidStudent(_) => "invalid_student",
            AppError::AccessDenied(_) => "access_denied",
            AppError::Unauthenticated(_) => "unauthenticated",
            AppError::Conflict(_) => "conflict",
            AppError::Db(_)
            | AppError::Connection(_)
            | AppError::Config(_)
            | AppError::Csv(_)
            | AppError::Io(_)
            | AppError::Internal(_) => "internal",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::InvalidSession(_) | AppError::InvalidStudent(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::AccessDenied(_) => StatusCode::FORBIDDEN,
            AppError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!("Request failed: {self}");
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        let body = json!({ "error": self.kind(), "message": message });

        (status, Json(body)).into_response()
    }
}
