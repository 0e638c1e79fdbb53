#![allow(dead_code)]

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

/// Failure modes of the section merge/update engine.
///
/// Every variant maps onto an `AppError` (and therefore an HTTP status) via
/// the `From` impl below, so handlers can bubble engine failures with `?`.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum EditError {
    #[error("Unknown section '{0}'")]
    UnknownSection(String),

    #[error("Item {item_id} not found in section '{section}'")]
    ItemNotFound { section: String, item_id: Uuid },

    #[error("Section key '{0}' already exists")]
    DuplicateKey(String),

    #[error("Section '{0}' is not deletable")]
    NotDeletable(String),

    #[error("'{0}' not found")]
    NotFound(String),

    #[error("Invalid section order: {0}")]
    InvalidOrder(String),

    #[error("{0}")]
    Validation(String),
}

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unprocessable entity: {0}")]
    UnprocessableEntity(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("S3 error: {0}")]
    S3(String),

    #[error("Upstream unavailable: {0}")]
    Upstream(String),

    #[error("Render timed out after {0}s")]
    RenderTimeout(u64),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<EditError> for AppError {
    fn from(err: EditError) -> Self {
        match err {
            EditError::ItemNotFound { .. } | EditError::NotFound(_) => {
                AppError::NotFound(err.to_string())
            }
            EditError::DuplicateKey(_) => AppError::Conflict(err.to_string()),
            EditError::UnknownSection(_) | EditError::NotDeletable(_) => {
                AppError::UnprocessableEntity(err.to_string())
            }
            EditError::InvalidOrder(_) | EditError::Validation(_) => {
                AppError::Validation(err.to_string())
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "DUPLICATE_KEY", msg.clone()),
            AppError::UnprocessableEntity(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "UNPROCESSABLE_ENTITY",
                msg.clone(),
            ),
            AppError::Database(e) => {
                tracing::error!("Database error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "A database error occurred".to_string(),
                )
            }
            AppError::S3(msg) => {
                tracing::error!("S3 error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "S3_ERROR",
                    "A storage error occurred".to_string(),
                )
            }
            AppError::Upstream(msg) => {
                tracing::error!("Upstream error: {msg}");
                (
                    StatusCode::BAD_GATEWAY,
                    "UPSTREAM_UNAVAILABLE",
                    "An upstream service is unavailable; retry shortly".to_string(),
                )
            }
            AppError::RenderTimeout(secs) => {
                tracing::error!("Render timed out after {secs}s");
                (
                    StatusCode::GATEWAY_TIMEOUT,
                    "RENDER_TIMEOUT",
                    "Rendering took too long and was aborted".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
