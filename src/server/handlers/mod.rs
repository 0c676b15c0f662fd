pub mod datasets;
pub mod health;
pub mod records;
pub mod responses;
pub mod users;
pub mod workspaces;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::errors::{BulkItemError, DatasetError, RecordError, SearchError};

/// Uniform error body: `{"detail": "...", "errors": [...]}` with the
/// per-item breakdown attached for bulk validation failures.
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub errors: Option<Vec<BulkItemError>>,
}

impl ApiError {
    fn new(status_code: u16, message: String) -> Self {
        Self {
            status: StatusCode::from_u16(status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            message,
            errors: None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!("Request failed: {}", self.message);
        }
        let body = match &self.errors {
            Some(errors) => json!({"detail": self.message, "errors": errors}),
            None => json!({"detail": self.message}),
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<DatasetError> for ApiError {
    fn from(err: DatasetError) -> Self {
        ApiError::new(err.http_status_code(), err.to_string())
    }
}

impl From<RecordError> for ApiError {
    fn from(err: RecordError) -> Self {
        let status_code = err.http_status_code();
        let message = err.to_string();
        let errors = match err {
            RecordError::Unprocessable(items) => Some(items),
            _ => None,
        };
        Self {
            status: StatusCode::from_u16(status_code)
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            message,
            errors,
        }
    }
}

impl From<SearchError> for ApiError {
    fn from(err: SearchError) -> Self {
        ApiError::new(err.http_status_code(), err.to_string())
    }
}

impl From<sea_orm::DbErr> for ApiError {
    fn from(err: sea_orm::DbErr) -> Self {
        let kind = crate::common::db_errors::DbErrorKind::from_db_err(&err);
        ApiError::new(kind.http_status_code(), err.to_string())
    }
}
