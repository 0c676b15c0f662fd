//! Record ingestion error types.
//!
//! Bulk validation failures are aggregated: every failing batch item is
//! reported with its 0-based position so callers can map errors back to
//! input rows; validation never stops at the first bad item.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// One failing item in a bulk request, tagged with its position in the batch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BulkItemError {
    pub position: usize,
    pub message: String,
}

impl fmt::Display for BulkItemError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

fn join_item_errors(errors: &[BulkItemError]) -> String {
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Record operation errors
#[derive(Error, Debug)]
pub enum RecordError {
    /// Record not found by ID
    #[error("Record {0} not found")]
    NotFound(i32),

    /// User referenced by a response does not exist
    #[error("User {0} not found")]
    UserNotFound(i32),

    /// Records can only be ingested into published datasets
    #[error("Dataset {0} is not published yet; records cannot be created or updated")]
    DatasetNotReady(i32),

    /// Empty batches are rejected before any processing
    #[error("Batch contains no records")]
    EmptyBatch,

    /// Batch size ceiling, enforced before any processing
    #[error("Batch contains {given} records; the maximum allowed is {max}")]
    TooManyItems { given: usize, max: usize },

    /// Delete id-count ceiling
    #[error("Cannot delete {given} records at once; the maximum allowed is {max}")]
    TooManyIds { given: usize, max: usize },

    /// Every batch item failed validation; nothing was written
    #[error("{}", join_item_errors(.0))]
    Unprocessable(Vec<BulkItemError>),

    /// Single-response validation failure
    #[error("Response is not valid: {0}")]
    InvalidResponse(String),

    /// Uniqueness violation surfaced by the store
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Database operation failed
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),
}

impl RecordError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, RecordError::NotFound(_) | RecordError::UserNotFound(_))
    }

    pub fn http_status_code(&self) -> u16 {
        match self {
            RecordError::NotFound(_) | RecordError::UserNotFound(_) => 404,
            RecordError::Conflict(_) => 409,
            RecordError::DatasetNotReady(_)
            | RecordError::EmptyBatch
            | RecordError::TooManyItems { .. }
            | RecordError::TooManyIds { .. }
            | RecordError::Unprocessable(_)
            | RecordError::InvalidResponse(_) => 422,
            RecordError::Database(_) => 500,
        }
    }
}
