//! Domain-specific error types.
//!
//! Structured error enums per domain, so handlers can map failures to
//! status codes without string matching:
//!
//! - **DatasetError**: dataset lifecycle and schema registry mutations
//! - **RecordError**: bulk ingestion, upserts, responses, deletes
//! - **SearchError**: query validation and engine execution

pub mod dataset;
pub mod record;
pub mod search;

pub use dataset::DatasetError;
pub use record::{BulkItemError, RecordError};
pub use search::{QueryContext, SearchError};

/// Result type alias for dataset operations
pub type DatasetResult<T> = Result<T, DatasetError>;

/// Result type alias for record operations
pub type RecordResult<T> = Result<T, RecordError>;

/// Result type alias for search operations
pub type SearchResult<T> = Result<T, SearchError>;
