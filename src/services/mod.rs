pub mod dataset_service;
pub mod record_bulk_service;
pub mod response_service;
pub mod search_service;

pub use dataset_service::DatasetService;
pub use record_bulk_service::{RecordsBulkResult, RecordsBulkService};
pub use response_service::ResponseService;
pub use search_service::{SearchResultItem, SearchService};
