//! Pure validation functions.
//!
//! Every validator takes a candidate payload plus the dataset's
//! [`DatasetSchema`](crate::schema::DatasetSchema) and returns `Ok(())` or a
//! descriptive violation. The batch validators in [`record`] aggregate
//! violations per item, tagged with the item's 0-based batch position, and
//! never stop at the first failing item.

pub mod record;
pub mod response;
pub mod suggestion;
pub mod vector;

pub use record::{
    validate_create_batch, validate_upsert_batch, CreateContext, ItemResolution, RecordCreate,
    RecordUpsert, UpsertContext, UpsertPlan,
};
pub use response::{validate_response, ResponseCreate, ResponseValue};
pub use suggestion::{validate_suggestion, SuggestionCreate};
pub use vector::validate_vector;
