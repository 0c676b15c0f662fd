//! The per-dataset schema registry.
//!
//! Question, field and metadata-property settings are stored as tagged JSON
//! and resolved here into closed sum types; [`DatasetSchema`] loads a
//! dataset's live definitions in one pass and is the single source of truth
//! every validator consults. Once a dataset is published the registry is
//! logically frozen (the dataset service rejects structural changes), but
//! reads are always allowed.

pub mod field_settings;
pub mod metadata_settings;
pub mod question_settings;
mod registry;

pub use field_settings::FieldSettings;
pub use metadata_settings::MetadataPropertySettings;
pub use question_settings::{LabelOption, OptionsOrder, QuestionSettings, RatingOption, SpanRange};
pub use registry::{
    DatasetSchema, FieldDef, MetadataPropertyDef, QuestionDef, VectorSettingsDef,
};
