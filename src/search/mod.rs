//! Search over ingested records.
//!
//! The query model is a structured object (free text + boolean filter tree
//! + sort clauses) whose scopes reference the dataset schema by name. The
//! [`SearchQueryValidator`] checks those references against the live schema
//! before anything reaches the engine; the [`SearchEngine`] trait is the
//! narrow seam a concrete Elasticsearch/OpenSearch client plugs into, with
//! [`InMemorySearchEngine`] backing tests and local runs.

pub mod engine;
pub mod in_memory;
pub mod query;
pub mod validator;

pub use engine::{HydratedRecord, HydratedSuggestion, SearchEngine, SearchHit, SearchResponses};
pub use in_memory::InMemorySearchEngine;
pub use query::{
    Filter, RecordProperty, ResponseProperty, Scope, SearchQuery, SortClause, SortOrder,
    SuggestionProperty, TextQuery,
};
pub use validator::SearchQueryValidator;
