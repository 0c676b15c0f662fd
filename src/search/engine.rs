use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;

use crate::database::entities::{datasets, records, responses, suggestions, vectors};

use super::query::SearchQuery;

/// A suggestion joined with its question's name. Index documents are keyed
/// by question name, which is what search scopes reference.
#[derive(Clone, Debug, Serialize)]
pub struct HydratedSuggestion {
    #[serde(flatten)]
    pub model: suggestions::Model,
    pub question_name: String,
}

/// A record with its relationships eagerly loaded, ready for indexing.
/// Built by the bulk engine with one query per child type.
#[derive(Clone, Debug, Serialize)]
pub struct HydratedRecord {
    #[serde(flatten)]
    pub record: records::Model,
    pub responses: Vec<responses::Model>,
    pub suggestions: Vec<HydratedSuggestion>,
    pub vectors: Vec<vectors::Model>,
}

#[derive(Clone, Debug, Serialize)]
pub struct SearchHit {
    pub record_id: i32,
    pub score: f64,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct SearchResponses {
    pub hits: Vec<SearchHit>,
    pub total: u64,
}

/// The narrow contract the ingestion and search services depend on.
///
/// A production deployment implements this against Elasticsearch or
/// OpenSearch; [`super::InMemorySearchEngine`] covers tests and local runs.
/// Indexing calls happen after the relational transaction has committed:
/// implementations must be overwrite-safe for repeated record ids, and
/// callers treat indexing failures as log-and-continue, never as a reason
/// to undo the committed write.
#[async_trait]
pub trait SearchEngine: Send + Sync {
    /// Startup health probe.
    async fn ping(&self) -> bool;

    /// Index (or re-index) fully hydrated records.
    async fn index_records(
        &self,
        dataset: &datasets::Model,
        records: &[HydratedRecord],
    ) -> Result<()>;

    /// Incrementally re-index a single response, including the record's
    /// derived status.
    async fn update_record_response(
        &self,
        record: &records::Model,
        response: &responses::Model,
    ) -> Result<()>;

    /// Drop records from the index.
    async fn delete_records(&self, dataset: &datasets::Model, record_ids: &[i32]) -> Result<()>;

    /// Execute a validated query, returning ranked record ids with scores
    /// plus the total match count.
    async fn search(
        &self,
        dataset: &datasets::Model,
        query: &SearchQuery,
        offset: u64,
        limit: u64,
    ) -> Result<SearchResponses>;
}
