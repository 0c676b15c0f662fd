use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use crate::database::entities::{datasets, records};
use crate::errors::{SearchError, SearchResult};
use crate::schema::DatasetSchema;
use crate::search::{SearchEngine, SearchQuery, SearchQueryValidator};

/// One ranked search result, hydrated from the relational store.
#[derive(Clone, Debug, Serialize)]
pub struct SearchResultItem {
    pub record: records::Model,
    pub score: f64,
}

/// Validates a structured query against the dataset schema, executes it on
/// the engine, then hydrates the ranked ids from the relational store
/// preserving engine order.
pub struct SearchService {
    db: DatabaseConnection,
    engine: Arc<dyn SearchEngine>,
}

impl SearchService {
    pub fn new(db: DatabaseConnection, engine: Arc<dyn SearchEngine>) -> Self {
        Self { db, engine }
    }

    pub async fn search_records(
        &self,
        dataset: &datasets::Model,
        query: &SearchQuery,
        offset: u64,
        limit: u64,
    ) -> SearchResult<(Vec<SearchResultItem>, u64)> {
        let schema = DatasetSchema::load(&self.db, dataset.id).await?;
        SearchQueryValidator::validate(&schema, query)?;

        let result = self
            .engine
            .search(dataset, query, offset, limit)
            .await
            .map_err(|err| SearchError::Engine(err.to_string()))?;

        debug!(
            "Search on dataset {} matched {} records ({} returned)",
            dataset.id,
            result.total,
            result.hits.len()
        );

        if result.hits.is_empty() {
            return Ok((Vec::new(), result.total));
        }

        let ids: Vec<i32> = result.hits.iter().map(|hit| hit.record_id).collect();
        let found = records::Entity::find()
            .filter(records::Column::Id.is_in(ids))
            .all(&self.db)
            .await?;
        let mut by_id: HashMap<i32, records::Model> =
            found.into_iter().map(|record| (record.id, record)).collect();

        // Preserve the engine's ranking; drop ids the store no longer has.
        let items = result
            .hits
            .iter()
            .filter_map(|hit| {
                by_id.remove(&hit.record_id).map(|record| SearchResultItem {
                    record,
                    score: hit.score,
                })
            })
            .collect();

        Ok((items, result.total))
    }
}
