//! Bulk create/upsert of records with their nested suggestions, responses
//! and vectors.
//!
//! The pipeline is validate → persist → hydrate → index: every batch item
//! is validated independently against the dataset schema before anything is
//! written, the valid subset is persisted atomically in one transaction,
//! and only after that transaction commits are the hydrated records handed
//! to the search engine. An indexing failure is logged, never propagated;
//! the relational store is the source of truth and the index catches up on
//! the next write.

use chrono::Utc;
use sea_orm::sea_query::OnConflict;
use sea_orm::ActiveValue::Set;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, TransactionTrait,
};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{error, info};

use crate::common::db_errors::DbErrorKind;
use crate::config::AppConfig;
use crate::database::entities::common_types::RecordStatus;
use crate::database::entities::{datasets, records, responses, suggestions, users, vectors};
use crate::errors::{BulkItemError, RecordError, RecordResult};
use crate::schema::DatasetSchema;
use crate::search::{HydratedRecord, HydratedSuggestion, SearchEngine};
use crate::validators::{
    validate_create_batch, validate_upsert_batch, CreateContext, ItemResolution, RecordCreate,
    RecordUpsert, ResponseCreate, SuggestionCreate, UpsertContext,
};

/// Outcome of a bulk call: the hydrated records that were persisted, the
/// subset of ids that were updates rather than inserts, and the per-item
/// validation errors for everything that was rejected.
#[derive(Debug)]
pub struct RecordsBulkResult {
    pub records: Vec<HydratedRecord>,
    pub updated_ids: Vec<i32>,
    pub errors: Vec<BulkItemError>,
}

pub struct RecordsBulkService {
    db: DatabaseConnection,
    engine: Arc<dyn SearchEngine>,
    config: AppConfig,
}

impl RecordsBulkService {
    pub fn new(db: DatabaseConnection, engine: Arc<dyn SearchEngine>, config: AppConfig) -> Self {
        Self { db, engine, config }
    }

    /// Create a batch of records. The dataset must be published and the
    /// batch within the configured size ceiling; both are checked before
    /// any other work. Valid items persist atomically; invalid items are
    /// reported by position and never written. Fails outright only when
    /// every item is invalid.
    pub async fn create_records_bulk(
        &self,
        dataset: &datasets::Model,
        items: Vec<RecordCreate>,
    ) -> RecordResult<RecordsBulkResult> {
        self.check_batch(dataset, items.len())?;

        let schema = DatasetSchema::load(&self.db, dataset.id).await?;
        let user_ids: Vec<i32> = items
            .iter()
            .flat_map(|item| item.responses.iter().map(|response| response.user_id))
            .collect();
        let users = self.fetch_users(user_ids.into_iter()).await?;

        let batch_external_ids: Vec<String> =
            items.iter().filter_map(|item| item.external_id.clone()).collect();
        let existing_external_ids = self
            .fetch_existing_external_ids(dataset.id, &batch_external_ids)
            .await?;

        let ctx = CreateContext {
            schema: &schema,
            config: &self.config,
            allow_extra_metadata: dataset.allow_extra_metadata,
            existing_external_ids: &existing_external_ids,
            users: &users,
        };
        let errors = validate_create_batch(&items, &ctx);
        let failed_positions: HashSet<usize> = errors.iter().map(|e| e.position).collect();

        let valid_items: Vec<RecordCreate> = items
            .into_iter()
            .enumerate()
            .filter(|(position, _)| !failed_positions.contains(position))
            .map(|(_, item)| item)
            .collect();

        if valid_items.is_empty() {
            return Err(RecordError::Unprocessable(errors));
        }

        let txn = self.db.begin().await?;
        let now = Utc::now();

        let mut record_ids = Vec::with_capacity(valid_items.len());
        let mut suggestion_models = Vec::new();
        let mut response_models = Vec::new();
        let mut vector_models = Vec::new();

        for item in &valid_items {
            let record = records::ActiveModel {
                dataset_id: Set(dataset.id),
                fields: Set(Value::Object(item.fields.clone())),
                metadata: Set(item.metadata.clone().map(Value::Object)),
                external_id: Set(item.external_id.clone()),
                status: Set(RecordStatus::Pending.to_string()),
                inserted_at: Set(now),
                updated_at: Set(now),
                ..Default::default()
            }
            .insert(&txn)
            .await
            .map_err(map_db_conflict)?;

            collect_suggestion_models(
                &mut suggestion_models,
                &schema,
                record.id,
                &item.suggestions,
            );
            collect_response_models(&mut response_models, record.id, &item.responses);
            collect_vector_models(&mut vector_models, &schema, record.id, &item.vectors);
            record_ids.push(record.id);
        }

        // Fixed child order: suggestions, then responses, then vectors.
        // Responses reuse the user rows fetched once for the whole batch;
        // the statements share one transactional session and must never be
        // fanned out concurrently against it.
        upsert_suggestions(&txn, suggestion_models).await.map_err(map_db_conflict)?;
        upsert_responses(&txn, response_models).await.map_err(map_db_conflict)?;
        upsert_vectors(&txn, vector_models).await.map_err(map_db_conflict)?;

        refresh_record_statuses(&txn, &record_ids).await?;
        txn.commit().await.map_err(map_db_conflict)?;

        info!(
            "Created {} records in dataset {} ({} rejected)",
            record_ids.len(),
            dataset.id,
            errors.len()
        );

        let hydrated = self.load_hydrated(&schema, &record_ids).await?;
        self.index_records(dataset, &hydrated).await;

        Ok(RecordsBulkResult {
            records: hydrated,
            updated_ids: Vec::new(),
            errors,
        })
    }

    /// Create-or-update a batch of records. Items resolve against existing
    /// records by external_id first, then internal id; matched records get
    /// partial updates (only attributes present in the payload change,
    /// with metadata as a tri-state patch). Returns the ids that were
    /// updates so callers can report created/updated counts separately.
    pub async fn upsert_records_bulk(
        &self,
        dataset: &datasets::Model,
        items: Vec<RecordUpsert>,
    ) -> RecordResult<RecordsBulkResult> {
        self.check_batch(dataset, items.len())?;

        let schema = DatasetSchema::load(&self.db, dataset.id).await?;
        let user_ids: Vec<i32> = items
            .iter()
            .flat_map(|item| {
                item.responses
                    .iter()
                    .flatten()
                    .map(|response| response.user_id)
            })
            .collect();
        let users = self.fetch_users(user_ids.into_iter()).await?;

        let batch_ids: Vec<i32> = items.iter().filter_map(|item| item.id).collect();
        let batch_external_ids: Vec<String> =
            items.iter().filter_map(|item| item.external_id.clone()).collect();

        let existing_by_id = self.fetch_records_by_ids(dataset.id, &batch_ids).await?;
        let existing_by_external_id = self
            .fetch_records_by_external_ids(dataset.id, &batch_external_ids)
            .await?;

        let ctx = UpsertContext {
            schema: &schema,
            config: &self.config,
            allow_extra_metadata: dataset.allow_extra_metadata,
            existing_by_id: &existing_by_id,
            existing_by_external_id: &existing_by_external_id,
            users: &users,
        };
        let plan = validate_upsert_batch(&items, &ctx);

        let valid_items: Vec<(RecordUpsert, ItemResolution)> = items
            .into_iter()
            .zip(plan.resolutions.into_iter())
            .filter_map(|(item, resolution)| resolution.map(|resolution| (item, resolution)))
            .collect();

        if valid_items.is_empty() {
            return Err(RecordError::Unprocessable(plan.errors));
        }

        let txn = self.db.begin().await?;
        let now = Utc::now();

        let mut record_ids = Vec::with_capacity(valid_items.len());
        let mut updated_ids = Vec::new();
        let mut suggestion_models = Vec::new();
        let mut response_models = Vec::new();
        let mut vector_models = Vec::new();

        for (item, resolution) in &valid_items {
            let record_id = match resolution {
                ItemResolution::Insert => {
                    let record = records::ActiveModel {
                        dataset_id: Set(dataset.id),
                        fields: Set(Value::Object(item.fields.clone().unwrap_or_default())),
                        metadata: Set(item
                            .metadata
                            .clone()
                            .apply(None)
                            .map(Value::Object)),
                        external_id: Set(item.external_id.clone()),
                        status: Set(RecordStatus::Pending.to_string()),
                        inserted_at: Set(now),
                        updated_at: Set(now),
                        ..Default::default()
                    }
                    .insert(&txn)
                    .await
                    .map_err(map_db_conflict)?;
                    record.id
                }
                ItemResolution::Update(existing) => {
                    // Only attributes present in the payload are written;
                    // an Absent metadata patch leaves the row untouched.
                    if !item.metadata.is_absent() {
                        let stored = existing.metadata.clone().and_then(|m| match m {
                            Value::Object(map) => Some(map),
                            _ => None,
                        });
                        let patched = item.metadata.clone().apply(stored);
                        let mut active: records::ActiveModel = existing.clone().into();
                        active.metadata = Set(patched.map(Value::Object));
                        active.updated_at = Set(now);
                        active.update(&txn).await.map_err(map_db_conflict)?;
                    }
                    updated_ids.push(existing.id);
                    existing.id
                }
            };

            if let Some(item_suggestions) = &item.suggestions {
                collect_suggestion_models(
                    &mut suggestion_models,
                    &schema,
                    record_id,
                    item_suggestions,
                );
            }
            if let Some(item_responses) = &item.responses {
                collect_response_models(&mut response_models, record_id, item_responses);
            }
            if let Some(item_vectors) = &item.vectors {
                collect_vector_models(&mut vector_models, &schema, record_id, item_vectors);
            }
            record_ids.push(record_id);
        }

        // Same fixed child order as bulk create; see the comment there.
        upsert_suggestions(&txn, suggestion_models).await.map_err(map_db_conflict)?;
        upsert_responses(&txn, response_models).await.map_err(map_db_conflict)?;
        upsert_vectors(&txn, vector_models).await.map_err(map_db_conflict)?;

        refresh_record_statuses(&txn, &record_ids).await?;
        txn.commit().await.map_err(map_db_conflict)?;

        info!(
            "Upserted {} records in dataset {} ({} updated, {} rejected)",
            record_ids.len(),
            dataset.id,
            updated_ids.len(),
            plan.errors.len()
        );

        let hydrated = self.load_hydrated(&schema, &record_ids).await?;
        self.index_records(dataset, &hydrated).await;

        Ok(RecordsBulkResult {
            records: hydrated,
            updated_ids,
            errors: plan.errors,
        })
    }

    /// Delete records by id, relational rows first (children cascade), then
    /// the search index. Capped by configuration, checked before any work.
    pub async fn delete_records(
        &self,
        dataset: &datasets::Model,
        record_ids: &[i32],
    ) -> RecordResult<u64> {
        if record_ids.is_empty() {
            return Err(RecordError::EmptyBatch);
        }
        if record_ids.len() > self.config.max_delete_records {
            return Err(RecordError::TooManyIds {
                given: record_ids.len(),
                max: self.config.max_delete_records,
            });
        }

        let result = records::Entity::delete_many()
            .filter(records::Column::DatasetId.eq(dataset.id))
            .filter(records::Column::Id.is_in(record_ids.to_vec()))
            .exec(&self.db)
            .await?;

        if let Err(err) = self.engine.delete_records(dataset, record_ids).await {
            error!(
                "Failed to delete {} records from the search index for dataset {}: {}",
                record_ids.len(),
                dataset.id,
                err
            );
        }

        info!(
            "Deleted {} records from dataset {}",
            result.rows_affected, dataset.id
        );
        Ok(result.rows_affected)
    }

    fn check_batch(&self, dataset: &datasets::Model, len: usize) -> RecordResult<()> {
        if !dataset.is_ready() {
            return Err(RecordError::DatasetNotReady(dataset.id));
        }
        if len == 0 {
            return Err(RecordError::EmptyBatch);
        }
        if len > self.config.max_bulk_records {
            return Err(RecordError::TooManyItems {
                given: len,
                max: self.config.max_bulk_records,
            });
        }
        Ok(())
    }

    /// Resolve every user referenced by the batch in one query.
    async fn fetch_users(
        &self,
        user_ids: impl Iterator<Item = i32>,
    ) -> Result<HashMap<i32, users::Model>, DbErr> {
        let unique: HashSet<i32> = user_ids.collect();
        if unique.is_empty() {
            return Ok(HashMap::new());
        }
        let found = users::Entity::find()
            .filter(users::Column::Id.is_in(unique.into_iter().collect::<Vec<_>>()))
            .all(&self.db)
            .await?;
        Ok(found.into_iter().map(|user| (user.id, user)).collect())
    }

    async fn fetch_existing_external_ids(
        &self,
        dataset_id: i32,
        external_ids: &[String],
    ) -> Result<HashSet<String>, DbErr> {
        if external_ids.is_empty() {
            return Ok(HashSet::new());
        }
        let found = records::Entity::find()
            .filter(records::Column::DatasetId.eq(dataset_id))
            .filter(records::Column::ExternalId.is_in(external_ids.to_vec()))
            .all(&self.db)
            .await?;
        Ok(found.into_iter().filter_map(|record| record.external_id).collect())
    }

    async fn fetch_records_by_ids(
        &self,
        dataset_id: i32,
        ids: &[i32],
    ) -> Result<HashMap<i32, records::Model>, DbErr> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let found = records::Entity::find()
            .filter(records::Column::DatasetId.eq(dataset_id))
            .filter(records::Column::Id.is_in(ids.to_vec()))
            .all(&self.db)
            .await?;
        Ok(found.into_iter().map(|record| (record.id, record)).collect())
    }

    async fn fetch_records_by_external_ids(
        &self,
        dataset_id: i32,
        external_ids: &[String],
    ) -> Result<HashMap<String, records::Model>, DbErr> {
        if external_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let found = records::Entity::find()
            .filter(records::Column::DatasetId.eq(dataset_id))
            .filter(records::Column::ExternalId.is_in(external_ids.to_vec()))
            .all(&self.db)
            .await?;
        Ok(found
            .into_iter()
            .filter_map(|record| record.external_id.clone().map(|eid| (eid, record)))
            .collect())
    }

    /// Re-read the affected records with their relationships, one query per
    /// child type, so indexing never falls into per-record queries.
    async fn load_hydrated(
        &self,
        schema: &DatasetSchema,
        record_ids: &[i32],
    ) -> Result<Vec<HydratedRecord>, DbErr> {
        if record_ids.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<i32> = record_ids.to_vec();
        let record_list = records::Entity::find()
            .filter(records::Column::Id.is_in(ids.clone()))
            .all(&self.db)
            .await?;
        let response_list = responses::Entity::find()
            .filter(responses::Column::RecordId.is_in(ids.clone()))
            .all(&self.db)
            .await?;
        let suggestion_list = suggestions::Entity::find()
            .filter(suggestions::Column::RecordId.is_in(ids.clone()))
            .all(&self.db)
            .await?;
        let vector_list = vectors::Entity::find()
            .filter(vectors::Column::RecordId.is_in(ids))
            .all(&self.db)
            .await?;

        let question_names: HashMap<i32, String> = schema
            .questions()
            .map(|question| (question.model.id, question.model.name.clone()))
            .collect();

        let mut records_by_id: HashMap<i32, records::Model> =
            record_list.into_iter().map(|record| (record.id, record)).collect();
        let mut responses_by_record: HashMap<i32, Vec<responses::Model>> = HashMap::new();
        for response in response_list {
            responses_by_record.entry(response.record_id).or_default().push(response);
        }
        let mut suggestions_by_record: HashMap<i32, Vec<suggestions::Model>> = HashMap::new();
        for suggestion in suggestion_list {
            suggestions_by_record
                .entry(suggestion.record_id)
                .or_default()
                .push(suggestion);
        }
        let mut vectors_by_record: HashMap<i32, Vec<vectors::Model>> = HashMap::new();
        for vector in vector_list {
            vectors_by_record.entry(vector.record_id).or_default().push(vector);
        }

        let mut hydrated = Vec::with_capacity(record_ids.len());
        for record_id in record_ids {
            let Some(record) = records_by_id.remove(record_id) else {
                continue;
            };
            let suggestions = suggestions_by_record
                .remove(record_id)
                .unwrap_or_default()
                .into_iter()
                .map(|model| HydratedSuggestion {
                    question_name: question_names
                        .get(&model.question_id)
                        .cloned()
                        .unwrap_or_default(),
                    model,
                })
                .collect();
            hydrated.push(HydratedRecord {
                record,
                responses: responses_by_record.remove(record_id).unwrap_or_default(),
                suggestions,
                vectors: vectors_by_record.remove(record_id).unwrap_or_default(),
            });
        }

        Ok(hydrated)
    }

    /// Indexing runs after the relational commit; failures are logged and
    /// swallowed so ingestion is never undone by a flaky search engine.
    async fn index_records(&self, dataset: &datasets::Model, hydrated: &[HydratedRecord]) {
        if let Err(err) = self.engine.index_records(dataset, hydrated).await {
            error!(
                "Failed to index {} records for dataset {}: {}",
                hydrated.len(),
                dataset.id,
                err
            );
        }
    }
}

fn map_db_conflict(err: DbErr) -> RecordError {
    if DbErrorKind::from_db_err(&err).is_conflict() {
        RecordError::Conflict(err.to_string())
    } else {
        RecordError::Database(err)
    }
}

fn collect_suggestion_models(
    out: &mut Vec<suggestions::ActiveModel>,
    schema: &DatasetSchema,
    record_id: i32,
    items: &[SuggestionCreate],
) {
    let now = Utc::now();
    for item in items {
        // Question existence was checked during validation.
        let Some(question) = schema.question(&item.question) else {
            continue;
        };
        out.push(suggestions::ActiveModel {
            record_id: Set(record_id),
            question_id: Set(question.model.id),
            value: Set(item.value.clone()),
            score: Set(item.score),
            agent: Set(item.agent.clone()),
            kind: Set(item.kind.map(|kind| kind.to_string())),
            inserted_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        });
    }
}

fn collect_response_models(
    out: &mut Vec<responses::ActiveModel>,
    record_id: i32,
    items: &[ResponseCreate],
) {
    let now = Utc::now();
    for item in items {
        let values = serde_json::to_value(&item.values).unwrap_or_else(|_| Value::Object(Default::default()));
        out.push(responses::ActiveModel {
            record_id: Set(record_id),
            user_id: Set(item.user_id),
            values: Set(values),
            status: Set(item.status.to_string()),
            inserted_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        });
    }
}

fn collect_vector_models(
    out: &mut Vec<vectors::ActiveModel>,
    schema: &DatasetSchema,
    record_id: i32,
    items: &indexmap::IndexMap<String, Vec<f64>>,
) {
    let now = Utc::now();
    for (name, values) in items {
        let Some(settings) = schema.vector_settings_by_name(name) else {
            continue;
        };
        out.push(vectors::ActiveModel {
            record_id: Set(record_id),
            vector_settings_id: Set(settings.model.id),
            value: Set(Value::from(values.clone())),
            inserted_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        });
    }
}

/// Idempotent keyed upsert: a second call with the same (record, question)
/// key overwrites instead of duplicating.
async fn upsert_suggestions<C>(conn: &C, models: Vec<suggestions::ActiveModel>) -> Result<(), DbErr>
where
    C: ConnectionTrait,
{
    if models.is_empty() {
        return Ok(());
    }
    suggestions::Entity::insert_many(models)
        .on_conflict(
            OnConflict::columns([
                suggestions::Column::RecordId,
                suggestions::Column::QuestionId,
            ])
            .update_columns([
                suggestions::Column::Value,
                suggestions::Column::Score,
                suggestions::Column::Agent,
                suggestions::Column::Kind,
                suggestions::Column::UpdatedAt,
            ])
            .to_owned(),
        )
        .exec(conn)
        .await?;
    Ok(())
}

async fn upsert_responses<C>(conn: &C, models: Vec<responses::ActiveModel>) -> Result<(), DbErr>
where
    C: ConnectionTrait,
{
    if models.is_empty() {
        return Ok(());
    }
    responses::Entity::insert_many(models)
        .on_conflict(
            OnConflict::columns([responses::Column::RecordId, responses::Column::UserId])
                .update_columns([
                    responses::Column::Values,
                    responses::Column::Status,
                    responses::Column::UpdatedAt,
                ])
                .to_owned(),
        )
        .exec(conn)
        .await?;
    Ok(())
}

async fn upsert_vectors<C>(conn: &C, models: Vec<vectors::ActiveModel>) -> Result<(), DbErr>
where
    C: ConnectionTrait,
{
    if models.is_empty() {
        return Ok(());
    }
    vectors::Entity::insert_many(models)
        .on_conflict(
            OnConflict::columns([vectors::Column::RecordId, vectors::Column::VectorSettingsId])
                .update_columns([vectors::Column::Value, vectors::Column::UpdatedAt])
                .to_owned(),
        )
        .exec(conn)
        .await?;
    Ok(())
}

/// Recompute the derived completion status for the given records inside the
/// current transaction: completed when at least one submitted response
/// exists, pending otherwise. Only rows whose status actually changes are
/// written.
pub(crate) async fn refresh_record_statuses<C>(conn: &C, record_ids: &[i32]) -> Result<(), DbErr>
where
    C: ConnectionTrait,
{
    if record_ids.is_empty() {
        return Ok(());
    }

    let ids: Vec<i32> = record_ids.to_vec();
    let response_list = responses::Entity::find()
        .filter(responses::Column::RecordId.is_in(ids.clone()))
        .all(conn)
        .await?;
    let submitted: HashSet<i32> = response_list
        .iter()
        .filter(|response| response.is_submitted())
        .map(|response| response.record_id)
        .collect();

    let record_list = records::Entity::find()
        .filter(records::Column::Id.is_in(ids))
        .all(conn)
        .await?;

    for record in record_list {
        let desired = if submitted.contains(&record.id) {
            RecordStatus::Completed
        } else {
            RecordStatus::Pending
        };
        if record.status != desired.to_string() {
            let mut active: records::ActiveModel = record.into();
            active.status = Set(desired.to_string());
            active.updated_at = Set(Utc::now());
            active.update(conn).await?;
        }
    }

    Ok(())
}
