use chrono::Utc;
use sea_orm::ActiveValue::Set;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, TransactionTrait,
};
use serde_json::Value;
use std::sync::Arc;
use tracing::{error, info};

use crate::database::entities::{records, responses, users};
use crate::errors::{RecordError, RecordResult};
use crate::schema::DatasetSchema;
use crate::search::SearchEngine;
use crate::validators::{validate_response, ResponseCreate};

use super::record_bulk_service::refresh_record_statuses;

/// Single-response upsert, keyed by (record, user): the per-record
/// counterpart of the bulk ingestion path, driving an incremental
/// search-index update instead of a full re-index.
pub struct ResponseService {
    db: DatabaseConnection,
    engine: Arc<dyn SearchEngine>,
}

impl ResponseService {
    pub fn new(db: DatabaseConnection, engine: Arc<dyn SearchEngine>) -> Self {
        Self { db, engine }
    }

    pub async fn upsert_response(
        &self,
        record_id: i32,
        payload: ResponseCreate,
    ) -> RecordResult<responses::Model> {
        let record = records::Entity::find_by_id(record_id)
            .one(&self.db)
            .await?
            .ok_or(RecordError::NotFound(record_id))?;

        users::Entity::find_by_id(payload.user_id)
            .one(&self.db)
            .await?
            .ok_or(RecordError::UserNotFound(payload.user_id))?;

        let schema = DatasetSchema::load(&self.db, record.dataset_id).await?;
        validate_response(&payload, &schema, record.fields.as_object())
            .map_err(RecordError::InvalidResponse)?;

        let values = serde_json::to_value(&payload.values)
            .unwrap_or_else(|_| Value::Object(Default::default()));
        let now = Utc::now();

        let txn = self.db.begin().await?;
        let existing = responses::Entity::find()
            .filter(responses::Column::RecordId.eq(record_id))
            .filter(responses::Column::UserId.eq(payload.user_id))
            .one(&txn)
            .await?;

        let response = match existing {
            Some(existing) => {
                let mut active: responses::ActiveModel = existing.into();
                active.values = Set(values);
                active.status = Set(payload.status.to_string());
                active.updated_at = Set(now);
                active.update(&txn).await?
            }
            None => {
                responses::ActiveModel {
                    record_id: Set(record_id),
                    user_id: Set(payload.user_id),
                    values: Set(values),
                    status: Set(payload.status.to_string()),
                    inserted_at: Set(now),
                    updated_at: Set(now),
                    ..Default::default()
                }
                .insert(&txn)
                .await?
            }
        };

        refresh_record_statuses(&txn, &[record_id]).await?;
        txn.commit().await?;

        info!(
            "Upserted response {} for record {} by user {}",
            response.id, record_id, payload.user_id
        );

        // Re-read the record so the index sees the refreshed status.
        if let Some(record) = records::Entity::find_by_id(record_id).one(&self.db).await? {
            if let Err(err) = self.engine.update_record_response(&record, &response).await {
                error!(
                    "Failed to update search index for response {} on record {}: {}",
                    response.id, record_id, err
                );
            }
        }

        Ok(response)
    }
}
