use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use serde::{Deserialize, Serialize};

use crate::errors::BulkItemError;
use crate::search::{HydratedRecord, SearchQuery};
use crate::server::app::AppState;
use crate::services::search_service::SearchResultItem;
use crate::services::{DatasetService, RecordsBulkService, SearchService};
use crate::validators::{RecordCreate, RecordUpsert};

use super::ApiError;

#[derive(Deserialize)]
pub struct RecordsBulkCreateRequest {
    pub items: Vec<RecordCreate>,
}

#[derive(Deserialize)]
pub struct RecordsBulkUpsertRequest {
    pub items: Vec<RecordUpsert>,
}

#[derive(Serialize)]
pub struct RecordsBulkResponse {
    pub items: Vec<HydratedRecord>,
    pub updated_item_ids: Vec<i32>,
    pub errors: Vec<BulkItemError>,
}

#[derive(Deserialize)]
pub struct SearchRecordsRequest {
    #[serde(default)]
    pub query: SearchQuery,
    #[serde(default)]
    pub offset: u64,
    #[serde(default = "default_search_limit")]
    pub limit: u64,
}

fn default_search_limit() -> u64 {
    50
}

#[derive(Serialize)]
pub struct SearchRecordsResponse {
    pub items: Vec<SearchResultItem>,
    pub total: u64,
}

#[derive(Deserialize)]
pub struct DeleteRecordsParams {
    pub ids: String,
}

#[derive(Serialize)]
pub struct DeleteRecordsResponse {
    pub deleted: u64,
}

fn bulk_service(state: &AppState) -> RecordsBulkService {
    RecordsBulkService::new(state.db.clone(), state.engine.clone(), state.config.clone())
}

pub async fn create_records_bulk(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<RecordsBulkCreateRequest>,
) -> Result<(StatusCode, Json<RecordsBulkResponse>), ApiError> {
    let dataset = DatasetService::new(state.db.clone(), state.config.clone())
        .get_dataset(id)
        .await?;

    let result = bulk_service(&state)
        .create_records_bulk(&dataset, payload.items)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(RecordsBulkResponse {
            items: result.records,
            updated_item_ids: result.updated_ids,
            errors: result.errors,
        }),
    ))
}

pub async fn upsert_records_bulk(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<RecordsBulkUpsertRequest>,
) -> Result<Json<RecordsBulkResponse>, ApiError> {
    let dataset = DatasetService::new(state.db.clone(), state.config.clone())
        .get_dataset(id)
        .await?;

    let result = bulk_service(&state)
        .upsert_records_bulk(&dataset, payload.items)
        .await?;

    Ok(Json(RecordsBulkResponse {
        items: result.records,
        updated_item_ids: result.updated_ids,
        errors: result.errors,
    }))
}

pub async fn search_records(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<SearchRecordsRequest>,
) -> Result<Json<SearchRecordsResponse>, ApiError> {
    let dataset = DatasetService::new(state.db.clone(), state.config.clone())
        .get_dataset(id)
        .await?;

    let (items, total) = SearchService::new(state.db.clone(), state.engine.clone())
        .search_records(&dataset, &payload.query, payload.offset, payload.limit)
        .await?;

    Ok(Json(SearchRecordsResponse { items, total }))
}

pub async fn delete_records(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Query(params): Query<DeleteRecordsParams>,
) -> Result<Json<DeleteRecordsResponse>, ApiError> {
    let record_ids: Result<Vec<i32>, _> = params
        .ids
        .split(',')
        .filter(|part| !part.trim().is_empty())
        .map(|part| part.trim().parse::<i32>())
        .collect();
    let record_ids = record_ids.map_err(|_| ApiError {
        status: StatusCode::UNPROCESSABLE_ENTITY,
        message: "ids must be a comma-separated list of record ids".to_string(),
        errors: None,
    })?;

    let dataset = DatasetService::new(state.db.clone(), state.config.clone())
        .get_dataset(id)
        .await?;

    let deleted = bulk_service(&state)
        .delete_records(&dataset, &record_ids)
        .await?;

    Ok(Json(DeleteRecordsResponse { deleted }))
}
