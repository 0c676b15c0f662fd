use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;

use crate::database::entities::{
    datasets, fields, metadata_properties, questions, vector_settings,
};
use crate::server::app::AppState;
use crate::services::dataset_service::{
    DatasetCreate, FieldCreate, MetadataPropertyCreate, QuestionCreate, VectorSettingsCreate,
};
use crate::services::DatasetService;

use super::ApiError;

fn service(state: &AppState) -> DatasetService {
    DatasetService::new(state.db.clone(), state.config.clone())
}

pub async fn create_dataset(
    State(state): State<AppState>,
    Json(payload): Json<DatasetCreate>,
) -> Result<(StatusCode, Json<datasets::Model>), ApiError> {
    let dataset = service(&state).create_dataset(payload).await?;
    Ok((StatusCode::CREATED, Json(dataset)))
}

pub async fn get_dataset(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<datasets::Model>, ApiError> {
    let dataset = service(&state).get_dataset(id).await?;
    Ok(Json(dataset))
}

pub async fn delete_dataset(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    service(&state).delete_dataset(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn publish_dataset(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<datasets::Model>, ApiError> {
    let dataset = service(&state).publish_dataset(id).await?;
    Ok(Json(dataset))
}

pub async fn create_field(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<FieldCreate>,
) -> Result<(StatusCode, Json<fields::Model>), ApiError> {
    let field = service(&state).create_field(id, payload).await?;
    Ok((StatusCode::CREATED, Json(field)))
}

pub async fn create_question(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<QuestionCreate>,
) -> Result<(StatusCode, Json<questions::Model>), ApiError> {
    let question = service(&state).create_question(id, payload).await?;
    Ok((StatusCode::CREATED, Json(question)))
}

pub async fn create_metadata_property(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<MetadataPropertyCreate>,
) -> Result<(StatusCode, Json<metadata_properties::Model>), ApiError> {
    let property = service(&state).create_metadata_property(id, payload).await?;
    Ok((StatusCode::CREATED, Json(property)))
}

pub async fn create_vector_settings(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<VectorSettingsCreate>,
) -> Result<(StatusCode, Json<vector_settings::Model>), ApiError> {
    let settings = service(&state).create_vector_settings(id, payload).await?;
    Ok((StatusCode::CREATED, Json(settings)))
}
