use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Json;
use chrono::Utc;
use sea_orm::ActiveValue::Set;
use sea_orm::ActiveModelTrait;
use serde::Deserialize;

use crate::database::entities::workspaces;
use crate::server::app::AppState;

use super::ApiError;

#[derive(Deserialize)]
pub struct CreateWorkspaceRequest {
    pub name: String,
}

pub async fn create_workspace(
    State(state): State<AppState>,
    Json(payload): Json<CreateWorkspaceRequest>,
) -> Result<(StatusCode, Json<workspaces::Model>), ApiError> {
    let now = Utc::now();
    let workspace = workspaces::ActiveModel {
        name: Set(payload.name),
        inserted_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    Ok((StatusCode::CREATED, Json(workspace)))
}
