use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Json;
use chrono::Utc;
use sea_orm::ActiveValue::Set;
use sea_orm::ActiveModelTrait;
use serde::Deserialize;

use crate::database::entities::users;
use crate::server::app::AppState;

use super::ApiError;

#[derive(Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
}

pub async fn create_user(
    State(state): State<AppState>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<users::Model>), ApiError> {
    let now = Utc::now();
    let user = users::ActiveModel {
        username: Set(payload.username),
        inserted_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    Ok((StatusCode::CREATED, Json(user)))
}
