use axum::extract::{Path, State};
use axum::response::Json;

use crate::database::entities::responses;
use crate::server::app::AppState;
use crate::services::ResponseService;
use crate::validators::ResponseCreate;

use super::ApiError;

pub async fn upsert_response(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<ResponseCreate>,
) -> Result<Json<responses::Model>, ApiError> {
    let response = ResponseService::new(state.db.clone(), state.engine.clone())
        .upsert_response(id, payload)
        .await?;
    Ok(Json(response))
}
