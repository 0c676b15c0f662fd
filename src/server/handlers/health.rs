use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};

use crate::server::app::AppState;

pub async fn health_check(State(state): State<AppState>) -> Json<Value> {
    let search_engine = if state.engine.ping().await {
        "ok"
    } else {
        "unreachable"
    };
    Json(json!({
        "status": "ok",
        "search_engine": search_engine,
    }))
}
