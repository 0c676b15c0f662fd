use anyhow::{anyhow, Result};
use axum::{
    routing::{delete, get, post, put},
    Router,
};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};

use crate::config::AppConfig;
use crate::search::SearchEngine;

use super::handlers::{datasets, health, records, responses, users, workspaces};

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub engine: Arc<dyn SearchEngine>,
    pub config: AppConfig,
}

pub async fn create_app(
    db: DatabaseConnection,
    engine: Arc<dyn SearchEngine>,
    config: AppConfig,
    cors_origin: Option<&str>,
) -> Result<Router> {
    let state = AppState { db, engine, config };

    let methods = [
        axum::http::Method::GET,
        axum::http::Method::POST,
        axum::http::Method::PUT,
        axum::http::Method::DELETE,
        axum::http::Method::OPTIONS,
    ];
    let cors = match cors_origin {
        Some(origin) => CorsLayer::new()
            .allow_origin(
                origin
                    .parse::<axum::http::HeaderValue>()
                    .map_err(|e| anyhow!("Invalid CORS origin: {}", e))?,
            )
            .allow_methods(methods)
            .allow_headers(Any)
            .allow_credentials(false),
        None => CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(methods)
            .allow_headers(Any)
            .allow_credentials(false),
    };

    let app = Router::new()
        .route("/health", get(health::health_check))
        .route("/api/v1/workspaces", post(workspaces::create_workspace))
        .route("/api/v1/users", post(users::create_user))
        .route("/api/v1/datasets", post(datasets::create_dataset))
        .route(
            "/api/v1/datasets/:id",
            get(datasets::get_dataset).delete(datasets::delete_dataset),
        )
        .route("/api/v1/datasets/:id/publish", put(datasets::publish_dataset))
        .route("/api/v1/datasets/:id/fields", post(datasets::create_field))
        .route("/api/v1/datasets/:id/questions", post(datasets::create_question))
        .route(
            "/api/v1/datasets/:id/metadata-properties",
            post(datasets::create_metadata_property),
        )
        .route(
            "/api/v1/datasets/:id/vector-settings",
            post(datasets::create_vector_settings),
        )
        .route(
            "/api/v1/datasets/:id/records/bulk",
            post(records::create_records_bulk).put(records::upsert_records_bulk),
        )
        .route(
            "/api/v1/datasets/:id/records/search",
            post(records::search_records),
        )
        .route("/api/v1/datasets/:id/records", delete(records::delete_records))
        .route("/api/v1/records/:id/responses", put(responses::upsert_response))
        .layer(ServiceBuilder::new().layer(cors))
        .with_state(state);

    Ok(app)
}
