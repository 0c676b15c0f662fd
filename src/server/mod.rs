pub mod app;
pub mod handlers;

use clap::Subcommand;

#[derive(Subcommand, Debug)]
pub enum MigrateDirection {
    Up,
    Down,
    Fresh,
}

use crate::config::AppConfig;
use crate::database::{connection::*, migrations::Migrator};
use crate::search::{InMemorySearchEngine, SearchEngine};
use anyhow::Result;
use sea_orm_migration::prelude::*;
use std::sync::Arc;
use tracing::{info, warn};

pub async fn start_server(port: u16, database_path: &str, cors_origin: Option<&str>) -> Result<()> {
    let database_url = get_database_url(Some(database_path));
    let db = establish_connection(&database_url).await?;

    // Run migrations
    Migrator::up(&db, None).await?;
    info!("Database migrations completed");

    let config = AppConfig::from_env();
    let engine: Arc<dyn SearchEngine> = Arc::new(InMemorySearchEngine::new());
    if !engine.ping().await {
        warn!("Search engine is unreachable; ingestion will commit but indexing will lag");
    }

    let app = app::create_app(db, engine, config, cors_origin).await?;

    log_routes();

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;
    info!("Server running on http://0.0.0.0:{}", port);

    axum::serve(listener, app).await?;

    Ok(())
}

fn log_routes() {
    info!("API Endpoints:");
    info!("  /health                                    - Health check");
    info!("  /api/v1/workspaces                         - Workspaces");
    info!("  /api/v1/users                              - Users");
    info!("  /api/v1/datasets                           - Datasets and schema children");
    info!("  /api/v1/datasets/{{id}}/records/bulk         - Bulk create (POST) / upsert (PUT)");
    info!("  /api/v1/datasets/{{id}}/records/search       - Structured search");
    info!("  /api/v1/datasets/{{id}}/records?ids=csv      - Bulk delete");
    info!("  /api/v1/records/{{id}}/responses             - Response upsert");
}

pub async fn migrate_database(database_path: &str, direction: MigrateDirection) -> Result<()> {
    let database_url = get_database_url(Some(database_path));
    let db = establish_connection(&database_url).await?;

    match direction {
        MigrateDirection::Up => {
            info!("Running migrations up");
            Migrator::up(&db, None).await?;
        }
        MigrateDirection::Down => {
            info!("Running migrations down");
            Migrator::down(&db, None).await?;
        }
        MigrateDirection::Fresh => {
            info!("Running fresh migrations (down then up)");
            Migrator::down(&db, None).await?;
            Migrator::up(&db, None).await?;
        }
    }

    info!("Database migration completed");
    Ok(())
}
