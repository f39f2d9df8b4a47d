pub mod app;
pub mod handlers;

use std::sync::Arc;

use anyhow::Result;
use clap::Subcommand;
use sea_orm_migration::prelude::*;
use tracing::info;

use crate::database::{connection::*, migrations::Migrator, seed_data};
use crate::extraction::HttpExtractionBackend;
use crate::storage::FsObjectStore;

#[derive(Subcommand, Debug)]
pub enum MigrateDirection {
    Up,
    Down,
    Fresh,
}

pub struct ServerConfig<'a> {
    pub port: u16,
    pub database_path: &'a str,
    pub data_dir: &'a str,
    pub extraction_url: &'a str,
    pub cors_origin: Option<&'a str>,
}

pub async fn start_server(config: ServerConfig<'_>) -> Result<()> {
    let database_url = get_database_url(Some(config.database_path));
    let db = establish_connection(&database_url).await?;

    Migrator::up(&db, None).await?;
    info!("Database migrations completed");

    let store = Arc::new(FsObjectStore::new(config.data_dir));
    let backend = Arc::new(HttpExtractionBackend::new(
        config.extraction_url,
        store.clone(),
    ));
    let state = app::AppState::new(db, store, backend);

    let router = app::create_app(state, config.cors_origin).await?;

    log_routes();

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port)).await?;
    info!("Server running on http://0.0.0.0:{}", config.port);

    axum::serve(listener, router).await?;

    Ok(())
}

fn log_routes() {
    info!("API Endpoints:");
    info!("  /health                       - Health check");
    info!("  /api/v1/schema                - Composed extraction contract (JSON preview)");
    info!("  /api/v1/document-types/*      - Extraction configuration admin");
    info!("  /api/v1/folders/*             - Folder intake, uploads, processing, results");
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

pub async fn seed_database(database_path: &str) -> Result<()> {
    let database_url = get_database_url(Some(database_path));
    let db = establish_connection(&database_url).await?;
    Migrator::up(&db, None).await?;
    seed_data::create_example_config(&db).await?;
    Ok(())
}
