use std::sync::Arc;

use anyhow::Result;
use axum::{
    routing::{delete, get, post, put},
    Router,
};
use sea_orm::DatabaseConnection;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};

use super::handlers::{document_types, entities, files, folders, health, processing, schema, templates};
use crate::extraction::ExtractionBackend;
use crate::services::{FolderService, ProcessingService};
use crate::storage::ObjectStore;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub folders: FolderService,
    pub processing: ProcessingService,
}

impl AppState {
    pub fn new(
        db: DatabaseConnection,
        store: Arc<dyn ObjectStore>,
        backend: Arc<dyn ExtractionBackend>,
    ) -> Self {
        let folders = FolderService::new(db.clone(), store);
        let processing = ProcessingService::new(db.clone(), folders.clone(), backend);
        Self {
            db,
            folders,
            processing,
        }
    }
}

pub async fn create_app(state: AppState, cors_origin: Option<&str>) -> Result<Router> {
    let cors = match cors_origin {
        Some(origin) => CorsLayer::new()
            .allow_origin(origin.parse::<axum::http::HeaderValue>()?)
            .allow_methods(Any)
            .allow_headers(Any),
        None => CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any),
    };

    let app = Router::new()
        .route("/health", get(health::health_check))
        .nest("/api/v1", api_v1_routes())
        .layer(ServiceBuilder::new().layer(cors))
        .with_state(state);

    Ok(app)
}

fn api_v1_routes() -> Router<AppState> {
    Router::new()
        // Composed extraction contract (the "JSON preview")
        .route("/schema", get(schema::get_full_schema))
        .route("/schema/:document_type_id", get(schema::get_schema_subtree))
        // Document type configuration
        .route("/document-types", get(document_types::list_document_types))
        .route("/document-types", post(document_types::create_document_type))
        .route("/document-types/:id", get(document_types::get_document_type))
        .route("/document-types/:id", put(document_types::update_document_type))
        .route("/document-types/:id", delete(document_types::delete_document_type))
        // Templates
        .route("/document-types/:id/templates", get(templates::list_templates))
        .route("/document-types/:id/templates", post(templates::create_template))
        .route("/templates/:id", get(templates::get_template))
        .route("/templates/:id", put(templates::update_template))
        .route("/templates/:id", delete(templates::delete_template))
        // Entities
        .route("/templates/:id/entities", get(entities::list_entities))
        .route("/templates/:id/entities", post(entities::create_entity))
        .route("/entities/:id", put(entities::update_entity))
        .route("/entities/:id", delete(entities::delete_entity))
        // Folders and files
        .route("/folders", get(folders::list_folders))
        .route("/folders", post(folders::create_folder))
        .route("/folders/:id", get(folders::get_folder))
        .route("/folders/:id", delete(folders::delete_folder))
        .route("/folders/:id/files", post(folders::upload_files))
        .route("/files/:id", get(files::get_file))
        .route("/files/:id", delete(files::delete_file))
        .route("/files/:id/download", get(files::download_file))
        // Processing runs
        .route("/folders/:id/process", post(processing::start_processing))
        .route("/folders/:id/process", delete(processing::cancel_processing))
        .route("/folders/:id/results", get(processing::get_results))
}
