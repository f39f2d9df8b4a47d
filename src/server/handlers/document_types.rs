use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};

use crate::database::entities::document_types;
use crate::errors::CoreError;
use crate::server::app::AppState;
use crate::services::admin_service::{
    self, CreateDocumentTypeRequest, DocumentTypeDetail, UpdateDocumentTypeRequest,
};

pub async fn list_document_types(
    State(state): State<AppState>,
) -> Result<Json<Vec<DocumentTypeDetail>>, CoreError> {
    let result = admin_service::list_document_types(&state.db).await?;
    Ok(Json(result))
}

pub async fn create_document_type(
    State(state): State<AppState>,
    Json(payload): Json<CreateDocumentTypeRequest>,
) -> Result<(StatusCode, Json<document_types::Model>), CoreError> {
    let created = admin_service::create_document_type(&state.db, payload).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn get_document_type(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<DocumentTypeDetail>, CoreError> {
    let result = admin_service::get_document_type(&state.db, id).await?;
    Ok(Json(result))
}

pub async fn update_document_type(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateDocumentTypeRequest>,
) -> Result<Json<document_types::Model>, CoreError> {
    let updated = admin_service::update_document_type(&state.db, id, payload).await?;
    Ok(Json(updated))
}

pub async fn delete_document_type(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, CoreError> {
    admin_service::delete_document_type(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
