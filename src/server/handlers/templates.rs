use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};

use crate::database::entities::templates;
use crate::errors::CoreError;
use crate::server::app::AppState;
use crate::services::admin_service::{
    self, CreateTemplateRequest, TemplateDetail, UpdateTemplateRequest,
};

pub async fn list_templates(
    State(state): State<AppState>,
    Path(document_type_id): Path<i32>,
) -> Result<Json<Vec<TemplateDetail>>, CoreError> {
    let result = admin_service::list_templates(&state.db, document_type_id).await?;
    Ok(Json(result))
}

pub async fn create_template(
    State(state): State<AppState>,
    Path(document_type_id): Path<i32>,
    Json(payload): Json<CreateTemplateRequest>,
) -> Result<(StatusCode, Json<templates::Model>), CoreError> {
    let created = admin_service::create_template(&state.db, document_type_id, payload).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn get_template(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<TemplateDetail>, CoreError> {
    let result = admin_service::get_template(&state.db, id).await?;
    Ok(Json(result))
}

pub async fn update_template(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateTemplateRequest>,
) -> Result<Json<templates::Model>, CoreError> {
    let updated = admin_service::update_template(&state.db, id, payload).await?;
    Ok(Json(updated))
}

pub async fn delete_template(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, CoreError> {
    admin_service::delete_template(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
