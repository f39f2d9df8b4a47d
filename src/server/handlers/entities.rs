use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};

use crate::database::entities::entities;
use crate::errors::CoreError;
use crate::server::app::AppState;
use crate::services::admin_service::{self, CreateEntityRequest, UpdateEntityRequest};

pub async fn list_entities(
    State(state): State<AppState>,
    Path(template_id): Path<i32>,
) -> Result<Json<Vec<entities::Model>>, CoreError> {
    let result = admin_service::list_entities(&state.db, template_id).await?;
    Ok(Json(result))
}

pub async fn create_entity(
    State(state): State<AppState>,
    Path(template_id): Path<i32>,
    Json(payload): Json<CreateEntityRequest>,
) -> Result<(StatusCode, Json<entities::Model>), CoreError> {
    let created = admin_service::create_entity(&state.db, template_id, payload).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update_entity(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateEntityRequest>,
) -> Result<Json<entities::Model>, CoreError> {
    let updated = admin_service::update_entity(&state.db, id, payload).await?;
    Ok(Json(updated))
}

pub async fn delete_entity(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, CoreError> {
    admin_service::delete_entity(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
