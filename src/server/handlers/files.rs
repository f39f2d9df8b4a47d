use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json},
};

use crate::database::entities::files;
use crate::errors::CoreError;
use crate::server::app::AppState;

pub async fn get_file(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<files::Model>, CoreError> {
    let file = state.folders.get_file(id).await?;
    Ok(Json(file))
}

pub async fn download_file(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, CoreError> {
    let (file, bytes) = state.folders.download_file(id).await?;
    let headers = [
        (header::CONTENT_TYPE, "application/octet-stream".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", file.original_filename),
        ),
    ];
    Ok((headers, bytes))
}

pub async fn delete_file(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, CoreError> {
    state.folders.delete_file(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
