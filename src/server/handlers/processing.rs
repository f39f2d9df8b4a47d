use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::Serialize;
use tracing::info;

use crate::errors::CoreError;
use crate::server::app::AppState;
use crate::services::{get_folder_results, FolderResults, RunHandle};

#[derive(Debug, Serialize)]
pub struct StartProcessingResponse {
    #[serde(flatten)]
    pub handle: RunHandle,
    pub status: String,
    pub message: String,
}

/// Dispatch an extraction run. Returns 202 immediately; the outcome is
/// observed by polling `GET /folders/:id/results`.
pub async fn start_processing(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, CoreError> {
    info!("Starting processing for folder {}", id);
    let handle = state.processing.start_processing(id).await?;
    let response = StartProcessingResponse {
        handle,
        status: "processing".to_string(),
        message: "Processing started".to_string(),
    };
    Ok((StatusCode::ACCEPTED, Json(response)))
}

pub async fn cancel_processing(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, CoreError> {
    let cancelled = state.processing.cancel(id).await?;
    if cancelled {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(CoreError::PreconditionFailed(format!(
            "folder {} has no active run",
            id
        )))
    }
}

/// Pure read of a folder's processing state; safe to poll at any frequency.
///
/// Recommended protocol: poll at a fixed interval while `status` is
/// `processing`, stop once it is `completed` or `failed`. An empty
/// `extractions` list during processing is not a failure.
pub async fn get_results(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<FolderResults>, CoreError> {
    let results = get_folder_results(&state.db, id).await?;
    Ok(Json(results))
}
