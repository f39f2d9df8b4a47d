use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::Json,
};
use serde::{Deserialize, Serialize};

use crate::database::entities::{files, folders};
use crate::errors::CoreError;
use crate::server::app::AppState;
use crate::services::{FileUpload, UploadOutcome};

#[derive(Debug, Deserialize)]
pub struct CreateFolderRequest {
    pub name: String,
    pub document_type_id: Option<i32>,
}

#[derive(Debug, Serialize)]
pub struct FolderDetail {
    #[serde(flatten)]
    pub folder: folders::Model,
    pub files: Vec<files::Model>,
}

pub async fn list_folders(
    State(state): State<AppState>,
) -> Result<Json<Vec<FolderDetail>>, CoreError> {
    let folder_rows = state.folders.list_folders().await?;
    let mut result = Vec::with_capacity(folder_rows.len());
    for folder in folder_rows {
        let files = state.folders.list_files(folder.id).await?;
        result.push(FolderDetail { folder, files });
    }
    Ok(Json(result))
}

pub async fn create_folder(
    State(state): State<AppState>,
    Json(payload): Json<CreateFolderRequest>,
) -> Result<(StatusCode, Json<folders::Model>), CoreError> {
    let folder = state
        .folders
        .create_folder(&payload.name, payload.document_type_id)
        .await?;
    Ok((StatusCode::CREATED, Json(folder)))
}

pub async fn get_folder(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<FolderDetail>, CoreError> {
    let folder = state.folders.get_folder(id).await?;
    let files = state.folders.list_files(id).await?;
    Ok(Json(FolderDetail { folder, files }))
}

pub async fn delete_folder(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, CoreError> {
    state.folders.delete_folder(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Multipart upload of one or more `files` fields. Files past the folder's
/// remaining capacity are reported in the outcome's `rejected` count.
pub async fn upload_files(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    mut multipart: Multipart,
) -> Result<Json<UploadOutcome>, CoreError> {
    let mut uploads = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| CoreError::Validation(format!("invalid multipart body: {}", e)))?
    {
        if field.name() != Some("files") {
            continue;
        }
        let filename = field
            .file_name()
            .map(|name| name.to_string())
            .ok_or_else(|| CoreError::Validation("file field is missing a filename".into()))?;
        let bytes = field
            .bytes()
            .await
            .map_err(|e| CoreError::Validation(format!("failed to read upload: {}", e)))?;
        uploads.push(FileUpload {
            filename,
            bytes: bytes.to_vec(),
        });
    }

    let outcome = state.folders.add_files(id, uploads).await?;
    Ok(Json(outcome))
}
