use sea_orm::*;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::database::entities::{files, folders, processing_results};
use crate::errors::{CoreError, CoreResult};
use crate::extraction::{ExtractionResponse, PageBlock};

#[derive(Debug, Serialize, Deserialize)]
pub struct FileResults {
    pub file_id: i32,
    pub original_filename: String,
    pub extractions: Vec<PageBlock>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FolderResults {
    pub folder_id: i32,
    pub folder_name: String,
    pub status: String,
    pub files: Vec<FileResults>,
}

/// Assemble the observable state of a folder's processing: status plus the
/// last stored run's per-file extractions.
///
/// Pure read, safe at any polling frequency. While the folder is
/// `processing` this returns the previous run's blocks or empty lists;
/// absence of extractions is not failure. Callers should poll at a fixed
/// interval while status is `processing` and stop once it turns terminal.
pub async fn get_folder_results(
    db: &DatabaseConnection,
    folder_id: i32,
) -> CoreResult<FolderResults> {
    let folder = folders::Entity::find_by_id(folder_id)
        .one(db)
        .await?
        .ok_or_else(|| CoreError::NotFound(format!("folder {}", folder_id)))?;

    let file_rows = files::Entity::find()
        .filter(files::Column::FolderId.eq(folder_id))
        .order_by_asc(files::Column::Id)
        .all(db)
        .await?;

    let mut stored = load_stored_response(db, folder_id).await?;

    let files = file_rows
        .into_iter()
        .map(|file| {
            let extractions = stored
                .as_mut()
                .and_then(|response| {
                    response
                        .files
                        .iter_mut()
                        .find(|entry| entry.file_id == file.id)
                        .map(|entry| std::mem::take(&mut entry.pages))
                })
                .unwrap_or_default();
            FileResults {
                file_id: file.id,
                original_filename: file.original_filename,
                extractions,
            }
        })
        .collect();

    Ok(FolderResults {
        folder_id,
        folder_name: folder.name,
        status: folder.status,
        files,
    })
}

async fn load_stored_response(
    db: &DatabaseConnection,
    folder_id: i32,
) -> CoreResult<Option<ExtractionResponse>> {
    let row = processing_results::Entity::find()
        .filter(processing_results::Column::FolderId.eq(folder_id))
        .one(db)
        .await?;

    Ok(row.and_then(|row| match serde_json::from_str(&row.payload) {
        Ok(response) => Some(response),
        Err(e) => {
            // Treat an unreadable stored payload as no result rather than
            // failing the read path.
            warn!("Discarding unreadable result payload for folder {}: {}", folder_id, e);
            None
        }
    }))
}
