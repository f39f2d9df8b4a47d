use std::sync::Arc;

use chrono::Utc;
use sea_orm::*;
use serde::Serialize;
use tracing::{info, warn};

use crate::database::entities::{
    document_types, files,
    files::{file_extension, ALLOWED_EXTENSIONS},
    folders,
    folders::FolderStatus,
    processing_results,
};
use crate::errors::{CoreError, CoreResult};
use crate::storage::ObjectStore;

/// Maximum number of files a folder may hold, enforced at upload time.
pub const MAX_FILES_PER_FOLDER: usize = 5;

/// One file handed to `add_files`.
pub struct FileUpload {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Outcome of an upload batch. `rejected` counts files dropped because the
/// folder ran out of capacity; callers decide whether that is an error or a
/// partial success.
#[derive(Debug, Serialize)]
pub struct UploadOutcome {
    pub stored: Vec<files::Model>,
    pub rejected: usize,
}

/// Owns folder and file state: creation, uploads, deletion cascades, and
/// the status compare-and-set every transition goes through.
#[derive(Clone)]
pub struct FolderService {
    db: DatabaseConnection,
    store: Arc<dyn ObjectStore>,
}

impl FolderService {
    pub fn new(db: DatabaseConnection, store: Arc<dyn ObjectStore>) -> Self {
        Self { db, store }
    }

    pub async fn create_folder(
        &self,
        name: &str,
        document_type_id: Option<i32>,
    ) -> CoreResult<folders::Model> {
        let name = name.trim();
        if name.is_empty() {
            return Err(CoreError::Validation("folder name must not be empty".into()));
        }

        if let Some(id) = document_type_id {
            document_types::Entity::find_by_id(id)
                .one(&self.db)
                .await?
                .ok_or_else(|| CoreError::NotFound(format!("document type {}", id)))?;
        }

        let now = Utc::now();
        let folder = folders::ActiveModel {
            name: Set(name.to_string()),
            document_type_id: Set(document_type_id),
            status: Set(FolderStatus::Pending.into()),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let folder = folder.insert(&self.db).await?;
        info!("Created folder {} ({:?})", folder.id, folder.name);
        Ok(folder)
    }

    pub async fn get_folder(&self, folder_id: i32) -> CoreResult<folders::Model> {
        folders::Entity::find_by_id(folder_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("folder {}", folder_id)))
    }

    pub async fn list_folders(&self) -> CoreResult<Vec<folders::Model>> {
        folders::Entity::find()
            .order_by_desc(folders::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(Into::into)
    }

    pub async fn list_files(&self, folder_id: i32) -> CoreResult<Vec<files::Model>> {
        files::Entity::find()
            .filter(files::Column::FolderId.eq(folder_id))
            .order_by_asc(files::Column::Id)
            .all(&self.db)
            .await
            .map_err(Into::into)
    }

    /// Store an upload batch against a folder.
    ///
    /// Disallowed extensions reject the whole batch before any byte is
    /// written. Files beyond the remaining capacity are truncated off and
    /// reported in `rejected`; a folder that is already full is
    /// CapacityExceeded outright. Bytes go to object storage before the
    /// File row is committed, and the row count is re-checked inside the
    /// insert transaction so concurrent uploads cannot overshoot the cap.
    pub async fn add_files(
        &self,
        folder_id: i32,
        uploads: Vec<FileUpload>,
    ) -> CoreResult<UploadOutcome> {
        self.get_folder(folder_id).await?;

        if uploads.is_empty() {
            return Err(CoreError::Validation("no files uploaded".into()));
        }

        let mut typed = Vec::with_capacity(uploads.len());
        for upload in &uploads {
            let ext = file_extension(&upload.filename)
                .filter(|ext| ALLOWED_EXTENSIONS.contains(&ext.as_str()))
                .ok_or_else(|| {
                    CoreError::Validation(format!(
                        "file type not allowed: {}",
                        upload.filename
                    ))
                })?;
            typed.push(ext);
        }

        let current = self.count_files(folder_id).await?;
        if current >= MAX_FILES_PER_FOLDER {
            return Err(CoreError::CapacityExceeded {
                capacity: MAX_FILES_PER_FOLDER,
                current,
            });
        }

        let total = uploads.len();
        let candidates: Vec<(FileUpload, String)> = uploads
            .into_iter()
            .zip(typed)
            .take(MAX_FILES_PER_FOLDER - current)
            .collect();

        // Write bytes first; a row is only ever committed for bytes that
        // made it into the store. A failed put discards everything staged
        // so far, nothing is left without a row to claim it.
        let mut staged = Vec::with_capacity(candidates.len());
        for (upload, ext) in candidates {
            match self.store.put(&upload.bytes).await {
                Ok(key) => staged.push((upload, ext, key)),
                Err(e) => {
                    self.discard_objects(staged.iter().map(|(_, _, key)| key.as_str()))
                        .await;
                    return Err(e);
                }
            }
        }

        let staged_rows = staged
            .iter()
            .map(|(upload, ext, key)| {
                (
                    upload.filename.clone(),
                    ext.clone(),
                    key.clone(),
                    upload.bytes.len() as i64,
                )
            })
            .collect::<Vec<_>>();

        let insert_result = self
            .db
            .transaction::<_, Vec<files::Model>, CoreError>(move |txn| {
                Box::pin(async move {
                    let committed = files::Entity::find()
                        .filter(files::Column::FolderId.eq(folder_id))
                        .count(txn)
                        .await? as usize;
                    let remaining = MAX_FILES_PER_FOLDER.saturating_sub(committed);

                    let mut stored = Vec::new();
                    for (filename, ext, key, size) in staged_rows.into_iter().take(remaining) {
                        let row = files::ActiveModel {
                            folder_id: Set(folder_id),
                            original_filename: Set(filename),
                            file_type: Set(ext),
                            storage_key: Set(key),
                            file_size: Set(size),
                            created_at: Set(Utc::now()),
                            ..Default::default()
                        };
                        stored.push(row.insert(txn).await?);
                    }
                    Ok(stored)
                })
            })
            .await
            .map_err(unwrap_txn_err);

        let stored = match insert_result {
            Ok(stored) => stored,
            Err(e) => {
                // No row claimed anything; every staged object is an orphan.
                self.discard_objects(staged.iter().map(|(_, _, key)| key.as_str()))
                    .await;
                return Err(e);
            }
        };

        // Staged bytes that lost the capacity race get no row; drop them.
        self.discard_objects(
            staged
                .iter()
                .skip(stored.len())
                .map(|(_, _, key)| key.as_str()),
        )
        .await;

        let rejected = total - stored.len();
        if rejected > 0 {
            info!(
                "Folder {} accepted {} of {} uploads (capacity {})",
                folder_id,
                stored.len(),
                total,
                MAX_FILES_PER_FOLDER
            );
        }
        Ok(UploadOutcome { stored, rejected })
    }

    /// Delete a folder with its files and results in one transaction, then
    /// drop the backing storage objects. Row truth wins: a storage delete
    /// failure is logged, never surfaced.
    pub async fn delete_folder(&self, folder_id: i32) -> CoreResult<()> {
        self.get_folder(folder_id).await?;
        let file_rows = self.list_files(folder_id).await?;

        self.db
            .transaction::<_, (), CoreError>(move |txn| {
                Box::pin(async move {
                    files::Entity::delete_many()
                        .filter(files::Column::FolderId.eq(folder_id))
                        .exec(txn)
                        .await?;
                    processing_results::Entity::delete_many()
                        .filter(processing_results::Column::FolderId.eq(folder_id))
                        .exec(txn)
                        .await?;
                    folders::Entity::delete_by_id(folder_id).exec(txn).await?;
                    Ok(())
                })
            })
            .await
            .map_err(unwrap_txn_err)?;

        for file in &file_rows {
            if let Err(e) = self.store.delete(&file.storage_key).await {
                warn!("Failed to delete object {}: {}", file.storage_key, e);
            }
        }

        info!("Deleted folder {} with {} files", folder_id, file_rows.len());
        Ok(())
    }

    pub async fn get_file(&self, file_id: i32) -> CoreResult<files::Model> {
        files::Entity::find_by_id(file_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("file {}", file_id)))
    }

    pub async fn download_file(&self, file_id: i32) -> CoreResult<(files::Model, Vec<u8>)> {
        let file = self.get_file(file_id).await?;
        let bytes = self.store.get(&file.storage_key).await?;
        Ok((file, bytes))
    }

    pub async fn delete_file(&self, file_id: i32) -> CoreResult<()> {
        let file = self.get_file(file_id).await?;
        files::Entity::delete_by_id(file_id).exec(&self.db).await?;
        if let Err(e) = self.store.delete(&file.storage_key).await {
            warn!("Failed to delete object {}: {}", file.storage_key, e);
        }
        Ok(())
    }

    /// Move a folder to `to`, requiring the currently stored status to be a
    /// legal predecessor. The check-and-set runs as a single conditional
    /// UPDATE, so two racing callers serialize: exactly one wins.
    pub async fn transition(&self, folder_id: i32, to: FolderStatus) -> CoreResult<()> {
        let folder = self.get_folder(folder_id).await?;
        let from = folder.get_status();
        if !from.can_transition_to(to) {
            return Err(CoreError::InvalidState {
                from: from.as_str().to_string(),
                to: to.as_str().to_string(),
            });
        }
        if self.compare_and_set_status(folder_id, from, to).await? {
            Ok(())
        } else {
            // Lost the race; the stored status is no longer `from`.
            Err(CoreError::InvalidState {
                from: from.as_str().to_string(),
                to: to.as_str().to_string(),
            })
        }
    }

    /// Conditional status update; returns whether this caller won.
    pub async fn compare_and_set_status(
        &self,
        folder_id: i32,
        expected: FolderStatus,
        to: FolderStatus,
    ) -> CoreResult<bool> {
        let update = folders::ActiveModel {
            status: Set(to.into()),
            updated_at: Set(Utc::now()),
            ..Default::default()
        };
        let result = folders::Entity::update_many()
            .set(update)
            .filter(folders::Column::Id.eq(folder_id))
            .filter(folders::Column::Status.eq(String::from(expected)))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected == 1)
    }

    /// Best-effort removal of storage objects no row references.
    async fn discard_objects<'a>(&self, keys: impl Iterator<Item = &'a str>) {
        for key in keys {
            if let Err(e) = self.store.delete(key).await {
                warn!("Failed to drop unclaimed object {}: {}", key, e);
            }
        }
    }

    pub async fn count_files(&self, folder_id: i32) -> CoreResult<usize> {
        let count = files::Entity::find()
            .filter(files::Column::FolderId.eq(folder_id))
            .count(&self.db)
            .await?;
        Ok(count as usize)
    }
}

fn unwrap_txn_err(err: TransactionError<CoreError>) -> CoreError {
    match err {
        TransactionError::Connection(e) => CoreError::Database(e),
        TransactionError::Transaction(e) => e,
    }
}
