use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use sea_orm::*;
use serde::Serialize;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::database::entities::{folders::FolderStatus, processing_results};
use crate::errors::{CoreError, CoreResult};
use crate::extraction::{ExtractionBackend, ExtractionResponse, FileRef};
use crate::schema::compose_schema_value;
use crate::services::folder_service::FolderService;

/// Default deadline for one backend run. A run that blows past it is
/// failed by the orchestrator itself; folders never sit in `processing`
/// indefinitely.
pub const DEFAULT_RUN_TIMEOUT: Duration = Duration::from_secs(120);

/// Handle returned by `start_processing`; observe progress by polling the
/// folder's status and results.
#[derive(Debug, Clone, Serialize)]
pub struct RunHandle {
    pub run_id: String,
    pub folder_id: i32,
}

struct ActiveRun {
    run_id: String,
    task_handle: JoinHandle<()>,
}

/// Dispatches extraction runs: validates preconditions, claims the folder
/// via a status compare-and-set, and hands the work to a background task.
/// At most one run is in flight per folder.
#[derive(Clone)]
pub struct ProcessingService {
    db: DatabaseConnection,
    folders: FolderService,
    backend: Arc<dyn ExtractionBackend>,
    run_timeout: Duration,
    active_runs: Arc<RwLock<HashMap<i32, ActiveRun>>>,
}

impl ProcessingService {
    pub fn new(
        db: DatabaseConnection,
        folders: FolderService,
        backend: Arc<dyn ExtractionBackend>,
    ) -> Self {
        Self::with_timeout(db, folders, backend, DEFAULT_RUN_TIMEOUT)
    }

    pub fn with_timeout(
        db: DatabaseConnection,
        folders: FolderService,
        backend: Arc<dyn ExtractionBackend>,
        run_timeout: Duration,
    ) -> Self {
        Self {
            db,
            folders,
            backend,
            run_timeout,
            active_runs: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Start an asynchronous extraction run for a folder.
    ///
    /// Returns as soon as the folder is claimed and the work is dispatched;
    /// the outcome is observable only through polling. A folder already in
    /// `processing` is rejected, never queued.
    pub async fn start_processing(&self, folder_id: i32) -> CoreResult<RunHandle> {
        let folder = self.folders.get_folder(folder_id).await?;

        let from = folder.get_status();
        if from == FolderStatus::Processing {
            return Err(CoreError::PreconditionFailed(format!(
                "folder {} is already processing",
                folder_id
            )));
        }

        let file_refs = self.file_refs(folder_id).await?;
        if file_refs.is_empty() {
            return Err(CoreError::PreconditionFailed(format!(
                "folder {} has no files",
                folder_id
            )));
        }

        // Composed before the folder is claimed so a NotFound surfaces
        // synchronously instead of stranding the folder in processing.
        let schema = compose_schema_value(&self.db, folder.document_type_id).await?;

        // The conditional update is the mutual exclusion: of two racing
        // callers that both observed `from`, exactly one flips the row.
        if !self
            .folders
            .compare_and_set_status(folder_id, from, FolderStatus::Processing)
            .await?
        {
            return Err(CoreError::PreconditionFailed(format!(
                "folder {} is already processing",
                folder_id
            )));
        }

        let run_id = Uuid::new_v4().to_string();
        info!(
            "Dispatching run {} for folder {} ({} files)",
            run_id,
            folder_id,
            file_refs.len()
        );

        let service = self.clone();
        let task_run_id = run_id.clone();
        let task_handle = tokio::spawn(async move {
            service
                .execute_run(task_run_id, folder_id, schema, file_refs)
                .await;
        });

        self.active_runs.write().await.insert(
            folder_id,
            ActiveRun {
                run_id: run_id.clone(),
                task_handle,
            },
        );

        Ok(RunHandle { run_id, folder_id })
    }

    /// Abort an in-flight run and fail the folder. Returns false when no
    /// run was active.
    pub async fn cancel(&self, folder_id: i32) -> CoreResult<bool> {
        let removed = self.active_runs.write().await.remove(&folder_id);
        match removed {
            Some(run) => {
                run.task_handle.abort();
                self.folders
                    .compare_and_set_status(folder_id, FolderStatus::Processing, FolderStatus::Failed)
                    .await?;
                warn!("Run {} for folder {} cancelled", run.run_id, folder_id);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn execute_run(
        &self,
        run_id: String,
        folder_id: i32,
        schema: serde_json::Value,
        file_refs: Vec<FileRef>,
    ) {
        let outcome = timeout(self.run_timeout, self.backend.submit(&schema, &file_refs)).await;

        match outcome {
            Ok(Ok(response)) => match self.store_result(&run_id, folder_id, &response).await {
                Ok(()) => {
                    self.finish(folder_id, FolderStatus::Completed).await;
                    info!("Run {} for folder {} completed", run_id, folder_id);
                }
                Err(e) => {
                    error!("Run {} result write failed: {}", run_id, e);
                    self.finish(folder_id, FolderStatus::Failed).await;
                }
            },
            Ok(Err(e)) => {
                error!("Run {} for folder {} failed: {}", run_id, folder_id, e);
                self.finish(folder_id, FolderStatus::Failed).await;
            }
            Err(_) => {
                error!(
                    "Run {} for folder {} timed out after {:?}",
                    run_id, folder_id, self.run_timeout
                );
                self.finish(folder_id, FolderStatus::Failed).await;
            }
        }

        let mut runs = self.active_runs.write().await;
        if runs.get(&folder_id).is_some_and(|run| run.run_id == run_id) {
            runs.remove(&folder_id);
        }
    }

    /// Replace the folder's stored result wholesale. A failed run never
    /// reaches here, so a prior completed run's result is never clobbered
    /// by a failure.
    async fn store_result(
        &self,
        run_id: &str,
        folder_id: i32,
        response: &ExtractionResponse,
    ) -> CoreResult<()> {
        let payload = serde_json::to_string(response)
            .map_err(|e| CoreError::Upstream(format!("unserializable result: {}", e)))?;
        let run_id = run_id.to_string();

        self.db
            .transaction::<_, (), CoreError>(move |txn| {
                Box::pin(async move {
                    processing_results::Entity::delete_many()
                        .filter(processing_results::Column::FolderId.eq(folder_id))
                        .exec(txn)
                        .await?;
                    let row = processing_results::ActiveModel {
                        folder_id: Set(folder_id),
                        run_id: Set(run_id),
                        payload: Set(payload),
                        created_at: Set(Utc::now()),
                        ..Default::default()
                    };
                    row.insert(txn).await?;
                    Ok(())
                })
            })
            .await
            .map_err(|e| match e {
                TransactionError::Connection(db) => CoreError::Database(db),
                TransactionError::Transaction(e) => e,
            })
    }

    async fn finish(&self, folder_id: i32, terminal: FolderStatus) {
        match self
            .folders
            .compare_and_set_status(folder_id, FolderStatus::Processing, terminal)
            .await
        {
            Ok(true) => {}
            Ok(false) => warn!(
                "Folder {} left processing before run completion was recorded",
                folder_id
            ),
            Err(e) => error!("Failed to record terminal status for folder {}: {}", folder_id, e),
        }
    }

    async fn file_refs(&self, folder_id: i32) -> CoreResult<Vec<FileRef>> {
        let rows = self.folders.list_files(folder_id).await?;
        Ok(rows
            .into_iter()
            .map(|file| FileRef {
                file_id: file.id,
                original_filename: file.original_filename,
                file_type: file.file_type,
                storage_key: file.storage_key,
            })
            .collect())
    }
}
