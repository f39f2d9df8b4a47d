//! Shared test support: scratch databases, object stores, and a scriptable
//! extraction backend.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use sea_orm::{Database, DatabaseConnection};
use serde_json::{json, Value};
use tempfile::{NamedTempFile, TempDir};

use docintake::database::setup_database;
use docintake::errors::{CoreError, CoreResult};
use docintake::extraction::{
    Classification, ExtractionBackend, ExtractionResponse, FileExtraction, FileRef, PageBlock,
};
use docintake::services::{FolderService, ProcessingService};
use docintake::storage::{FsObjectStore, ObjectStore};

/// Create a migrated scratch database backed by a temp file.
pub async fn setup_test_db() -> Result<(DatabaseConnection, NamedTempFile)> {
    let temp_file = NamedTempFile::new()?;
    let db_url = format!("sqlite://{}?mode=rwc", temp_file.path().display());

    let db = Database::connect(&db_url).await?;
    setup_database(&db).await?;

    Ok((db, temp_file))
}

pub fn setup_store() -> Result<(Arc<FsObjectStore>, TempDir)> {
    let temp_dir = TempDir::new()?;
    let store = Arc::new(FsObjectStore::new(temp_dir.path()));
    Ok((store, temp_dir))
}

pub fn folder_service(db: &DatabaseConnection, store: Arc<FsObjectStore>) -> FolderService {
    FolderService::new(db.clone(), store)
}

pub fn processing_service(
    db: &DatabaseConnection,
    folders: FolderService,
    backend: Arc<MockBackend>,
    timeout: Duration,
) -> ProcessingService {
    ProcessingService::with_timeout(db.clone(), folders, backend, timeout)
}

/// Object store that starts failing puts once its budget is spent; reads
/// and deletes keep working so cleanup paths stay observable.
pub struct FlakyStore {
    inner: FsObjectStore,
    put_budget: AtomicUsize,
}

impl FlakyStore {
    pub fn new(root: &std::path::Path, put_budget: usize) -> Arc<Self> {
        Arc::new(Self {
            inner: FsObjectStore::new(root),
            put_budget: AtomicUsize::new(put_budget),
        })
    }
}

#[async_trait]
impl ObjectStore for FlakyStore {
    async fn put(&self, bytes: &[u8]) -> CoreResult<String> {
        let spent = self
            .put_budget
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_err();
        if spent {
            return Err(CoreError::Storage("simulated write failure".into()));
        }
        self.inner.put(bytes).await
    }

    async fn get(&self, key: &str) -> CoreResult<Vec<u8>> {
        self.inner.get(key).await
    }

    async fn delete(&self, key: &str) -> CoreResult<()> {
        self.inner.delete(key).await
    }
}

#[derive(Clone, Copy)]
pub enum MockBehavior {
    /// Respond with one page per file containing a fixed entity map
    Succeed,
    /// Fail with an upstream error
    Fail,
    /// Never answer within any test deadline
    Hang,
}

/// Extraction backend double that records how often it was invoked.
pub struct MockBackend {
    behavior: MockBehavior,
    delay: Duration,
    pub calls: AtomicUsize,
}

impl MockBackend {
    pub fn new(behavior: MockBehavior, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            behavior,
            delay,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ExtractionBackend for MockBackend {
    async fn submit(&self, _schema: &Value, files: &[FileRef]) -> CoreResult<ExtractionResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;

        match self.behavior {
            MockBehavior::Succeed => Ok(sample_response(files)),
            MockBehavior::Fail => Err(CoreError::Upstream("simulated backend failure".into())),
            MockBehavior::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(ExtractionResponse::default())
            }
        }
    }
}

pub fn sample_response(files: &[FileRef]) -> ExtractionResponse {
    let files = files
        .iter()
        .map(|file| FileExtraction {
            file_id: file.file_id,
            original_filename: file.original_filename.clone(),
            pages: vec![PageBlock {
                page: 1,
                classification: Some(Classification {
                    class_name: "passport".to_string(),
                    score: 0.93,
                    technique: "mock - level 1".to_string(),
                }),
                entities: json!({"passport_number": "X1234567"})
                    .as_object()
                    .cloned()
                    .unwrap_or_default(),
            }],
        })
        .collect();
    ExtractionResponse { files }
}

/// Poll a folder until its status leaves `processing`/`pending` or the
/// deadline passes; returns the final status string.
pub async fn wait_for_terminal_status(
    folders: &FolderService,
    folder_id: i32,
    deadline: Duration,
) -> Result<String> {
    let started = std::time::Instant::now();
    loop {
        let folder = folders.get_folder(folder_id).await?;
        if folder.get_status().is_terminal() {
            return Ok(folder.status);
        }
        if started.elapsed() > deadline {
            return Ok(folder.status);
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}
