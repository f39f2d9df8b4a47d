use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;
use tracing::debug;
use uuid::Uuid;

use crate::errors::{CoreError, CoreResult};

/// Put/get/delete-by-key contract for uploaded file bytes.
///
/// `put` always mints a fresh key, so stored objects are immutable; a File
/// row only ever references bytes that were fully written.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn put(&self, bytes: &[u8]) -> CoreResult<String>;
    async fn get(&self, key: &str) -> CoreResult<Vec<u8>>;
    async fn delete(&self, key: &str) -> CoreResult<()>;
}

/// Filesystem-backed object store. Objects live flat under the root
/// directory, named by their key.
pub struct FsObjectStore {
    root: PathBuf,
}

impl FsObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn object_path(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }
}

#[async_trait]
impl ObjectStore for FsObjectStore {
    async fn put(&self, bytes: &[u8]) -> CoreResult<String> {
        let key = Uuid::new_v4().to_string();
        fs::create_dir_all(&self.root)
            .await
            .map_err(|e| CoreError::Storage(format!("create {}: {}", self.root.display(), e)))?;

        let path = self.object_path(&key);
        fs::write(&path, bytes)
            .await
            .map_err(|e| CoreError::Storage(format!("write {}: {}", path.display(), e)))?;

        debug!("Stored object {} ({} bytes)", key, bytes.len());
        Ok(key)
    }

    async fn get(&self, key: &str) -> CoreResult<Vec<u8>> {
        let path = self.object_path(key);
        match fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(CoreError::NotFound(format!("object {}", key)))
            }
            Err(e) => Err(CoreError::Storage(format!("read {}: {}", path.display(), e))),
        }
    }

    async fn delete(&self, key: &str) -> CoreResult<()> {
        let path = self.object_path(key);
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(CoreError::NotFound(format!("object {}", key)))
            }
            Err(e) => Err(CoreError::Storage(format!(
                "delete {}: {}",
                path.display(),
                e
            ))),
        }
    }
}
