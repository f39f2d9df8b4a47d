pub mod http;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::CoreResult;

pub use http::HttpExtractionBackend;

/// Reference to an uploaded file handed to the extraction backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileRef {
    pub file_id: i32,
    pub original_filename: String,
    pub file_type: String,
    pub storage_key: String,
}

/// Per-page classification produced by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub class_name: String,
    /// Confidence in [0, 1]
    pub score: f64,
    pub technique: String,
}

/// One page worth of extraction output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageBlock {
    pub page: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub classification: Option<Classification>,
    /// backend_entity_key -> extracted value
    pub entities: serde_json::Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileExtraction {
    pub file_id: i32,
    pub original_filename: String,
    pub pages: Vec<PageBlock>,
}

/// Full result set for one processing run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResponse {
    pub files: Vec<FileExtraction>,
}

/// Seam to the external AI extraction service. One `submit` call is one
/// unit of work for a whole folder; implementations fetch the referenced
/// bytes themselves and must not mutate any application state.
#[async_trait]
pub trait ExtractionBackend: Send + Sync {
    async fn submit(&self, schema: &Value, files: &[FileRef]) -> CoreResult<ExtractionResponse>;
}
