use std::sync::Arc;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde_json::Value;
use tracing::{info, warn};

use super::{Classification, ExtractionBackend, ExtractionResponse, FileExtraction, FileRef, PageBlock};
use crate::errors::{CoreError, CoreResult};
use crate::storage::ObjectStore;

fn mime_for_extension(ext: &str) -> &'static str {
    match ext {
        "tif" | "tiff" => "image/tiff",
        "pdf" => "application/pdf",
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        _ => "application/octet-stream",
    }
}

/// HTTP client for the extraction service. Each file is posted as a
/// multipart request with the composed schema in the `json` form field.
pub struct HttpExtractionBackend {
    client: reqwest::Client,
    endpoint: String,
    store: Arc<dyn ObjectStore>,
}

impl HttpExtractionBackend {
    pub fn new(endpoint: impl Into<String>, store: Arc<dyn ObjectStore>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            store,
        }
    }

    async fn submit_file(&self, schema: &Value, file: &FileRef) -> CoreResult<Vec<PageBlock>> {
        let bytes = self.store.get(&file.storage_key).await?;

        let part = Part::bytes(bytes)
            .file_name(file.original_filename.clone())
            .mime_str(mime_for_extension(&file.file_type))
            .map_err(|e| CoreError::Upstream(format!("invalid mime type: {}", e)))?;
        let schema_json = serde_json::to_string(schema)
            .map_err(|e| CoreError::Upstream(format!("unserializable schema: {}", e)))?;
        let form = Form::new().part("files", part).text("json", schema_json);

        let response = self
            .client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(|e| CoreError::Upstream(format!("request failed: {}", e)))?;

        let status = response.status();
        info!(
            "Extraction backend status={} file={}",
            status, file.original_filename
        );
        if !status.is_success() {
            return Err(CoreError::Upstream(format!(
                "backend returned {} for {}",
                status, file.original_filename
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| CoreError::Upstream(format!("invalid response body: {}", e)))?;

        Ok(parse_page_blocks(&body))
    }
}

#[async_trait]
impl ExtractionBackend for HttpExtractionBackend {
    async fn submit(&self, schema: &Value, files: &[FileRef]) -> CoreResult<ExtractionResponse> {
        let mut result = ExtractionResponse::default();
        for file in files {
            let pages = self.submit_file(schema, file).await?;
            result.files.push(FileExtraction {
                file_id: file.file_id,
                original_filename: file.original_filename.clone(),
                pages,
            });
        }
        Ok(result)
    }
}

/// Normalize the backend's response into ordered page blocks.
///
/// The service replies either with `{"extracted_data": {...}}` or with the
/// page map at the top level, keyed by page number. Each page holds a
/// `classification` object and an `extraction` that may be a key/value map
/// or a list of `{backend_entity_key, value}` pairs.
fn parse_page_blocks(body: &Value) -> Vec<PageBlock> {
    let page_map = match body.get("extracted_data") {
        Some(Value::Object(map)) => map,
        _ => match body.as_object() {
            Some(map) if map.keys().all(|k| k.parse::<i32>().is_ok()) && !map.is_empty() => map,
            _ => {
                warn!(
                    "Unexpected extraction response keys: {:?}",
                    body.as_object().map(|m| m.keys().collect::<Vec<_>>())
                );
                return Vec::new();
            }
        },
    };

    let mut pages: Vec<PageBlock> = page_map
        .iter()
        .filter_map(|(key, data)| {
            let page = match key.parse() {
                Ok(page) => page,
                Err(_) => {
                    warn!("Skipping non-numeric page key in extraction response: {}", key);
                    return None;
                }
            };
            Some(PageBlock {
                page,
                classification: parse_classification(data.get("classification")),
                entities: parse_entities(data.get("extraction")),
            })
        })
        .collect();
    pages.sort_by_key(|block| block.page);
    pages
}

fn parse_classification(value: Option<&Value>) -> Option<Classification> {
    let obj = value?.as_object()?;
    let class_name = obj.get("class_name")?.as_str()?.to_string();
    let score = obj.get("score").and_then(Value::as_f64).unwrap_or(0.0);
    let technique = obj
        .get("technique")
        .and_then(Value::as_str)
        .unwrap_or("unknown")
        .to_string();
    Some(Classification {
        class_name,
        score: score.clamp(0.0, 1.0),
        technique,
    })
}

fn parse_entities(value: Option<&Value>) -> serde_json::Map<String, Value> {
    match value {
        Some(Value::Object(map)) => map.clone(),
        Some(Value::Array(items)) => {
            let mut map = serde_json::Map::new();
            for item in items {
                let Some(obj) = item.as_object() else { continue };
                let key = obj
                    .get("backend_entity_key")
                    .or_else(|| obj.get("key"))
                    .and_then(Value::as_str);
                if let Some(key) = key {
                    map.insert(
                        key.to_string(),
                        obj.get("value").cloned().unwrap_or(Value::Null),
                    );
                }
            }
            map
        }
        _ => serde_json::Map::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_extracted_data_envelope() {
        let body = json!({
            "extraction_status": "completed",
            "extracted_data": {
                "2": {"classification": {"class_name": "passport", "score": 1, "technique": "gpt - level 1"},
                       "extraction": {"passport_number": "X1234567"}},
                "1": {"classification": {"class_name": "passport", "score": 0.5, "technique": "gpt - level 2"},
                       "extraction": []}
            }
        });

        let pages = parse_page_blocks(&body);
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].page, 1);
        assert_eq!(pages[1].page, 2);
        assert_eq!(
            pages[1].entities.get("passport_number"),
            Some(&json!("X1234567"))
        );
        let classification = pages[0].classification.as_ref().unwrap();
        assert_eq!(classification.class_name, "passport");
        assert_eq!(classification.score, 0.5);
    }

    #[test]
    fn parses_page_keyed_top_level() {
        let body = json!({
            "1": {"classification": {"class_name": "emirates_id", "score": 2.5, "technique": "t"},
                   "extraction": [{"backend_entity_key": "emirates_id_number", "value": "784-1234"}]}
        });

        let pages = parse_page_blocks(&body);
        assert_eq!(pages.len(), 1);
        // score clamps into [0, 1]
        assert_eq!(pages[0].classification.as_ref().unwrap().score, 1.0);
        assert_eq!(
            pages[0].entities.get("emirates_id_number"),
            Some(&json!("784-1234"))
        );
    }

    #[test]
    fn non_numeric_page_keys_are_skipped() {
        let body = json!({
            "extracted_data": {
                "1": {"classification": {"class_name": "passport", "score": 0.9, "technique": "t"},
                       "extraction": {"passport_number": "X1234567"}},
                "summary": "two pages scanned"
            }
        });

        let pages = parse_page_blocks(&body);
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].page, 1);
    }

    #[test]
    fn unexpected_body_yields_no_pages() {
        let body = json!({"detail": "boom"});
        assert!(parse_page_blocks(&body).is_empty());
    }
}
