//! Local file as a record source.
//!
//! Accepts a JSON array, a single JSON object, or JSON Lines. Elements that
//! look like issues (`number` plus `body`) keep their issue number; anything
//! else is numbered by position starting at 1.

use std::path::PathBuf;

use async_trait::async_trait;
use serde_json::Value;
use tokio::fs;
use tracing::info;

use super::{Issue, RecordSource, SourceError};
use crate::models::RawPayload;

fn looks_like_issue(value: &Value) -> bool {
    value
        .as_object()
        .is_some_and(|o| o.contains_key("number") && o.contains_key("body"))
}

/// Convert one element; `None` for pull requests.
fn payload_from_value(position: usize, value: Value) -> Result<Option<RawPayload>, SourceError> {
    if looks_like_issue(&value) {
        let issue: Issue = serde_json::from_value(value)
            .map_err(|e| SourceError::UnexpectedShape(format!("malformed issue: {}", e)))?;
        if issue.is_pull_request() {
            return Ok(None);
        }
        return Ok(Some(issue.into_payload()));
    }
    Ok(Some(RawPayload::new(position as u64 + 1, value.to_string())))
}

/// Parse file contents into payloads.
pub fn parse_payload_file(contents: &str) -> Result<Vec<RawPayload>, SourceError> {
    let trimmed = contents.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }

    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        return match value {
            Value::Array(items) => {
                let mut payloads = Vec::with_capacity(items.len());
                for (i, item) in items.into_iter().enumerate() {
                    payloads.extend(payload_from_value(i, item)?);
                }
                Ok(payloads)
            }
            Value::Object(_) => Ok(payload_from_value(0, value)?.into_iter().collect()),
            _ => Err(SourceError::UnexpectedShape(
                "expected a JSON array, object, or JSON Lines".to_string(),
            )),
        };
    }

    if trimmed.starts_with('[') {
        return Err(SourceError::UnexpectedShape(
            "truncated or malformed JSON array".to_string(),
        ));
    }

    // JSON Lines. A line that fails to parse stays a payload so the
    // normalizer can skip it like any other malformed record, but a file
    // with no JSON line at all is not JSON Lines.
    let mut payloads = Vec::new();
    let mut parsed_lines = 0;
    for (i, line) in trimmed
        .lines()
        .filter(|l| !l.trim().is_empty())
        .enumerate()
    {
        match serde_json::from_str::<Value>(line) {
            Ok(value) => {
                parsed_lines += 1;
                payloads.extend(payload_from_value(i, value)?);
            }
            Err(_) => payloads.push(RawPayload::new(i as u64 + 1, line)),
        }
    }
    if parsed_lines == 0 {
        return Err(SourceError::UnexpectedShape(
            "no line of the file is JSON".to_string(),
        ));
    }
    Ok(payloads)
}

/// Reads payloads from a local file.
pub struct FileSource {
    path: PathBuf,
    name: String,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = format!("file:{}", path.display());
        Self { path, name }
    }
}

#[async_trait]
impl RecordSource for FileSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch_all(&self) -> Result<Vec<RawPayload>, SourceError> {
        let contents = fs::read_to_string(&self.path).await?;
        let payloads = parse_payload_file(&contents)?;
        info!("Read {} payloads from {:?}", payloads.len(), self.path);
        Ok(payloads)
    }
}
