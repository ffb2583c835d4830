//! Record sources.
//!
//! A record source hands over the complete list of raw payloads for one run.
//! Retrieval finishes before normalization starts; any failure here aborts
//! the run before anything is written.

mod file;
mod github;

pub use file::*;
pub use github::*;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::models::RawPayload;

/// Errors that can occur while retrieving records.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid header value for {0}")]
    InvalidHeader(&'static str),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP {status}: {message}")]
    HttpStatus { status: u16, message: String },

    #[error("Listing still had entries after {pages} pages; raise max_pages")]
    Truncated { pages: u32 },

    #[error("Unexpected response shape: {0}")]
    UnexpectedShape(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Supplies every raw payload for a run.
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Source identifier for logging.
    fn name(&self) -> &str;

    /// Retrieve the full payload list.
    async fn fetch_all(&self) -> Result<Vec<RawPayload>, SourceError>;
}

/// An issue as returned by the tracker API. Only the fields we use.
#[derive(Debug, Deserialize)]
pub(crate) struct Issue {
    pub number: u64,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub pull_request: Option<Value>,
}

impl Issue {
    /// Pull requests share the issues listing but never carry match results.
    pub fn is_pull_request(&self) -> bool {
        self.pull_request.is_some()
    }

    pub fn into_payload(self) -> RawPayload {
        RawPayload::new(self.number, self.body.unwrap_or_default())
    }
}

/// Payloads already held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    payloads: Vec<RawPayload>,
}

impl MemorySource {
    pub fn new(payloads: Vec<RawPayload>) -> Self {
        Self { payloads }
    }
}

#[async_trait]
impl RecordSource for MemorySource {
    fn name(&self) -> &str {
        "memory"
    }

    async fn fetch_all(&self) -> Result<Vec<RawPayload>, SourceError> {
        Ok(self.payloads.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_into_payload() {
        let issue: Issue =
            serde_json::from_str(r#"{"number": 12, "body": "{}", "title": "x"}"#).unwrap();
        assert!(!issue.is_pull_request());
        assert_eq!(issue.into_payload(), RawPayload::new(12, "{}"));
    }

    #[test]
    fn test_issue_null_body() {
        let issue: Issue = serde_json::from_str(r#"{"number": 3, "body": null}"#).unwrap();
        assert_eq!(issue.into_payload().body, "");
    }

    #[test]
    fn test_issue_pull_request() {
        let issue: Issue =
            serde_json::from_str(r#"{"number": 4, "body": "", "pull_request": {"url": "u"}}"#)
                .unwrap();
        assert!(issue.is_pull_request());
    }

    #[test]
    fn test_memory_source() {
        let source = MemorySource::new(vec![RawPayload::new(1, "{}")]);
        let payloads = tokio_test::block_on(source.fetch_all()).unwrap();
        assert_eq!(payloads.len(), 1);
        assert_eq!(source.name(), "memory");
    }
}
