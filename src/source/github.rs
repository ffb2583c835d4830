//! GitHub issue listing as a record source.
//!
//! Each issue body holds one match payload; the issue number becomes the
//! record id. Issues are requested oldest first so player history follows
//! submission order.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, info, warn};
use url::{Host, Url};

use super::{Issue, RecordSource, SourceError};
use crate::config::SourceConfig;
use crate::models::RawPayload;

/// One decoded page of the issue listing.
#[derive(Debug, Default)]
pub struct IssuePage {
    /// Payloads from real issues
    pub payloads: Vec<RawPayload>,
    /// Entries on the page, pull requests included
    pub entries: usize,
}

/// Decode one page of the issue listing.
///
/// Anything other than an array of issue objects is an unexpected shape.
pub fn parse_issue_page(body: &str) -> Result<IssuePage, SourceError> {
    let value: Value = serde_json::from_str(body)?;
    let Value::Array(entries) = value else {
        return Err(SourceError::UnexpectedShape(
            "issue listing is not a JSON array".to_string(),
        ));
    };

    let mut page = IssuePage {
        payloads: Vec::with_capacity(entries.len()),
        entries: entries.len(),
    };
    for entry in entries {
        let issue: Issue = serde_json::from_value(entry)
            .map_err(|e| SourceError::UnexpectedShape(format!("malformed issue: {}", e)))?;
        if issue.is_pull_request() {
            debug!("Ignoring pull request #{}", issue.number);
            continue;
        }
        page.payloads.push(issue.into_payload());
    }
    Ok(page)
}

fn is_loopback(api_base: &str) -> bool {
    match Url::parse(api_base).ok().and_then(|u| u.host().map(|h| h.to_owned())) {
        Some(Host::Domain(domain)) => domain == "localhost",
        Some(Host::Ipv4(ip)) => ip.is_loopback(),
        Some(Host::Ipv6(ip)) => ip.is_loopback(),
        None => false,
    }
}

/// Lists issues of one repository.
pub struct GithubIssuesSource {
    client: Client,
    config: SourceConfig,
    name: String,
}

impl GithubIssuesSource {
    /// Create a source. The token, if any, is read from `config.token_env`.
    pub fn new(config: SourceConfig) -> Result<Self, SourceError> {
        let token = std::env::var(&config.token_env)
            .ok()
            .filter(|t| !t.trim().is_empty());
        Self::with_token(config, token)
    }

    pub fn with_token(config: SourceConfig, token: Option<String>) -> Result<Self, SourceError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent)
                .unwrap_or_else(|_| HeaderValue::from_static("battle-rank/0.1.0")),
        );
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        if let Some(token) = token {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", token.trim()))
                .map_err(|_| SourceError::InvalidHeader("authorization"))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let mut builder = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .default_headers(headers);
        // Local mirrors are reached directly, whatever proxy the environment sets.
        if is_loopback(&config.api_base) {
            builder = builder.no_proxy();
        }
        let client = builder.build()?;

        let name = format!("github:{}/{}", config.owner, config.repo);
        Ok(Self {
            client,
            config,
            name,
        })
    }

    /// URL of one page of the issue listing (pages are 1-based).
    pub fn page_url(&self, page: u32) -> Result<Url, SourceError> {
        let base = self.config.api_base.trim_end_matches('/');
        let mut url = Url::parse(&format!(
            "{}/repos/{}/{}/issues",
            base, self.config.owner, self.config.repo
        ))
        .map_err(|e| SourceError::InvalidUrl(e.to_string()))?;

        url.query_pairs_mut()
            .append_pair("state", "all")
            .append_pair("sort", "created")
            .append_pair("direction", "asc")
            .append_pair("per_page", &self.config.per_page.to_string())
            .append_pair("page", &page.to_string());
        Ok(url)
    }

    async fn fetch_page(&self, url: &Url) -> Result<IssuePage, SourceError> {
        info!("Fetching {}", url);

        let response = self.client.get(url.as_str()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::HttpStatus {
                status: status.as_u16(),
                message: status.canonical_reason().unwrap_or("Unknown").to_string(),
            });
        }

        let body = response.text().await?;
        parse_issue_page(&body)
    }
}

#[async_trait]
impl RecordSource for GithubIssuesSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch_all(&self) -> Result<Vec<RawPayload>, SourceError> {
        let mut payloads = Vec::new();

        for page in 1..=self.config.max_pages {
            let url = self.page_url(page)?;
            let batch = self.fetch_page(&url).await?;
            let entries = batch.entries;
            payloads.extend(batch.payloads);

            if entries < self.config.per_page as usize {
                info!("Fetched {} issues from {}", payloads.len(), self.name);
                return Ok(payloads);
            }
        }

        // Every page was full, so later issues may exist.
        warn!(
            "Issue listing of {} not exhausted after {} pages",
            self.name, self.config.max_pages
        );
        Err(SourceError::Truncated {
            pages: self.config.max_pages,
        })
    }
}
