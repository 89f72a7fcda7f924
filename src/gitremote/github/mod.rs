//! GitHub REST API client
//!
//! [`GithubClient`] is the single choke point for outbound calls. Every request:
//!
//! 1. is admitted (or rejected with RateLimited) by the shared [`RateLimitTracker`]
//! 2. carries the bearer token when one is configured, and a bounded timeout
//! 3. updates the tracker from the response's `x-ratelimit-*` headers
//! 4. has its status mapped onto the error taxonomy
//!
//! NetworkErrors are retried a bounded number of times with exponential
//! backoff; every other error is returned immediately.
//!
//! # Rate Limiting
//!
//! GitHub API has rate limits that vary based on authentication:
//! - Unauthenticated: 60 requests/hour
//! - Authenticated: 5,000 requests/hour
//! - Code search: 10 requests/minute, authentication required

pub mod models;
pub mod pagination;
pub mod rate_limit;

use chrono::Utc;
use rand::Rng;
use reqwest::header::{HeaderMap, ACCEPT, CONTENT_TYPE};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

use crate::gitremote::config::ClientConfig;
use crate::gitremote::error::{GitRemoteError, Result};
use models::GithubErrorBody;
use pagination::Pages;
use rate_limit::{resource_for_path, retry_after_secs, RateLimitSnapshot, RateLimitTracker};

pub const API_VERSION: &str = "2022-11-28";

/// Standard JSON media type
pub const MEDIA_JSON: &str = "application/vnd.github+json";

/// Raw file contents instead of a base64 JSON envelope
pub const MEDIA_RAW: &str = "application/vnd.github.raw";

/// JSON with `text_matches` fragments on search results
pub const MEDIA_TEXT_MATCH: &str = "application/vnd.github.text-match+json";

/// Wait applied to a 429 that carries neither rate-limit nor retry-after headers
const DEFAULT_RATE_LIMIT_WAIT_SECS: i64 = 60;

/// A successful response, body already read
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub headers: HeaderMap,
    pub body: String,
}

impl ApiResponse {
    /// Deserializes the body, treating a shape mismatch as a malformed upstream response
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_str(&self.body).map_err(|e| {
            GitRemoteError::Network(format!("malformed response from hosting API: {}", e))
        })
    }

    pub fn content_type(&self) -> Option<&str> {
        self.headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok())
    }
}

/// Items collected across pages
#[derive(Debug, Clone)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    /// Further pages existed but the page cap stopped the walk
    pub truncated: bool,
}

#[derive(Clone)]
pub struct GithubClient {
    client: Client,
    config: Arc<ClientConfig>,
    rate_limits: Arc<RateLimitTracker>,
}

impl GithubClient {
    /// Creates a client with its own connection pool and rate-limit state
    pub fn new(config: ClientConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| GitRemoteError::Network(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self::with_client(client, config))
    }

    /// Creates a client around an existing reqwest client
    pub fn with_client(client: Client, config: ClientConfig) -> Self {
        GithubClient {
            client,
            config: Arc::new(config),
            rate_limits: Arc::new(RateLimitTracker::new()),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Rate-limit state shared by all clones of this client
    pub fn rate_limits(&self) -> &RateLimitTracker {
        &self.rate_limits
    }

    /// Builds an absolute API URL from a path (starting with `/`) and query parameters
    pub fn endpoint_url(&self, path: &str, query: &[(&str, &str)]) -> Result<Url> {
        let mut url = Url::parse(&format!("{}{}", self.config.api_base_url, path)).map_err(|e| {
            GitRemoteError::Validation(format!("invalid API path '{}': {}", path, e))
        })?;
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    /// GETs a JSON endpoint and deserializes the body
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> Result<T> {
        let url = self.endpoint_url(path, query)?;
        self.send(&url, MEDIA_JSON, resource_for_path(path))
            .await?
            .json()
    }

    /// GETs an endpoint with the raw media type, e.g. file contents or the README
    pub async fn get_raw(&self, path: &str, query: &[(&str, &str)]) -> Result<ApiResponse> {
        let url = self.endpoint_url(path, query)?;
        self.send(&url, MEDIA_RAW, resource_for_path(path)).await
    }

    /// Lazily walks the pages of a paginated endpoint
    ///
    /// The first request asks for the configured page size starting at page 1.
    pub fn pages(&self, path: &str, query: &[(&str, &str)], accept: &'static str) -> Result<Pages<'_>> {
        self.pages_sized(path, query, accept, self.config.per_page)
    }

    /// Same as [`GithubClient::pages`] with an explicit page size (1 to 100)
    pub fn pages_sized(
        &self,
        path: &str,
        query: &[(&str, &str)],
        accept: &'static str,
        per_page: u8,
    ) -> Result<Pages<'_>> {
        let per_page = per_page.clamp(1, 100).to_string();
        let mut full_query: Vec<(&str, &str)> = query.to_vec();
        full_query.push(("per_page", &per_page));
        full_query.push(("page", "1"));

        let url = self.endpoint_url(path, &full_query)?;
        Ok(Pages::new(
            self,
            url,
            accept,
            resource_for_path(path),
            self.config.page_cap,
        ))
    }

    /// Collects items across pages in encounter order
    ///
    /// `extract` turns one page body into items. Paging stops when the API has
    /// no further page, the page cap is reached, or `max_items` items have been
    /// collected. Any failure abandons the whole collection.
    pub async fn get_paginated<T, F>(
        &self,
        path: &str,
        query: &[(&str, &str)],
        accept: &'static str,
        max_items: Option<usize>,
        mut extract: F,
    ) -> Result<Paginated<T>>
    where
        F: FnMut(serde_json::Value) -> Result<Vec<T>>,
    {
        let mut pages = self.pages(path, query, accept)?;
        let mut items = Vec::new();

        while let Some(page) = pages.next_page().await {
            let page = page?;
            items.extend(extract(page.body)?);
            if max_items.is_some_and(|max| items.len() >= max) {
                break;
            }
        }

        if let Some(max) = max_items {
            items.truncate(max);
        }
        let truncated = pages.hit_cap();
        if truncated {
            tracing::info!(
                "Stopped paginating {} after {} pages (page cap)",
                path,
                pages.fetched()
            );
        }
        Ok(Paginated { items, truncated })
    }

    /// Sends one logical request, retrying NetworkErrors with backoff
    pub(crate) async fn send(&self, url: &Url, accept: &str, resource: &str) -> Result<ApiResponse> {
        let mut attempt: u32 = 0;
        loop {
            self.rate_limits.acquire(resource, Utc::now())?;

            match self.send_once(url, accept, resource).await {
                Err(err) if err.is_retryable() && attempt < self.config.max_retries => {
                    let delay = backoff_delay(&self.config, attempt);
                    attempt += 1;
                    tracing::warn!(
                        "Request to {} failed ({}), retrying in {:?} (attempt {}/{})",
                        url,
                        err,
                        delay,
                        attempt,
                        self.config.max_retries
                    );
                    tokio::time::sleep(delay).await;
                }
                result => return result,
            }
        }
    }

    async fn send_once(&self, url: &Url, accept: &str, resource: &str) -> Result<ApiResponse> {
        let mut req_builder = self
            .client
            .get(url.clone())
            .header(ACCEPT, accept)
            .header("X-GitHub-Api-Version", API_VERSION);

        // Add authentication token if available
        if let Some(token) = self.config.github_token.as_ref() {
            req_builder = req_builder.bearer_auth(token);
        }

        tracing::debug!("GET {}", url);
        let response = req_builder.send().await?;

        let status = response.status();
        let headers = response.headers().clone();
        let snapshot = RateLimitSnapshot::from_headers(&headers);
        if let Some(snapshot) = &snapshot {
            self.rate_limits.record(resource, snapshot);
        }

        let body = response.text().await?;
        if status.is_success() {
            return Ok(ApiResponse { headers, body });
        }

        let bucket = snapshot
            .as_ref()
            .and_then(|s| s.resource.clone())
            .unwrap_or_else(|| resource.to_string());
        let err = classify_failure(status, &headers, snapshot.as_ref(), &body, &bucket);
        if let GitRemoteError::RateLimited { reset_at, .. } = &err {
            self.rate_limits.exhaust(&bucket, *reset_at);
        }
        tracing::debug!("GET {} failed with {}: {}", url, status, err);
        Err(err)
    }
}

/// Maps a non-success response onto the error taxonomy
pub fn classify_failure(
    status: StatusCode,
    headers: &HeaderMap,
    snapshot: Option<&RateLimitSnapshot>,
    body: &str,
    resource: &str,
) -> GitRemoteError {
    let now = Utc::now();
    let message = serde_json::from_str::<GithubErrorBody>(body)
        .map(|b| b.message)
        .unwrap_or_else(|_| body.chars().take(200).collect());
    let detail = format!("GitHub API error {}: {}", status, message);

    match status.as_u16() {
        401 => GitRemoteError::Auth(detail),
        403 | 429 => {
            if let Some(snapshot) = snapshot.filter(|s| s.is_exhausted()) {
                GitRemoteError::rate_limited(resource, snapshot.reset_at, now)
            } else if let Some(secs) = retry_after_secs(headers) {
                let wait = chrono::Duration::seconds(i64::try_from(secs).unwrap_or(i64::MAX / 1000));
                GitRemoteError::rate_limited(resource, now + wait, now)
            } else if status == StatusCode::TOO_MANY_REQUESTS {
                let wait = chrono::Duration::seconds(DEFAULT_RATE_LIMIT_WAIT_SECS);
                GitRemoteError::rate_limited(resource, now + wait, now)
            } else {
                GitRemoteError::Auth(detail)
            }
        }
        404 => GitRemoteError::NotFound(detail),
        400..=499 => GitRemoteError::Validation(detail),
        _ => GitRemoteError::Network(detail),
    }
}

/// Exponential backoff with up to 25% random jitter, capped at `retry_max_delay`
fn backoff_delay(config: &ClientConfig, attempt: u32) -> Duration {
    let base = config
        .retry_base_delay
        .saturating_mul(2u32.saturating_pow(attempt))
        .min(config.retry_max_delay);
    let jitter_ms = u64::try_from(base.as_millis() / 4).unwrap_or(0);
    let jitter = if jitter_ms > 0 {
        rand::thread_rng().gen_range(0..=jitter_ms)
    } else {
        0
    };
    base + Duration::from_millis(jitter)
}
