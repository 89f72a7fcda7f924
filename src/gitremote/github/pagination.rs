//! Link-header pagination
//!
//! GitHub pages list endpoints and advertises the following page in a
//! `Link: <url>; rel="next"` header. [`Pages`] walks those links lazily, one
//! request per call to [`Pages::next_page`], and stops at the configured page
//! cap. Starting again from the first URL restarts the sequence; nothing is
//! resumed after a failure.

use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::header::{HeaderMap, LINK};
use url::Url;

use super::GithubClient;
use crate::gitremote::error::Result;

static LINK_ENTRY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"<([^>]+)>\s*;\s*rel="([^"]+)""#).expect("link header pattern is valid")
});

/// Extracts the `rel="next"` target from a `Link` header value
pub fn next_link(link_header: &str) -> Option<String> {
    LINK_ENTRY
        .captures_iter(link_header)
        .find(|caps| caps[2].split_whitespace().any(|rel| rel == "next"))
        .map(|caps| caps[1].to_string())
}

fn next_link_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get(LINK)
        .and_then(|value| value.to_str().ok())
        .and_then(next_link)
}

/// One fetched page, body parsed as JSON
#[derive(Debug, Clone)]
pub struct Page {
    pub body: serde_json::Value,
}

/// Bounded lazy sequence of pages of one paginated endpoint
pub struct Pages<'a> {
    client: &'a GithubClient,
    next: Option<Url>,
    accept: &'static str,
    resource: &'static str,
    fetched: usize,
    page_cap: usize,
}

impl<'a> Pages<'a> {
    pub(crate) fn new(
        client: &'a GithubClient,
        first: Url,
        accept: &'static str,
        resource: &'static str,
        page_cap: usize,
    ) -> Self {
        Self {
            client,
            next: Some(first),
            accept,
            resource,
            fetched: 0,
            page_cap: page_cap.max(1),
        }
    }

    /// Number of pages fetched so far
    pub fn fetched(&self) -> usize {
        self.fetched
    }

    /// Whether pages were left unread because the cap was reached
    pub fn hit_cap(&self) -> bool {
        self.next.is_some() && self.fetched >= self.page_cap
    }

    /// Fetches the next page, or `None` when the sequence is exhausted or capped
    pub async fn next_page(&mut self) -> Option<Result<Page>> {
        if self.fetched >= self.page_cap {
            if self.next.is_some() {
                tracing::debug!("Page cap of {} reached, not following further pages", self.page_cap);
            }
            return None;
        }

        let url = self.next.take()?;
        let response = match self.client.send(&url, self.accept, self.resource).await {
            Ok(response) => response,
            Err(err) => return Some(Err(err)),
        };
        self.fetched += 1;

        self.next = next_link_from_headers(&response.headers).and_then(|link| {
            match Url::parse(&link) {
                Ok(next) if next.origin() == url.origin() => Some(next),
                Ok(next) => {
                    tracing::warn!("Ignoring pagination link to a different origin: {}", next);
                    None
                }
                Err(err) => {
                    tracing::warn!("Ignoring unparseable pagination link '{}': {}", link, err);
                    None
                }
            }
        });

        Some(response.json().map(|body| Page { body }))
    }
}
