//! Rate-limit bookkeeping for the GitHub REST API
//!
//! GitHub reports a separate budget per resource (`core`, `search`,
//! `code_search`, ...) through the `x-ratelimit-*` response headers. The
//! tracker keeps one [`RateLimitState`] per resource behind a single mutex
//! owned by the client. The lock is never held across an await point.

use chrono::{DateTime, TimeZone, Utc};
use reqwest::header::HeaderMap;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::gitremote::error::{GitRemoteError, Result};

pub const HEADER_LIMIT: &str = "x-ratelimit-limit";
pub const HEADER_REMAINING: &str = "x-ratelimit-remaining";
pub const HEADER_RESET: &str = "x-ratelimit-reset";
pub const HEADER_RESOURCE: &str = "x-ratelimit-resource";
pub const HEADER_RETRY_AFTER: &str = "retry-after";

/// Budget of one rate-limit resource as last reported by the API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RateLimitState {
    pub limit: Option<u64>,
    pub remaining: u64,
    pub reset_at: DateTime<Utc>,
}

/// Rate-limit values read from one response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitSnapshot {
    pub resource: Option<String>,
    pub limit: Option<u64>,
    pub remaining: u64,
    pub reset_at: DateTime<Utc>,
}

impl RateLimitSnapshot {
    /// Reads the `x-ratelimit-*` headers; `None` unless both remaining and reset are present
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        let remaining = header_u64(headers, HEADER_REMAINING)?;
        let reset_epoch = header_u64(headers, HEADER_RESET)?;
        let reset_at = Utc
            .timestamp_opt(i64::try_from(reset_epoch).ok()?, 0)
            .single()?;

        Some(Self {
            resource: headers
                .get(HEADER_RESOURCE)
                .and_then(|v| v.to_str().ok())
                .map(String::from),
            limit: header_u64(headers, HEADER_LIMIT),
            remaining,
            reset_at,
        })
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining == 0
    }
}

/// Seconds from a `retry-after` header, used by secondary rate limits
pub fn retry_after_secs(headers: &HeaderMap) -> Option<u64> {
    header_u64(headers, HEADER_RETRY_AFTER)
}

fn header_u64(headers: &HeaderMap, name: &str) -> Option<u64> {
    headers.get(name)?.to_str().ok()?.trim().parse().ok()
}

/// Rate-limit resource a request path is charged against
pub fn resource_for_path(path: &str) -> &'static str {
    if path.starts_with("/search/code") {
        "code_search"
    } else if path.starts_with("/search/") {
        "search"
    } else {
        "core"
    }
}

/// Process-wide rate-limit state, shared by every clone of the client
#[derive(Debug, Default)]
pub struct RateLimitTracker {
    buckets: Mutex<HashMap<String, RateLimitState>>,
}

impl RateLimitTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Admits one call against `resource` or fails fast with RateLimited
    ///
    /// An admitted call reserves one unit of the known budget so concurrent
    /// callers holding a stale view cannot overdraw it. Once the reset time has
    /// passed the bucket is forgotten and the next response re-establishes it.
    pub fn acquire(&self, resource: &str, now: DateTime<Utc>) -> Result<()> {
        let mut buckets = self
            .buckets
            .lock()
            .map_err(|_| GitRemoteError::Internal("rate limit state poisoned".to_string()))?;

        let Some(state) = buckets.get_mut(resource) else {
            return Ok(());
        };

        if now >= state.reset_at {
            buckets.remove(resource);
            return Ok(());
        }

        if state.remaining == 0 {
            tracing::warn!(
                "Rejecting request: '{}' budget exhausted until {}",
                resource,
                state.reset_at
            );
            return Err(GitRemoteError::rate_limited(resource, state.reset_at, now));
        }

        state.remaining -= 1;
        Ok(())
    }

    /// Folds a response's rate-limit headers into the tracked state
    ///
    /// Within one window `remaining` only ever decreases; responses that arrive
    /// late with a higher count are ignored. A later reset time starts a new
    /// window and replaces the state.
    pub fn record(&self, fallback_resource: &str, snapshot: &RateLimitSnapshot) {
        let resource = snapshot.resource.as_deref().unwrap_or(fallback_resource);
        let Ok(mut buckets) = self.buckets.lock() else {
            return;
        };

        let incoming = RateLimitState {
            limit: snapshot.limit,
            remaining: snapshot.remaining,
            reset_at: snapshot.reset_at,
        };

        match buckets.get_mut(resource) {
            Some(current) if incoming.reset_at == current.reset_at => {
                current.remaining = current.remaining.min(incoming.remaining);
                current.limit = incoming.limit.or(current.limit);
            }
            Some(current) if incoming.reset_at < current.reset_at => {
                tracing::debug!("Ignoring stale rate limit headers for '{}'", resource);
            }
            _ => {
                buckets.insert(resource.to_string(), incoming);
            }
        }

        tracing::debug!(
            "Rate limit '{}': {} remaining until {}",
            resource,
            snapshot.remaining,
            snapshot.reset_at
        );
    }

    /// Marks a resource exhausted until `reset_at`, e.g. after a 429 without headers
    pub fn exhaust(&self, resource: &str, reset_at: DateTime<Utc>) {
        if let Ok(mut buckets) = self.buckets.lock() {
            let limit = buckets.get(resource).and_then(|s| s.limit);
            buckets.insert(
                resource.to_string(),
                RateLimitState {
                    limit,
                    remaining: 0,
                    reset_at,
                },
            );
        }
    }

    /// Current view of one resource's budget
    pub fn state(&self, resource: &str) -> Option<RateLimitState> {
        self.buckets.lock().ok()?.get(resource).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use reqwest::header::HeaderValue;

    fn snapshot(remaining: u64, reset_at: DateTime<Utc>) -> RateLimitSnapshot {
        RateLimitSnapshot {
            resource: Some("core".to_string()),
            limit: Some(60),
            remaining,
            reset_at,
        }
    }

    #[test]
    fn test_unknown_budget_admits_calls() {
        let tracker = RateLimitTracker::new();
        assert!(tracker.acquire("core", Utc::now()).is_ok());
        assert!(tracker.state("core").is_none());
    }

    #[test]
    fn test_exhausted_budget_fails_fast_until_reset() {
        let tracker = RateLimitTracker::new();
        let now = Utc::now();
        let reset_at = now + Duration::seconds(120);
        tracker.record("core", &snapshot(0, reset_at));

        match tracker.acquire("core", now) {
            Err(GitRemoteError::RateLimited {
                reset_at: reported,
                retry_after,
                ..
            }) => {
                assert_eq!(reported, reset_at);
                assert_eq!(retry_after.as_secs(), 120);
            }
            other => panic!("expected RateLimited, got {:?}", other),
        }

        // other resources are unaffected
        assert!(tracker.acquire("search", now).is_ok());

        // at reset time the budget is released
        assert!(tracker.acquire("core", reset_at).is_ok());
    }

    #[test]
    fn test_acquire_reserves_budget() {
        let tracker = RateLimitTracker::new();
        let now = Utc::now();
        tracker.record("core", &snapshot(2, now + Duration::seconds(60)));

        assert!(tracker.acquire("core", now).is_ok());
        assert!(tracker.acquire("core", now).is_ok());
        assert!(tracker.acquire("core", now).is_err());
    }

    #[test]
    fn test_remaining_never_increases_within_window() {
        let tracker = RateLimitTracker::new();
        let reset_at = Utc::now() + Duration::seconds(60);
        tracker.record("core", &snapshot(10, reset_at));
        tracker.record("core", &snapshot(12, reset_at));
        assert_eq!(tracker.state("core").unwrap().remaining, 10);

        // stale window ignored
        tracker.record("core", &snapshot(50, reset_at - Duration::seconds(3600)));
        assert_eq!(tracker.state("core").unwrap().remaining, 10);

        // new window replaces
        tracker.record("core", &snapshot(59, reset_at + Duration::seconds(3600)));
        assert_eq!(tracker.state("core").unwrap().remaining, 59);
    }

    #[test]
    fn test_snapshot_from_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(HEADER_LIMIT, HeaderValue::from_static("5000"));
        headers.insert(HEADER_REMAINING, HeaderValue::from_static("4999"));
        headers.insert(HEADER_RESET, HeaderValue::from_static("1700000000"));
        headers.insert(HEADER_RESOURCE, HeaderValue::from_static("search"));

        let snapshot = RateLimitSnapshot::from_headers(&headers).unwrap();
        assert_eq!(snapshot.limit, Some(5000));
        assert_eq!(snapshot.remaining, 4999);
        assert_eq!(snapshot.reset_at.timestamp(), 1_700_000_000);
        assert_eq!(snapshot.resource.as_deref(), Some("search"));

        headers.remove(HEADER_RESET);
        assert!(RateLimitSnapshot::from_headers(&headers).is_none());
    }

    #[test]
    fn test_resource_for_path() {
        assert_eq!(resource_for_path("/search/code"), "code_search");
        assert_eq!(resource_for_path("/search/issues"), "search");
        assert_eq!(resource_for_path("/repos/acme/widgets/tags"), "core");
    }
}
