//! Error taxonomy shared by every layer between the tool surface and the network

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use strum::{AsRefStr, Display, EnumString};
use thiserror::Error;

/// Stable error kinds reported to tool callers
///
/// The string forms are part of the tool contract and must not change.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
pub enum ErrorKind {
    /// Bad or missing tool arguments, unparseable repository reference,
    /// or a request the hosting API rejected as malformed
    #[strum(serialize = "ValidationError")]
    #[serde(rename = "ValidationError")]
    Validation,
    /// Ref, path or tag does not exist upstream
    #[strum(serialize = "NotFound")]
    #[serde(rename = "NotFound")]
    NotFound,
    /// Missing or invalid credential
    #[strum(serialize = "AuthError")]
    #[serde(rename = "AuthError")]
    Auth,
    /// Rate-limit budget exhausted until a known reset time
    #[strum(serialize = "RateLimited")]
    #[serde(rename = "RateLimited")]
    RateLimited,
    /// Transport failure, timeout, 5xx or malformed upstream response
    #[strum(serialize = "NetworkError")]
    #[serde(rename = "NetworkError")]
    Network,
    /// A tool handler panicked
    #[strum(serialize = "InternalError")]
    #[serde(rename = "InternalError")]
    Internal,
}

#[derive(Debug, Clone, Error)]
pub enum GitRemoteError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Auth(String),

    #[error("rate limit exhausted for '{resource}', resets at {reset_at} (retry in {}s)", .retry_after.as_secs())]
    RateLimited {
        resource: String,
        reset_at: DateTime<Utc>,
        retry_after: Duration,
    },

    #[error("{0}")]
    Network(String),

    #[error("{0}")]
    Internal(String),
}

impl GitRemoteError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            GitRemoteError::Validation(_) => ErrorKind::Validation,
            GitRemoteError::NotFound(_) => ErrorKind::NotFound,
            GitRemoteError::Auth(_) => ErrorKind::Auth,
            GitRemoteError::RateLimited { .. } => ErrorKind::RateLimited,
            GitRemoteError::Network(_) => ErrorKind::Network,
            GitRemoteError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Only transport-level failures are worth another attempt
    pub fn is_retryable(&self) -> bool {
        matches!(self, GitRemoteError::Network(_))
    }

    /// Builds a RateLimited error whose wait is measured from `now`
    pub fn rate_limited(resource: &str, reset_at: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        let retry_after = (reset_at - now).to_std().unwrap_or(Duration::ZERO);
        GitRemoteError::RateLimited {
            resource: resource.to_string(),
            reset_at,
            retry_after,
        }
    }
}

impl From<reqwest::Error> for GitRemoteError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            GitRemoteError::Network(format!("request timed out: {}", err))
        } else if err.is_decode() {
            GitRemoteError::Network(format!("malformed response from hosting API: {}", err))
        } else {
            GitRemoteError::Network(format!("request failed: {}", err))
        }
    }
}

pub type Result<T> = std::result::Result<T, GitRemoteError>;
