//! Repository reference resolution
//!
//! Turns the loosely formatted repository strings agents pass in (browser URLs,
//! clone URLs, `owner/name` shorthand) into a [`RepoRef`]. No network call
//! happens here; an unknown ref is reported later by the hosting API itself.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use url::Url;

use super::error::{GitRemoteError, Result};

/// A repository on the hosting service, optionally pinned to a ref
///
/// `ref_name` is `None` when the caller wants the repository's default branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoRef {
    /// User or organization owning the repository
    pub owner: String,
    /// Repository name, without `.git` suffix
    pub name: String,
    /// Branch, tag or commit; passed through unvalidated
    pub ref_name: Option<String>,
}

impl RepoRef {
    /// `owner/name`
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }

    /// REST path prefix for this repository, e.g. `/repos/acme/widgets`
    pub fn api_path(&self) -> String {
        format!(
            "/repos/{}/{}",
            urlencoding::encode(&self.owner),
            urlencoding::encode(&self.name)
        )
    }

    /// The ref to send upstream, `HEAD` standing in for the default branch
    pub fn ref_or_head(&self) -> &str {
        self.ref_name.as_deref().unwrap_or("HEAD")
    }
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.ref_name {
            Some(ref_name) => write!(f, "{}/{}@{}", self.owner, self.name, ref_name),
            None => write!(f, "{}/{}", self.owner, self.name),
        }
    }
}

impl FromStr for RepoRef {
    type Err = GitRemoteError;

    fn from_str(s: &str) -> Result<Self> {
        resolve_repository(s, None)
    }
}

/// Resolves a repository string plus an optional explicit ref into a [`RepoRef`]
///
/// Supported formats:
/// - `https://github.com/owner/name` (also `http://`, `ssh://`, any host)
/// - `github.com/owner/name`
/// - `git@github.com:owner/name.git`
/// - `github:owner/name`
/// - `owner/name`
///
/// Browser URLs such as `https://github.com/owner/name/tree/v1.2.0` contribute
/// their ref when `explicit_ref` is absent. An explicit ref always wins.
///
/// # Examples
///
/// ```
/// use gitremote_mcp::gitremote::reference::resolve_repository;
///
/// let repo = resolve_repository("https://github.com/acme/widgets", None).unwrap();
/// assert_eq!(repo.owner, "acme");
/// assert_eq!(repo.name, "widgets");
/// assert_eq!(repo.ref_name, None);
/// ```
pub fn resolve_repository(input: &str, explicit_ref: Option<&str>) -> Result<RepoRef> {
    let location = input.trim();
    if location.is_empty() {
        return Err(GitRemoteError::Validation(
            "repository reference is empty".to_string(),
        ));
    }

    let path = repository_path(location)?;
    let segments: Vec<&str> = path.trim_matches('/').split('/').collect();
    let segments = strip_host_segment(location, segments);

    if segments.len() < 2 {
        return Err(invalid_reference(input, "expected 'owner/name'"));
    }

    let owner = segments[0].trim();
    let name = segments[1].trim().trim_end_matches(".git");
    if owner.is_empty() {
        return Err(invalid_reference(input, "owner is empty"));
    }
    if name.is_empty() {
        return Err(invalid_reference(input, "repository name is empty"));
    }

    let ref_name = explicit_ref
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .map(String::from)
        .or_else(|| ref_from_browser_path(&segments[2..]));

    tracing::debug!(
        "Resolved repository reference '{}' -> {}/{} (ref: {:?})",
        input,
        owner,
        name,
        ref_name
    );

    Ok(RepoRef {
        owner: owner.to_string(),
        name: name.to_string(),
        ref_name,
    })
}

/// Extracts the path part of a location, dropping scheme, credentials, host, query and fragment
fn repository_path(location: &str) -> Result<String> {
    if let Some(rest) = location.strip_prefix("github:") {
        return Ok(rest.to_string());
    }

    if location.contains("://") {
        let url = Url::parse(location)
            .map_err(|e| invalid_reference(location, &format!("not a valid URL ({})", e)))?;
        return Ok(url.path().to_string());
    }

    // scp-like syntax: git@github.com:owner/name.git
    if let Some((user_host, path)) = location.split_once(':') {
        if user_host.contains('@') && !user_host.contains('/') {
            return Ok(path.to_string());
        }
    }

    Ok(location
        .split(['?', '#'])
        .next()
        .unwrap_or(location)
        .to_string())
}

/// Scheme-less input like `github.com/owner/name` still carries a host as the first segment
fn strip_host_segment<'a>(location: &str, segments: Vec<&'a str>) -> Vec<&'a str> {
    let scheme_less = !location.contains("://")
        && !location.starts_with("github:")
        && !location.contains('@');
    let has_host = scheme_less && segments.first().is_some_and(|first| first.contains('.'));
    if has_host {
        segments[1..].to_vec()
    } else {
        segments
    }
}

fn ref_from_browser_path(rest: &[&str]) -> Option<String> {
    let candidate = match rest {
        ["tree" | "blob" | "commit", ref_name, ..] => Some(*ref_name),
        ["releases", "tag", tag, ..] => Some(*tag),
        _ => None,
    };
    candidate
        .filter(|r| !r.is_empty())
        .map(|r| urlencoding::decode(r).map(|d| d.into_owned()).unwrap_or_else(|_| r.to_string()))
}

fn invalid_reference(input: &str, reason: &str) -> GitRemoteError {
    GitRemoteError::Validation(format!(
        "invalid repository reference '{}': {}",
        input, reason
    ))
}
