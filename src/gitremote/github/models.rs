//! GitHub-specific response shapes
//!
//! Only the fields the tools read are declared. Optional fields use
//! `Option`/`#[serde(default)]`; a missing required field fails
//! deserialization, which the client reports as a malformed upstream response.

use serde::Deserialize;

/// Item of `GET /repos/{owner}/{repo}/tags`
#[derive(Debug, Clone, Deserialize)]
pub struct GithubTag {
    pub name: String,
}

/// Response of `GET /repos/{owner}/{repo}/git/trees/{ref}?recursive=1`
#[derive(Debug, Clone, Deserialize)]
pub struct GithubTree {
    pub sha: String,
    pub tree: Vec<GithubTreeItem>,
    /// Set by GitHub when the recursive listing exceeded its own limits
    #[serde(default)]
    pub truncated: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GithubTreeItem {
    pub path: String,
    /// `blob`, `tree` or `commit` (submodule)
    #[serde(rename = "type")]
    pub item_type: String,
    #[serde(default)]
    pub size: Option<u64>,
}

/// Item of the compare endpoint's `commits` array, also the body of `GET /commits/{ref}`
#[derive(Debug, Clone, Deserialize)]
pub struct GithubCommit {
    pub sha: String,
    #[serde(default)]
    pub html_url: Option<String>,
    pub commit: GithubCommitDetail,
    /// GitHub account of the author; null when the email is not linked to an account
    #[serde(default)]
    pub author: Option<GithubUser>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GithubCommitDetail {
    pub message: String,
    #[serde(default)]
    pub author: Option<GithubGitActor>,
    #[serde(default)]
    pub committer: Option<GithubGitActor>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GithubGitActor {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GithubUser {
    pub login: String,
}

/// Response of `GET /repos/{owner}/{repo}/compare/{base}...{head}`
#[derive(Debug, Clone, Deserialize)]
pub struct GithubComparison {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub ahead_by: Option<u64>,
    #[serde(default)]
    pub behind_by: Option<u64>,
    #[serde(default)]
    pub total_commits: Option<u64>,
    pub commits: Vec<GithubCommit>,
}

/// Response of `GET /search/code`
#[derive(Debug, Clone, Deserialize)]
pub struct GithubCodeSearchResponse {
    pub total_count: u64,
    #[serde(default)]
    pub incomplete_results: bool,
    pub items: Vec<GithubCodeSearchItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GithubCodeSearchItem {
    pub path: String,
    #[serde(default)]
    pub html_url: Option<String>,
    /// Present when requested with the `text-match` media type
    #[serde(default)]
    pub text_matches: Vec<GithubTextMatch>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GithubTextMatch {
    #[serde(default)]
    pub fragment: Option<String>,
}

/// Error body GitHub returns alongside non-2xx statuses
#[derive(Debug, Clone, Deserialize)]
pub struct GithubErrorBody {
    pub message: String,
}
