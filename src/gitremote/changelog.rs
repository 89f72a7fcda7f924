//! Commits between two refs
//!
//! Both refs are resolved to commit ids first (start, then end) so that a
//! typo in either one is reported as NotFound naming the ref, instead of the
//! compare endpoint's less specific error. The commits are then read from the
//! compare endpoint and kept in API order, oldest first.

use serde::Serialize;

use super::error::{GitRemoteError, Result};
use super::github::models::{GithubCommit, GithubComparison};
use super::github::{GithubClient, MEDIA_JSON};
use super::reference::RepoRef;

/// One commit of a changelog
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitSummary {
    /// Full commit hash
    pub id: String,
    /// First line of the message
    pub summary: String,
    pub message: String,
    /// Git author name, falling back to the account login
    pub author: Option<String>,
    /// RFC 3339 author date
    pub timestamp: Option<String>,
    pub html_url: Option<String>,
}

impl From<GithubCommit> for CommitSummary {
    fn from(commit: GithubCommit) -> Self {
        let detail = commit.commit;
        let summary = detail.message.lines().next().unwrap_or("").to_string();
        let author = detail
            .author
            .as_ref()
            .and_then(|a| a.name.clone())
            .or_else(|| commit.author.map(|user| user.login));
        let timestamp = detail
            .author
            .as_ref()
            .and_then(|a| a.date.clone())
            .or_else(|| detail.committer.as_ref().and_then(|c| c.date.clone()));

        CommitSummary {
            id: commit.sha,
            summary,
            message: detail.message,
            author,
            timestamp,
            html_url: commit.html_url,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Changelog {
    pub from: String,
    pub to: String,
    pub from_commit: String,
    pub to_commit: String,
    /// `ahead`, `behind`, `diverged` or `identical`
    pub status: Option<String>,
    pub ahead_by: Option<u64>,
    pub behind_by: Option<u64>,
    /// Commit count reported upstream; may exceed `commits.len()` when paging stopped early
    pub total_commits: u64,
    pub commits: Vec<CommitSummary>,
}

/// Resolves a branch, tag or commit name to a full commit id
///
/// # Errors
///
/// NotFound naming the ref when the hosting API does not know it.
pub async fn resolve_commit(client: &GithubClient, repo: &RepoRef, reference: &str) -> Result<String> {
    let path = format!("{}/commits/{}", repo.api_path(), urlencoding::encode(reference));
    match client.get_json::<GithubCommit>(&path, &[]).await {
        Ok(commit) => Ok(commit.sha),
        // an unknown ref that is not a valid object name comes back as 422
        Err(GitRemoteError::NotFound(_)) | Err(GitRemoteError::Validation(_)) => Err(
            GitRemoteError::NotFound(format!(
                "ref '{}' not found in {}",
                reference,
                repo.full_name()
            )),
        ),
        Err(err) => Err(err),
    }
}

/// Lists the commits reachable from `end` but not from `start`, oldest first
pub async fn changelog(client: &GithubClient, repo: &RepoRef, start: &str, end: &str) -> Result<Changelog> {
    let from_commit = resolve_commit(client, repo, start).await?;
    let to_commit = resolve_commit(client, repo, end).await?;
    tracing::debug!(
        "Comparing {} ({}) with {} ({}) in {}",
        start,
        from_commit,
        end,
        to_commit,
        repo.full_name()
    );

    let path = format!("{}/compare/{}...{}", repo.api_path(), from_commit, to_commit);
    let mut pages = client.pages(&path, &[], MEDIA_JSON)?;

    let mut header: Option<GithubComparison> = None;
    let mut commits = Vec::new();
    while let Some(page) = pages.next_page().await {
        let comparison: GithubComparison = serde_json::from_value(page?.body).map_err(|e| {
            GitRemoteError::Network(format!("malformed response from hosting API: {}", e))
        })?;
        let GithubComparison {
            status,
            ahead_by,
            behind_by,
            total_commits,
            commits: page_commits,
        } = comparison;
        commits.extend(page_commits.into_iter().map(CommitSummary::from));
        if header.is_none() {
            header = Some(GithubComparison {
                status,
                ahead_by,
                behind_by,
                total_commits,
                commits: Vec::new(),
            });
        }
    }

    let header = header.unwrap_or(GithubComparison {
        status: None,
        ahead_by: None,
        behind_by: None,
        total_commits: None,
        commits: Vec::new(),
    });

    Ok(Changelog {
        from: start.to_string(),
        to: end.to_string(),
        from_commit,
        to_commit,
        status: header.status,
        ahead_by: header.ahead_by,
        behind_by: header.behind_by,
        total_commits: header.total_commits.unwrap_or(commits.len() as u64),
        commits,
    })
}
