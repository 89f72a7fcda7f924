//! Response types for the repository inspection tools
//!
//! This module defines the structured payloads returned by each tool on
//! success. Every payload starts with the `repository` it describes
//! (`owner/name`), followed by tool-specific fields. Keeping them as typed
//! structs instead of ad-hoc `json!` values keeps field names stable across
//! releases.
//!
//! # Response Types Overview
//!
//! - [`TagsResponse`]: tags newest SemVer first
//! - [`FileTreeResponse`]: flat `entries` or nested `tree`
//! - [`FileContentResponse`] / [`ReadmeResponse`]: text content with truncation flag
//! - [`ChangelogResponse`]: commits between two refs, oldest first
//! - [`SearchResponse`]: code search matches with snippets

use serde::Serialize;

use crate::gitremote::changelog::{Changelog, CommitSummary};
use crate::gitremote::inspector::{CodeMatch, CodeSearch, FileContent, FileTree, TagList};
use crate::gitremote::reference::RepoRef;
use crate::gitremote::tree::{self, TreeEntry, TreeNode};

/// Response for the get_tags tool
///
/// # Format
///
/// ```json
/// {
///   "repository": "tokio-rs/tokio",
///   "count": 3,
///   "total_count": 41,
///   "truncated": false,
///   "limit_applied": 3,
///   "latest": "v1.38.0",
///   "unparsed_count": 0,
///   "tags": ["v2.0.0-beta.1", "v1.38.0", "v1.37.0"]
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct TagsResponse {
    pub repository: String,
    /// Number of tags in `tags`
    pub count: usize,
    /// Number of tags read before the limit was applied
    pub total_count: usize,
    /// The page cap stopped the listing before every tag was read
    pub truncated: bool,
    pub limit_applied: Option<i64>,
    /// Highest version without pre-release identifiers, across all tags
    pub latest: Option<String>,
    /// Tags that are not semantic versions; they trail the list
    pub unparsed_count: usize,
    pub tags: Vec<String>,
}

impl TagsResponse {
    pub fn new(repo: &RepoRef, limit: Option<i64>, list: TagList) -> Self {
        let tags: Vec<String> = list.tags.into_iter().map(|tag| tag.raw).collect();
        Self {
            repository: repo.full_name(),
            count: tags.len(),
            total_count: list.total,
            truncated: list.truncated,
            limit_applied: limit.filter(|l| *l > 0),
            latest: list.latest,
            unparsed_count: list.unparsed_count,
            tags,
        }
    }
}

/// Response for the get_file_tree tool
///
/// Exactly one of `entries` (flat, the default) and `tree` (hierarchical) is present.
#[derive(Debug, Clone, Serialize)]
pub struct FileTreeResponse {
    pub repository: String,
    #[serde(rename = "ref")]
    pub ref_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Entries under the listing root before limits
    pub total_count: usize,
    pub returned_count: usize,
    /// Entries were omitted by the depth or entry limit
    pub truncated: bool,
    /// GitHub cut the recursive listing short on its side
    pub upstream_truncated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entries: Option<Vec<TreeEntry>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tree: Option<Vec<TreeNode>>,
}

impl FileTreeResponse {
    pub fn new(repo: &RepoRef, file_tree: FileTree, hierarchical: bool) -> Self {
        let listing = file_tree.listing;
        let returned_count = listing.entries.len();
        let (entries, nested) = if hierarchical {
            (None, Some(tree::nest(&listing.entries, file_tree.root.as_deref())))
        } else {
            (Some(listing.entries), None)
        };

        Self {
            repository: repo.full_name(),
            ref_name: file_tree.ref_name,
            path: file_tree.root,
            total_count: listing.total_count,
            returned_count,
            truncated: listing.truncated,
            upstream_truncated: file_tree.upstream_truncated,
            entries,
            tree: nested,
        }
    }
}

/// Response for the get_file_content tool
#[derive(Debug, Clone, Serialize)]
pub struct FileContentResponse {
    pub repository: String,
    pub path: String,
    /// `null` when the default branch was read
    #[serde(rename = "ref")]
    pub ref_name: Option<String>,
    pub is_truncated: bool,
    /// Size in bytes of the complete file
    pub size: usize,
    pub content: String,
}

impl FileContentResponse {
    pub fn new(repo: &RepoRef, file: FileContent) -> Self {
        Self {
            repository: repo.full_name(),
            path: file.path,
            ref_name: file.ref_name,
            is_truncated: file.is_truncated,
            size: file.size,
            content: file.content,
        }
    }
}

/// Response for the get_readme tool
#[derive(Debug, Clone, Serialize)]
pub struct ReadmeResponse {
    pub repository: String,
    #[serde(rename = "ref")]
    pub ref_name: Option<String>,
    pub is_truncated: bool,
    pub size: usize,
    pub content: String,
}

impl ReadmeResponse {
    pub fn new(repo: &RepoRef, readme: FileContent) -> Self {
        Self {
            repository: repo.full_name(),
            ref_name: readme.ref_name,
            is_truncated: readme.is_truncated,
            size: readme.size,
            content: readme.content,
        }
    }
}

/// Response for the get_changelog tool
///
/// `commits` keeps the hosting API's order, oldest first.
#[derive(Debug, Clone, Serialize)]
pub struct ChangelogResponse {
    pub repository: String,
    pub from: String,
    pub to: String,
    pub from_commit: String,
    pub to_commit: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ahead_by: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub behind_by: Option<u64>,
    pub total_commits: u64,
    pub commits: Vec<CommitSummary>,
}

impl ChangelogResponse {
    pub fn new(repo: &RepoRef, changelog: Changelog) -> Self {
        Self {
            repository: repo.full_name(),
            from: changelog.from,
            to: changelog.to,
            from_commit: changelog.from_commit,
            to_commit: changelog.to_commit,
            status: changelog.status,
            ahead_by: changelog.ahead_by,
            behind_by: changelog.behind_by,
            total_commits: changelog.total_commits,
            commits: changelog.commits,
        }
    }
}

/// Response for the search_repository tool
#[derive(Debug, Clone, Serialize)]
pub struct SearchResponse {
    pub repository: String,
    pub query: String,
    /// Matches GitHub found, which may exceed `matches.len()`
    pub total_count: u64,
    pub incomplete_results: bool,
    pub matches: Vec<CodeMatch>,
}

impl SearchResponse {
    pub fn new(repo: &RepoRef, search: CodeSearch) -> Self {
        Self {
            repository: repo.full_name(),
            query: search.query,
            total_count: search.total_count,
            incomplete_results: search.incomplete_results,
            matches: search.matches,
        }
    }
}
