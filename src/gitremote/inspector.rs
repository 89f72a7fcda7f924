//! Repository inspection operations
//!
//! One async operation per tool. Each composes the reference, semver, tree and
//! changelog helpers with the [`GithubClient`] and returns a domain value; the
//! tool layer turns those values into response payloads.

use serde::Serialize;
use std::time::Instant;

use super::changelog::{self, Changelog};
use super::error::{GitRemoteError, Result};
use super::github::models::{GithubCodeSearchResponse, GithubTag, GithubTree};
use super::github::{ApiResponse, GithubClient, MEDIA_JSON, MEDIA_TEXT_MATCH};
use super::reference::RepoRef;
use super::semver::{self as tag_order, ParsedTag};
use super::tree::{self, TreeEntry, TreeListing, TreeOptions};

/// Result count used by code search when the caller gives none
pub const DEFAULT_SEARCH_LIMIT: usize = 30;

/// Largest result count code search returns
pub const MAX_SEARCH_LIMIT: usize = 100;

/// Tags of a repository, newest SemVer first
#[derive(Debug, Clone)]
pub struct TagList {
    pub tags: Vec<ParsedTag>,
    /// Number of tags upstream before the limit was applied
    pub total: usize,
    /// The page cap stopped the listing; `latest` and the order cover only the tags read
    pub truncated: bool,
    /// Highest version without pre-release identifiers
    pub latest: Option<String>,
    pub unparsed_count: usize,
}

#[derive(Debug, Clone)]
pub struct FileTree {
    /// Ref the tree was read at, `HEAD` for the default branch
    pub ref_name: String,
    /// Subtree root when a path filter was given
    pub root: Option<String>,
    pub listing: TreeListing,
    /// GitHub itself cut the recursive listing short
    pub upstream_truncated: bool,
}

/// Text content of one file or the README
#[derive(Debug, Clone)]
pub struct FileContent {
    pub path: String,
    pub ref_name: Option<String>,
    pub content: String,
    /// Size in bytes of the full upstream content
    pub size: usize,
    pub is_truncated: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct CodeMatch {
    pub path: String,
    /// First matching fragment, when the API returned one
    pub snippet: Option<String>,
    pub html_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CodeSearch {
    pub query: String,
    pub total_count: u64,
    pub incomplete_results: bool,
    pub matches: Vec<CodeMatch>,
}

/// Cuts `content` to at most `max_bytes` on a char boundary
///
/// Returns the kept text and whether anything was cut.
pub fn truncate_content(content: &str, max_bytes: usize) -> (String, bool) {
    if content.len() <= max_bytes {
        return (content.to_string(), false);
    }
    let mut end = max_bytes;
    while !content.is_char_boundary(end) {
        end -= 1;
    }
    (content[..end].to_string(), true)
}

/// Percent-encodes each segment of a repository path, keeping the slashes
fn encode_path(path: &str) -> String {
    path.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// Runs the per-tool operations against one hosting-API client
#[derive(Clone)]
pub struct RepositoryInspector {
    client: GithubClient,
}

impl RepositoryInspector {
    pub fn new(client: GithubClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &GithubClient {
        &self.client
    }

    /// Lists every tag and orders them newest SemVer first
    ///
    /// `limit` truncates after sorting when present and positive.
    pub async fn tags(&self, repo: &RepoRef, limit: Option<i64>) -> Result<TagList> {
        let started = Instant::now();
        let path = format!("{}/tags", repo.api_path());
        let listing = self
            .client
            .get_paginated(&path, &[], MEDIA_JSON, None, |body| {
                let page: Vec<GithubTag> = serde_json::from_value(body).map_err(|e| {
                    GitRemoteError::Network(format!("malformed response from hosting API: {}", e))
                })?;
                Ok(page.into_iter().map(|tag| tag.name).collect())
            })
            .await?;

        let total = listing.items.len();
        let sorted = tag_order::sort_parsed_descending(
            listing.items.into_iter().map(ParsedTag::new).collect(),
            None,
        );
        let latest = tag_order::latest_stable(&sorted).map(|tag| tag.raw.clone());
        let unparsed_count = sorted.iter().filter(|tag| !tag.is_semver()).count();
        let tags = tag_order::sort_parsed_descending(sorted, limit);

        tracing::debug!(
            "Listed {} tags of {} in {:?}",
            total,
            repo.full_name(),
            started.elapsed()
        );
        Ok(TagList {
            tags,
            total,
            truncated: listing.truncated,
            latest,
            unparsed_count,
        })
    }

    /// Reads the recursive tree at the repository's ref
    ///
    /// `max_depth` may lower but never raise the configured depth bound.
    pub async fn file_tree(
        &self,
        repo: &RepoRef,
        max_depth: Option<usize>,
        path: Option<&str>,
    ) -> Result<FileTree> {
        let config = self.client.config();
        if max_depth == Some(0) {
            return Err(GitRemoteError::Validation(
                "max_depth must be at least 1".to_string(),
            ));
        }

        let ref_name = repo.ref_or_head().to_string();
        let api_path = format!(
            "{}/git/trees/{}",
            repo.api_path(),
            urlencoding::encode(&ref_name)
        );
        let upstream: GithubTree = self
            .client
            .get_json(&api_path, &[("recursive", "1")])
            .await?;
        if upstream.truncated {
            tracing::warn!(
                "GitHub truncated the recursive tree of {} at {}",
                repo.full_name(),
                ref_name
            );
        }

        let root = path
            .map(|p| p.trim_matches('/').to_string())
            .filter(|p| !p.is_empty());
        let options = TreeOptions {
            max_depth: max_depth
                .unwrap_or(config.max_tree_depth)
                .min(config.max_tree_depth),
            max_entries: config.max_tree_entries,
            path_prefix: root.clone(),
        };

        let entries = tree::normalize(
            upstream
                .tree
                .into_iter()
                .filter_map(TreeEntry::from_item)
                .collect(),
        );
        let listing = tree::build_listing(entries, &options);

        if let Some(root) = &root {
            if !listing.root_found {
                return Err(GitRemoteError::NotFound(format!(
                    "directory '{}' not found in {} at {}",
                    root,
                    repo.full_name(),
                    ref_name
                )));
            }
        }

        Ok(FileTree {
            ref_name,
            root,
            listing,
            upstream_truncated: upstream.truncated,
        })
    }

    /// Reads one file as text
    ///
    /// # Errors
    ///
    /// ValidationError when `path` is empty or names a directory.
    pub async fn file_content(&self, repo: &RepoRef, path: &str) -> Result<FileContent> {
        let clean_path = path.trim().trim_matches('/');
        if clean_path.is_empty() {
            return Err(GitRemoteError::Validation(
                "path must name a file".to_string(),
            ));
        }

        let api_path = format!("{}/contents/{}", repo.api_path(), encode_path(clean_path));
        let query: Vec<(&str, &str)> = repo
            .ref_name
            .as_deref()
            .map(|r| vec![("ref", r)])
            .unwrap_or_default();
        let response = self.client.get_raw(&api_path, &query).await?;

        if is_directory_listing(&response) {
            return Err(GitRemoteError::Validation(format!(
                "'{}' is a directory, use get_file_tree to list it",
                clean_path
            )));
        }

        Ok(self.content(clean_path.to_string(), repo.ref_name.clone(), &response.body))
    }

    /// Reads the repository's README as text
    pub async fn readme(&self, repo: &RepoRef) -> Result<FileContent> {
        let api_path = format!("{}/readme", repo.api_path());
        let query: Vec<(&str, &str)> = repo
            .ref_name
            .as_deref()
            .map(|r| vec![("ref", r)])
            .unwrap_or_default();
        let response = self.client.get_raw(&api_path, &query).await?;
        Ok(self.content("README".to_string(), repo.ref_name.clone(), &response.body))
    }

    /// Commits between two refs, oldest first
    pub async fn changelog(&self, repo: &RepoRef, start: &str, end: &str) -> Result<Changelog> {
        for (name, value) in [("start_tag", start), ("end_tag", end)] {
            if value.trim().is_empty() {
                return Err(GitRemoteError::Validation(format!("{} must not be empty", name)));
            }
        }
        changelog::changelog(&self.client, repo, start.trim(), end.trim()).await
    }

    /// Searches code in the repository's default branch
    pub async fn search_code(&self, repo: &RepoRef, query: &str, limit: Option<usize>) -> Result<CodeSearch> {
        let query = query.trim();
        if query.is_empty() {
            return Err(GitRemoteError::Validation(
                "query must not be empty".to_string(),
            ));
        }
        let limit = limit.unwrap_or(DEFAULT_SEARCH_LIMIT);
        if limit == 0 {
            return Err(GitRemoteError::Validation(
                "limit must be at least 1".to_string(),
            ));
        }
        let limit = limit.min(MAX_SEARCH_LIMIT);
        if !self.client.config().is_authenticated() {
            tracing::warn!("Code search without a token; GitHub will most likely reject it");
        }

        let qualified = format!("{} repo:{}", query, repo.full_name());
        let per_page = u8::try_from(limit).unwrap_or(100);
        let mut pages = self.client.pages_sized(
            "/search/code",
            &[("q", qualified.as_str())],
            MEDIA_TEXT_MATCH,
            per_page,
        )?;

        let mut totals: Option<(u64, bool)> = None;
        let mut matches = Vec::new();
        while let Some(page) = pages.next_page().await {
            let response: GithubCodeSearchResponse =
                serde_json::from_value(page?.body).map_err(|e| {
                    GitRemoteError::Network(format!("malformed response from hosting API: {}", e))
                })?;
            totals.get_or_insert((response.total_count, response.incomplete_results));
            matches.extend(response.items.into_iter().map(|item| CodeMatch {
                snippet: item.text_matches.into_iter().find_map(|m| m.fragment),
                path: item.path,
                html_url: item.html_url,
            }));
            if matches.len() >= limit {
                break;
            }
        }
        matches.truncate(limit);

        let (total_count, incomplete_results) = totals.unwrap_or((0, false));
        Ok(CodeSearch {
            query: query.to_string(),
            total_count,
            incomplete_results,
            matches,
        })
    }

    fn content(&self, path: String, ref_name: Option<String>, body: &str) -> FileContent {
        let (content, is_truncated) = truncate_content(body, self.client.config().max_content_bytes);
        if is_truncated {
            tracing::debug!("Truncated {} from {} bytes", path, body.len());
        }
        FileContent {
            path,
            ref_name,
            content,
            size: body.len(),
            is_truncated,
        }
    }
}

/// The contents endpoint answers a directory path with a JSON array, even when raw content was requested
fn is_directory_listing(response: &ApiResponse) -> bool {
    response
        .content_type()
        .is_some_and(|ct| ct.starts_with("application/json"))
        && response.body.trim_start().starts_with('[')
}
