//! Tree representation for remote repository directory structures
//!
//! The recursive tree endpoint returns every path of a commit as one flat
//! list. This module normalizes that list into [`TreeEntry`] values, applies
//! the depth, entry-count and subtree limits, and optionally nests the result
//! into [`TreeNode`]s grouped by parent directory.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use super::github::models::GithubTreeItem;

/// Kind of a repository entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Directory,
    /// A gitlink pointing at a commit of another repository
    Submodule,
}

/// One path in a repository tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeEntry {
    /// Slash-separated path relative to the repository root
    pub path: String,
    pub kind: EntryKind,
    /// Size in bytes, files only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

impl TreeEntry {
    pub fn directory(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind: EntryKind::Directory,
            size: None,
        }
    }

    pub fn file(path: impl Into<String>, size: u64) -> Self {
        Self {
            path: path.into(),
            kind: EntryKind::File,
            size: Some(size),
        }
    }

    /// Converts an API item, skipping object types this crate does not know
    pub fn from_item(item: GithubTreeItem) -> Option<Self> {
        let kind = match item.item_type.as_str() {
            "blob" => EntryKind::File,
            "tree" => EntryKind::Directory,
            "commit" => EntryKind::Submodule,
            other => {
                tracing::debug!("Skipping tree item '{}' of type '{}'", item.path, other);
                return None;
            }
        };
        let size = if kind == EntryKind::File { item.size } else { None };
        Some(Self {
            path: item.path,
            kind,
            size,
        })
    }

    /// Last path segment
    pub fn name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }

    /// Path of the containing directory, empty at the root
    pub fn parent(&self) -> &str {
        self.path.rsplit_once('/').map(|(parent, _)| parent).unwrap_or("")
    }

    /// Number of path segments; top-level entries have depth 1
    pub fn depth(&self) -> usize {
        self.path.split('/').count()
    }
}

/// Limits applied when listing a tree
#[derive(Debug, Clone)]
pub struct TreeOptions {
    /// Deepest level returned, counted from the listing root (1 = direct children)
    pub max_depth: usize,
    pub max_entries: usize,
    /// Restrict the listing to the subtree under this directory
    pub path_prefix: Option<String>,
}

impl Default for TreeOptions {
    fn default() -> Self {
        Self {
            max_depth: 10,
            max_entries: 1000,
            path_prefix: None,
        }
    }
}

/// Flat listing after filtering and limits
#[derive(Debug, Clone, Serialize)]
pub struct TreeListing {
    pub entries: Vec<TreeEntry>,
    /// Entries under the listing root before depth and count limits
    pub total_count: usize,
    /// Whether any entry was left out by the depth or count limit
    pub truncated: bool,
    /// Whether `path_prefix` named a directory present in the tree
    pub root_found: bool,
}

/// Directory-grouped form of a listing
#[derive(Debug, Clone, Serialize)]
pub struct TreeNode {
    pub name: String,
    pub path: String,
    pub kind: EntryKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<TreeNode>,
}

/// Adds directory entries for every ancestor missing from the list and sorts by path
///
/// Sorting by path guarantees a directory precedes everything under it.
pub fn normalize(mut entries: Vec<TreeEntry>) -> Vec<TreeEntry> {
    let known: BTreeSet<String> = entries.iter().map(|e| e.path.clone()).collect();
    let mut missing = BTreeSet::new();

    for entry in &entries {
        let mut parent = entry.parent();
        while !parent.is_empty() && !known.contains(parent) {
            missing.insert(parent.to_string());
            parent = parent.rsplit_once('/').map(|(p, _)| p).unwrap_or("");
        }
    }

    entries.extend(missing.into_iter().map(TreeEntry::directory));
    entries.sort_by(|a, b| a.path.cmp(&b.path));
    entries.dedup_by(|a, b| a.path == b.path);
    entries
}

/// Applies the subtree filter, depth bound and entry cap to a normalized list
pub fn build_listing(entries: Vec<TreeEntry>, options: &TreeOptions) -> TreeListing {
    let prefix = options
        .path_prefix
        .as_deref()
        .map(|p| p.trim_matches('/'))
        .filter(|p| !p.is_empty());

    let (root_found, base_depth) = match prefix {
        Some(prefix) => (
            entries
                .iter()
                .any(|e| e.path == prefix && e.kind == EntryKind::Directory),
            prefix.split('/').count(),
        ),
        None => (true, 0),
    };

    let in_subtree: Vec<TreeEntry> = match prefix {
        Some(prefix) => {
            let dir = format!("{}/", prefix);
            entries
                .into_iter()
                .filter(|e| e.path.starts_with(&dir))
                .collect()
        }
        None => entries,
    };

    let total_count = in_subtree.len();
    let max_depth = options.max_depth.max(1);
    let mut truncated = false;
    let mut kept = Vec::with_capacity(total_count.min(options.max_entries));

    for entry in in_subtree {
        if entry.depth() - base_depth > max_depth {
            truncated = true;
            continue;
        }
        if kept.len() >= options.max_entries {
            truncated = true;
            break;
        }
        kept.push(entry);
    }

    TreeListing {
        entries: kept,
        total_count,
        truncated,
        root_found,
    }
}

/// Groups a listing by parent directory
///
/// `root` is the directory whose children form the top level; `None` for the
/// repository root. Entries whose parent is not in the listing are dropped,
/// which cannot happen for output of [`build_listing`] over a normalized list.
pub fn nest(entries: &[TreeEntry], root: Option<&str>) -> Vec<TreeNode> {
    let mut by_parent: BTreeMap<&str, Vec<&TreeEntry>> = BTreeMap::new();
    for entry in entries {
        by_parent.entry(entry.parent()).or_default().push(entry);
    }

    fn build(parent: &str, by_parent: &BTreeMap<&str, Vec<&TreeEntry>>) -> Vec<TreeNode> {
        by_parent
            .get(parent)
            .map(|children| {
                children
                    .iter()
                    .map(|entry| TreeNode {
                        name: entry.name().to_string(),
                        path: entry.path.clone(),
                        kind: entry.kind,
                        size: entry.size,
                        children: if entry.kind == EntryKind::Directory {
                            build(&entry.path, by_parent)
                        } else {
                            Vec::new()
                        },
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    build(root.map(|r| r.trim_matches('/')).unwrap_or(""), &by_parent)
}
