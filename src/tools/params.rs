//! Typed tool arguments
//!
//! Each struct doubles as the source of the tool's JSON input schema. A field
//! that is not an `Option` is listed as required in that schema.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct GetTagsParams {
    #[schemars(
        description = "Repository (required) - supports 'https://github.com/user/repo', 'git@github.com:user/repo.git', 'github:user/repo' or 'user/repo'. Browser URLs such as 'https://github.com/user/repo/tree/v1.2.0' also select that ref."
    )]
    pub url: String,

    #[schemars(
        description = "Number of newest tags to return (optional). Tags are sorted by semantic version, newest first; omit or pass a non-positive value to return every tag, which is long for large repositories."
    )]
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct GetFileTreeParams {
    #[schemars(
        description = "Repository (required) - supports 'https://github.com/user/repo', 'git@github.com:user/repo.git', 'github:user/repo' or 'user/repo'. Browser URLs such as 'https://github.com/user/repo/tree/v1.2.0' also select that ref."
    )]
    pub url: String,

    #[serde(rename = "ref", alias = "branch")]
    #[schemars(
        description = "Branch, tag or commit (optional, default is the repository's default branch). 'branch' is accepted as an alias."
    )]
    pub ref_name: Option<String>,

    #[schemars(
        description = "Return a nested tree grouped by directory instead of a flat list (optional, default false)."
    )]
    pub hierarchical: Option<bool>,

    #[schemars(
        description = "Deepest directory level to include, counted from the listing root (optional). Can lower but not raise the server's limit."
    )]
    pub max_depth: Option<usize>,

    #[schemars(
        description = "Directory to list instead of the repository root (optional), e.g. 'examples' or 'src/bin'."
    )]
    pub path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct GetFileContentParams {
    #[schemars(
        description = "Repository (required) - supports 'https://github.com/user/repo', 'git@github.com:user/repo.git', 'github:user/repo' or 'user/repo'. Browser URLs such as 'https://github.com/user/repo/tree/v1.2.0' also select that ref."
    )]
    pub url: String,

    #[schemars(
        description = "Path of the file relative to the repository root (required), e.g. 'src/main.rs' or 'examples/basic.rs'."
    )]
    pub path: String,

    #[serde(rename = "ref", alias = "branch")]
    #[schemars(
        description = "Branch, tag or commit (optional, e.g. 'v1.0.0'). Defaults to the repository's default branch. 'branch' is accepted as an alias."
    )]
    pub ref_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct GetReadmeParams {
    #[schemars(
        description = "Repository (required) - supports 'https://github.com/user/repo', 'git@github.com:user/repo.git', 'github:user/repo' or 'user/repo'. Browser URLs such as 'https://github.com/user/repo/tree/v1.2.0' also select that ref."
    )]
    pub url: String,

    #[serde(rename = "ref", alias = "branch")]
    #[schemars(
        description = "Branch, tag or commit to read the README at (optional). Defaults to the repository's default branch."
    )]
    pub ref_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct GetChangelogParams {
    #[schemars(
        description = "Repository (required) - supports 'https://github.com/user/repo', 'git@github.com:user/repo.git', 'github:user/repo' or 'user/repo'. Browser URLs such as 'https://github.com/user/repo/tree/v1.2.0' also select that ref."
    )]
    pub url: String,

    #[schemars(description = "Older tag, branch or commit (required), e.g. 'v1.0.0'.")]
    pub start_tag: String,

    #[schemars(description = "Newer tag, branch or commit (required), e.g. 'v1.2.0'.")]
    pub end_tag: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SearchRepositoryParams {
    #[schemars(
        description = "Repository (required) - supports 'https://github.com/user/repo', 'git@github.com:user/repo.git', 'github:user/repo' or 'user/repo'. Browser URLs such as 'https://github.com/user/repo/tree/v1.2.0' also select that ref."
    )]
    pub url: String,

    #[schemars(
        description = "Code search query (required). GitHub code search syntax is supported, e.g. 'Deserialize language:rust' or 'path:examples tokio::spawn'. The repository qualifier is added automatically."
    )]
    pub query: String,

    #[schemars(description = "Maximum number of matches to return (optional, default 30, at most 100).")]
    pub limit: Option<usize>,
}
