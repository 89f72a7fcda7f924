//! Tool registry
//!
//! The tool set is closed: [`ToolName`] enumerates it and [`ToolCall`] holds
//! one parsed call. [`ToolRegistry`] owns the immutable definitions built at
//! startup and turns a raw [`ToolRequest`] into a [`ToolCall`], checking
//! required arguments against each definition's schema before deserializing.

use schemars::JsonSchema;
use serde_json::{Map, Value};
use std::str::FromStr;
use std::sync::Arc;
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoEnumIterator};

use super::params::{
    GetChangelogParams, GetFileContentParams, GetFileTreeParams, GetReadmeParams, GetTagsParams,
    SearchRepositoryParams,
};
use super::protocol::ToolRequest;
use super::responses::{
    ChangelogResponse, FileContentResponse, FileTreeResponse, ReadmeResponse, SearchResponse,
    TagsResponse,
};
use crate::gitremote::error::{GitRemoteError, Result};
use crate::gitremote::inspector::RepositoryInspector;
use crate::gitremote::reference::{resolve_repository, RepoRef};

/// Names of every tool this server exposes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum ToolName {
    GetTags,
    GetFileTree,
    GetFileContent,
    GetReadme,
    GetChangelog,
    SearchRepository,
}

impl ToolName {
    pub fn title(&self) -> &'static str {
        match self {
            ToolName::GetTags => "Get Tags",
            ToolName::GetFileTree => "Get File Tree",
            ToolName::GetFileContent => "Get File Content",
            ToolName::GetReadme => "Get README",
            ToolName::GetChangelog => "Get Changelog",
            ToolName::SearchRepository => "Search Repository",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ToolName::GetTags => {
                "Call this tool BEFORE writing any dependency in Cargo.toml/package.json. Returns the repository's tags sorted by semantic version, newest first, plus the latest stable version. Use 'limit: 5' to avoid fetching old tags. Example: `{\"name\": \"get_tags\", \"arguments\": {\"url\": \"https://github.com/tokio-rs/tokio\", \"limit\": 5}}`"
            }
            ToolName::GetFileTree => {
                "Explore the repository structure without cloning it. Look for 'examples/' or 'tests/' folders to find up-to-date code patterns. Returns a flat list by default or a nested tree with 'hierarchical: true'. Example: `{\"name\": \"get_file_tree\", \"arguments\": {\"url\": \"github:serde-rs/serde\", \"ref\": \"v1.0.200\", \"path\": \"serde_derive\", \"max_depth\": 2}}`"
            }
            ToolName::GetFileContent => {
                "Read the content of a source file (especially in 'examples/'). Use this to verify API syntax and ensure the code you write matches the library version. Large files are truncated. Example: `{\"name\": \"get_file_content\", \"arguments\": {\"url\": \"https://github.com/clap-rs/clap\", \"path\": \"examples/git.rs\", \"ref\": \"v4.5.0\"}}`"
            }
            ToolName::GetReadme => {
                "Read the README to find installation instructions and basic usage examples that are compatible with the fetched version. Example: `{\"name\": \"get_readme\", \"arguments\": {\"url\": \"https://github.com/tokio-rs/axum\"}}`"
            }
            ToolName::GetChangelog => {
                "Analyze commit messages between two versions to identify breaking changes, deprecated features, or migration guides. Commits are listed oldest first. Example: `{\"name\": \"get_changelog\", \"arguments\": {\"url\": \"https://github.com/tokio-rs/tokio\", \"start_tag\": \"tokio-1.37.0\", \"end_tag\": \"tokio-1.38.0\"}}`"
            }
            ToolName::SearchRepository => {
                "Search code in the repository's default branch using GitHub code search. Requires a GitHub token. Returns matching paths with a snippet. Example: `{\"name\": \"search_repository\", \"arguments\": {\"url\": \"github:rust-lang/regex\", \"query\": \"RegexBuilder\", \"limit\": 10}}`"
            }
        }
    }

    fn input_schema(&self) -> Arc<Map<String, Value>> {
        match self {
            ToolName::GetTags => schema_for::<GetTagsParams>(),
            ToolName::GetFileTree => schema_for::<GetFileTreeParams>(),
            ToolName::GetFileContent => schema_for::<GetFileContentParams>(),
            ToolName::GetReadme => schema_for::<GetReadmeParams>(),
            ToolName::GetChangelog => schema_for::<GetChangelogParams>(),
            ToolName::SearchRepository => schema_for::<SearchRepositoryParams>(),
        }
    }
}

fn schema_for<T: JsonSchema>() -> Arc<Map<String, Value>> {
    let schema = schemars::schema_for!(T);
    match serde_json::to_value(&schema) {
        Ok(Value::Object(map)) => Arc::new(map),
        _ => Arc::new(Map::new()),
    }
}

/// Name, description and input schema of one tool
#[derive(Debug, Clone)]
pub struct ToolDefinition {
    pub name: ToolName,
    pub title: &'static str,
    pub description: &'static str,
    pub input_schema: Arc<Map<String, Value>>,
    /// Argument names listed under the schema's `required` key
    pub required: Vec<String>,
}

impl ToolDefinition {
    fn new(name: ToolName) -> Self {
        let input_schema = name.input_schema();
        let required = input_schema
            .get("required")
            .and_then(Value::as_array)
            .map(|fields| {
                fields
                    .iter()
                    .filter_map(|f| f.as_str().map(String::from))
                    .collect()
            })
            .unwrap_or_default();

        Self {
            name,
            title: name.title(),
            description: name.description(),
            input_schema,
            required,
        }
    }
}

/// A validated tool invocation
#[derive(Debug, Clone)]
pub enum ToolCall {
    GetTags(GetTagsParams),
    GetFileTree(GetFileTreeParams),
    GetFileContent(GetFileContentParams),
    GetReadme(GetReadmeParams),
    GetChangelog(GetChangelogParams),
    SearchRepository(SearchRepositoryParams),
}

impl ToolCall {
    pub fn name(&self) -> ToolName {
        match self {
            ToolCall::GetTags(_) => ToolName::GetTags,
            ToolCall::GetFileTree(_) => ToolName::GetFileTree,
            ToolCall::GetFileContent(_) => ToolName::GetFileContent,
            ToolCall::GetReadme(_) => ToolName::GetReadme,
            ToolCall::GetChangelog(_) => ToolName::GetChangelog,
            ToolCall::SearchRepository(_) => ToolName::SearchRepository,
        }
    }

    /// Runs the call and returns its success payload
    pub async fn execute(self, inspector: &RepositoryInspector) -> Result<Value> {
        match self {
            ToolCall::GetTags(params) => {
                let repo = resolve_repository(&params.url, None)?;
                let tags = inspector.tags(&repo, params.limit).await?;
                to_payload(TagsResponse::new(&repo, params.limit, tags))
            }
            ToolCall::GetFileTree(params) => {
                let repo = resolve_repository(&params.url, params.ref_name.as_deref())?;
                let tree = inspector
                    .file_tree(&repo, params.max_depth, params.path.as_deref())
                    .await?;
                to_payload(FileTreeResponse::new(
                    &repo,
                    tree,
                    params.hierarchical.unwrap_or(false),
                ))
            }
            ToolCall::GetFileContent(params) => {
                let repo = resolve_repository(&params.url, params.ref_name.as_deref())?;
                let file = inspector.file_content(&repo, &params.path).await?;
                to_payload(FileContentResponse::new(&repo, file))
            }
            ToolCall::GetReadme(params) => {
                let repo = resolve_repository(&params.url, params.ref_name.as_deref())?;
                let readme = inspector.readme(&repo).await?;
                to_payload(ReadmeResponse::new(&repo, readme))
            }
            ToolCall::GetChangelog(params) => {
                let repo = repository_only(&params.url)?;
                let changelog = inspector
                    .changelog(&repo, &params.start_tag, &params.end_tag)
                    .await?;
                to_payload(ChangelogResponse::new(&repo, changelog))
            }
            ToolCall::SearchRepository(params) => {
                let repo = repository_only(&params.url)?;
                let search = inspector.search_code(&repo, &params.query, params.limit).await?;
                to_payload(SearchResponse::new(&repo, search))
            }
        }
    }
}

/// Resolves a repository for tools that take no ref; a ref in a browser URL is ignored
fn repository_only(url: &str) -> Result<RepoRef> {
    let mut repo = resolve_repository(url, None)?;
    repo.ref_name = None;
    Ok(repo)
}

fn to_payload<T: serde::Serialize>(response: T) -> Result<Value> {
    serde_json::to_value(response)
        .map_err(|e| GitRemoteError::Internal(format!("failed to serialize response: {}", e)))
}

/// Immutable set of tool definitions
#[derive(Debug, Clone)]
pub struct ToolRegistry {
    definitions: Vec<ToolDefinition>,
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            definitions: ToolName::iter().map(ToolDefinition::new).collect(),
        }
    }

    pub fn definitions(&self) -> &[ToolDefinition] {
        &self.definitions
    }

    pub fn get(&self, name: &str) -> Option<&ToolDefinition> {
        let name = ToolName::from_str(name).ok()?;
        self.definitions.iter().find(|d| d.name == name)
    }

    /// Validates a request and parses its arguments
    ///
    /// # Errors
    ///
    /// ValidationError for an unknown tool, a missing required argument (named
    /// in the message), or an argument of the wrong type.
    pub fn parse_call(&self, request: &ToolRequest) -> Result<ToolCall> {
        let definition = self.get(&request.name).ok_or_else(|| {
            GitRemoteError::Validation(format!("unknown tool '{}'", request.name))
        })?;

        for field in &definition.required {
            if request.arguments.get(field).is_none_or(Value::is_null) {
                return Err(GitRemoteError::Validation(format!(
                    "missing required argument '{}' for tool '{}'",
                    field, definition.name
                )));
            }
        }

        let arguments = Value::Object(request.arguments.clone());
        let call = match definition.name {
            ToolName::GetTags => ToolCall::GetTags(parse_arguments(definition.name, arguments)?),
            ToolName::GetFileTree => {
                ToolCall::GetFileTree(parse_arguments(definition.name, arguments)?)
            }
            ToolName::GetFileContent => {
                ToolCall::GetFileContent(parse_arguments(definition.name, arguments)?)
            }
            ToolName::GetReadme => ToolCall::GetReadme(parse_arguments(definition.name, arguments)?),
            ToolName::GetChangelog => {
                ToolCall::GetChangelog(parse_arguments(definition.name, arguments)?)
            }
            ToolName::SearchRepository => {
                ToolCall::SearchRepository(parse_arguments(definition.name, arguments)?)
            }
        };
        Ok(call)
    }
}

fn parse_arguments<T: serde::de::DeserializeOwned>(tool: ToolName, arguments: Value) -> Result<T> {
    serde_json::from_value(arguments).map_err(|e| {
        GitRemoteError::Validation(format!("invalid arguments for tool '{}': {}", tool, e))
    })
}
