use anyhow::Result;
use clap::{Parser, Subcommand};
use serde_json::{json, Map, Value};
use tracing_subscriber::{self, EnvFilter};

use gitremote_mcp::gitremote::ClientConfig;
use gitremote_mcp::tools::{ProtocolHandler, ToolName, ToolRequest, ToolResult};

#[derive(Parser)]
#[command(author, version, about = "GitRemote CLI for inspecting GitHub repositories", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// GitHub API token for authentication (overrides GITREMOTE_MCP_GITHUB_TOKEN and GITHUB_TOKEN)
    #[arg(short = 't', long, global = true)]
    github_token: Option<String>,

    /// Base URL of the GitHub REST API
    #[arg(long = "api-url", global = true)]
    api_url: Option<String>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List tags, newest semantic version first
    Tags {
        /// Repository URL or owner/name
        url: String,

        /// Number of newest tags to print
        #[arg(short, long)]
        limit: Option<i64>,
    },
    /// List the files of a repository
    Tree {
        /// Repository URL or owner/name
        url: String,

        /// Branch, tag or commit (default branch when omitted)
        #[arg(short = 'r', long = "ref")]
        ref_name: Option<String>,

        /// Print a nested tree instead of a flat list
        #[arg(long)]
        hierarchical: bool,

        /// Deepest directory level to include
        #[arg(long)]
        max_depth: Option<usize>,

        /// Directory to list instead of the repository root
        #[arg(short, long)]
        path: Option<String>,
    },
    /// Print the content of one file
    File {
        /// Repository URL or owner/name
        url: String,

        /// Path of the file relative to the repository root
        path: String,

        /// Branch, tag or commit (default branch when omitted)
        #[arg(short = 'r', long = "ref")]
        ref_name: Option<String>,
    },
    /// Print the README
    Readme {
        /// Repository URL or owner/name
        url: String,

        /// Branch, tag or commit (default branch when omitted)
        #[arg(short = 'r', long = "ref")]
        ref_name: Option<String>,
    },
    /// List the commits between two tags, oldest first
    Changelog {
        /// Repository URL or owner/name
        url: String,

        /// Older tag, branch or commit
        start_tag: String,

        /// Newer tag, branch or commit
        end_tag: String,
    },
    /// Search code in the repository (requires a token)
    Search {
        /// Repository URL or owner/name
        url: String,

        /// GitHub code search query
        query: String,

        /// Maximum number of matches
        #[arg(short, long)]
        limit: Option<usize>,
    },
}

impl Commands {
    /// The tool this command runs and its arguments, as an MCP client would send them
    fn into_request(self) -> ToolRequest {
        let (tool, arguments) = match self {
            Commands::Tags { url, limit } => (ToolName::GetTags, json!({"url": url, "limit": limit})),
            Commands::Tree {
                url,
                ref_name,
                hierarchical,
                max_depth,
                path,
            } => (
                ToolName::GetFileTree,
                json!({
                    "url": url,
                    "ref": ref_name,
                    "hierarchical": hierarchical,
                    "max_depth": max_depth,
                    "path": path,
                }),
            ),
            Commands::File {
                url,
                path,
                ref_name,
            } => (
                ToolName::GetFileContent,
                json!({"url": url, "path": path, "ref": ref_name}),
            ),
            Commands::Readme { url, ref_name } => {
                (ToolName::GetReadme, json!({"url": url, "ref": ref_name}))
            }
            Commands::Changelog {
                url,
                start_tag,
                end_tag,
            } => (
                ToolName::GetChangelog,
                json!({"url": url, "start_tag": start_tag, "end_tag": end_tag}),
            ),
            Commands::Search { url, query, limit } => (
                ToolName::SearchRepository,
                json!({"url": url, "query": query, "limit": limit}),
            ),
        };

        // absent optional flags are left out rather than sent as null
        let arguments: Map<String, Value> = arguments
            .as_object()
            .map(|map| {
                map.iter()
                    .filter(|(_, value)| !value.is_null())
                    .map(|(key, value)| (key.clone(), value.clone()))
                    .collect()
            })
            .unwrap_or_default();
        ToolRequest::new(tool.to_string(), arguments)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let level = if cli.debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_writer(std::io::stderr) // Use stderr for logging
        .with_target(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    let mut config = ClientConfig::from_env().with_token_override(cli.github_token.clone());
    if let Some(api_url) = cli.api_url.clone() {
        config = config.with_api_base_url(api_url);
    }
    tracing::debug!("{}", config.auth_status());

    let handler = ProtocolHandler::from_config(config)?;
    let request = cli.command.into_request();
    let result = handler.handle(request).await;

    println!("{}", serde_json::to_string_pretty(&result.to_json())?);
    match result {
        ToolResult::Success(_) => Ok(()),
        ToolResult::Failure(failure) => {
            anyhow::bail!("{}: {}", failure.kind, failure.message)
        }
    }
}
