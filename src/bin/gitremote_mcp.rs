use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::time::Duration;
use tracing_subscriber::{self, EnvFilter};

use gitremote_mcp::gitremote::ClientConfig;

#[derive(Parser)]
#[command(author, version, about = "MCP server for inspecting remote GitHub repositories", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the server in stdin/stdout mode
    Stdio {
        /// Enable debug logging
        #[arg(short, long)]
        debug: bool,

        #[command(flatten)]
        client: ClientArgs,
    },
}

/// Overrides for the hosting-API client configuration
#[derive(Args, Debug, Clone)]
struct ClientArgs {
    /// GitHub API token for authentication (overrides GITREMOTE_MCP_GITHUB_TOKEN and GITHUB_TOKEN)
    #[arg(short = 't', long)]
    github_token: Option<String>,

    /// Base URL of the GitHub REST API, e.g. for GitHub Enterprise
    #[arg(long = "api-url")]
    api_url: Option<String>,

    /// Timeout for a single HTTP request in seconds
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Retries after a network failure or 5xx response
    #[arg(long)]
    max_retries: Option<u32>,

    /// Delay before the first retry in milliseconds
    #[arg(long)]
    retry_base_delay_ms: Option<u64>,

    /// Maximum number of pages followed for paginated endpoints
    #[arg(long)]
    page_cap: Option<usize>,

    /// Deepest directory level returned by get_file_tree
    #[arg(long)]
    max_tree_depth: Option<usize>,

    /// Maximum number of entries returned by get_file_tree
    #[arg(long)]
    max_tree_entries: Option<usize>,

    /// File and README content beyond this many bytes is truncated
    #[arg(long)]
    max_content_bytes: Option<usize>,
}

impl ClientArgs {
    fn into_config(self) -> ClientConfig {
        let mut config = ClientConfig::from_env().with_token_override(self.github_token);
        if let Some(api_url) = self.api_url {
            config = config.with_api_base_url(api_url);
        }
        if let Some(secs) = self.timeout_secs {
            config.request_timeout = Duration::from_secs(secs.max(1));
        }
        if let Some(max_retries) = self.max_retries {
            config.max_retries = max_retries;
        }
        if let Some(ms) = self.retry_base_delay_ms {
            config.retry_base_delay = Duration::from_millis(ms);
        }
        if let Some(page_cap) = self.page_cap {
            config.page_cap = page_cap.max(1);
        }
        if let Some(depth) = self.max_tree_depth {
            config.max_tree_depth = depth.max(1);
        }
        if let Some(entries) = self.max_tree_entries {
            config.max_tree_entries = entries.max(1);
        }
        if let Some(bytes) = self.max_content_bytes {
            config.max_content_bytes = bytes.max(1);
        }
        config
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Stdio { debug, client } => run_stdio_server(debug, client).await,
    }
}

async fn run_stdio_server(debug: bool, client: ClientArgs) -> Result<()> {
    // Initialize the tracing subscriber with stderr logging; stdout carries the protocol
    let level = if debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false)
        .init();

    tracing::info!("Starting gitremote MCP server in STDIN/STDOUT mode");
    if client.github_token.is_some() {
        tracing::info!("Using GitHub token from command line arguments");
    }

    let config = client.into_config();
    tracing::info!("{} ({})", config.auth_status(), config.api_base_url);

    gitremote_mcp::transport::stdio::run_stdio_server(config)
        .await
        .map_err(|e| anyhow::anyhow!("Error running STDIO server: {}", e))
}
