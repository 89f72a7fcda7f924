//! GitRemote MCP: inspect remote GitHub repositories without cloning them
//!
//! This library provides Model Context Protocol (MCP) tools that let an agent
//! look at a repository the way a developer would before adding it as a
//! dependency:
//!
//! - List tags, newest semantic version first
//! - Browse the file tree and read files at any ref
//! - Read the README
//! - List the commits between two tags
//! - Search code within the repository
//!
//! Every tool call becomes one or more calls against the GitHub REST API.
//! The client follows pagination links up to a page cap, tracks the rate-limit
//! budget reported by GitHub, and fails fast with a `RateLimited` error carrying
//! the reset time instead of blocking when that budget is exhausted.
//!
//! ## Authentication
//!
//! GitHub operations support both authenticated and unauthenticated access.
//! The token is read from the `GITREMOTE_MCP_GITHUB_TOKEN` environment
//! variable, falling back to `GITHUB_TOKEN`.
//!
//! ```bash
//! # Set GitHub token for authentication (optional)
//! export GITREMOTE_MCP_GITHUB_TOKEN=your_github_token
//! ```
//!
//! - **Requirement**: Optional for everything except code search
//! - **Rate Limits**:
//!   - Without token: 60 requests/hour (unauthenticated)
//!   - With token: 5,000 requests/hour (authenticated)
//! - **Private Repositories**: Requires token with `repo` scope
//!
//! ## Usage
//!
//! This library can be used in several ways:
//! - As an MCP server (STDIN/STDOUT mode), see the `gitremote-mcp` binary
//! - From the terminal, see the `gitremote-cli` binary
//! - Directly as a Rust library
//!
//! ```no_run
//! use gitremote_mcp::gitremote::ClientConfig;
//! use gitremote_mcp::tools::{ProtocolHandler, ToolRequest};
//! use serde_json::json;
//!
//! # async fn run() -> gitremote_mcp::gitremote::Result<()> {
//! let handler = ProtocolHandler::from_config(ClientConfig::from_env())?;
//! let arguments = json!({"url": "https://github.com/tokio-rs/tokio", "limit": 5});
//! let result = handler
//!     .handle(ToolRequest::new("get_tags", arguments.as_object().cloned().unwrap_or_default()))
//!     .await;
//! println!("{}", result.to_json());
//! # Ok(())
//! # }
//! ```

pub mod gitremote;
pub mod tools;
pub mod transport;
