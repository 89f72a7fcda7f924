//! Runtime configuration for the hosting-API client
//!
//! ## Authentication
//!
//! The access token is read once at startup, in this order of precedence:
//!
//! 1. The `--github-token` command line argument
//! 2. The `GITREMOTE_MCP_GITHUB_TOKEN` environment variable
//! 3. The `GITHUB_TOKEN` environment variable
//!
//! Without a token the client runs anonymously:
//! - Without token: 60 requests/hour, code search unavailable
//! - With token: 5,000 requests/hour
//!
//! The remaining fields are tuning parameters, not semantic contracts.

use std::time::Duration;

/// Primary environment variable holding the GitHub access token
pub const TOKEN_ENV_VAR: &str = "GITREMOTE_MCP_GITHUB_TOKEN";

/// Fallback environment variable holding the GitHub access token
pub const FALLBACK_TOKEN_ENV_VAR: &str = "GITHUB_TOKEN";

pub const DEFAULT_API_BASE_URL: &str = "https://api.github.com";

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the REST API, without trailing slash
    pub api_base_url: String,

    /// Access token sent as a bearer credential when present
    pub github_token: Option<String>,

    /// Sent as the User-Agent header, which GitHub requires
    pub user_agent: String,

    /// Upper bound for a single HTTP exchange, including reading the body
    pub request_timeout: Duration,

    /// Additional attempts after a NetworkError
    pub max_retries: u32,

    /// Delay before the first retry; doubled on each subsequent attempt
    pub retry_base_delay: Duration,

    /// Backoff never waits longer than this
    pub retry_max_delay: Duration,

    /// Maximum number of pages followed for any paginated endpoint
    pub page_cap: usize,

    /// Page size requested from paginated endpoints (GitHub caps it at 100)
    pub per_page: u8,

    /// Deepest path level returned by the file tree tool
    pub max_tree_depth: usize,

    /// Maximum number of entries returned by the file tree tool
    pub max_tree_entries: usize,

    /// File and README content beyond this many bytes is truncated
    pub max_content_bytes: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            github_token: None,
            user_agent: format!(
                "gitremote-mcp/{} (https://github.com/tacogips/gitremote-mcp)",
                env!("CARGO_PKG_VERSION")
            ),
            request_timeout: Duration::from_secs(30),
            max_retries: 2,
            retry_base_delay: Duration::from_millis(500),
            retry_max_delay: Duration::from_secs(8),
            page_cap: 10,
            per_page: 100,
            max_tree_depth: 10,
            max_tree_entries: 1000,
            max_content_bytes: 30_000,
        }
    }
}

impl ClientConfig {
    /// Default configuration with the token taken from the environment
    pub fn from_env() -> Self {
        Self {
            github_token: token_from_env(),
            ..Self::default()
        }
    }

    /// Replaces the token when one is given explicitly, keeping the environment value otherwise
    pub fn with_token_override(mut self, token: Option<String>) -> Self {
        if let Some(token) = token.filter(|t| !t.trim().is_empty()) {
            self.github_token = Some(token);
        }
        self
    }

    pub fn with_api_base_url(mut self, api_base_url: impl Into<String>) -> Self {
        self.api_base_url = api_base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn is_authenticated(&self) -> bool {
        self.github_token.is_some()
    }

    /// Human-readable authentication status for server instructions and logs
    pub fn auth_status(&self) -> &'static str {
        if self.is_authenticated() {
            "Authenticated with GitHub token"
        } else {
            "Not authenticated (rate limits apply, code search unavailable)"
        }
    }
}

fn token_from_env() -> Option<String> {
    [TOKEN_ENV_VAR, FALLBACK_TOKEN_ENV_VAR]
        .iter()
        .filter_map(|name| std::env::var(name).ok())
        .map(|value| value.trim().to_string())
        .find(|value| !value.is_empty())
}
