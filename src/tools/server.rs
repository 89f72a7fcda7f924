//! MCP server bridge
//!
//! Implements the rmcp [`ServerHandler`] on top of the [`ProtocolHandler`]:
//! `tools/list` is answered from the registry and `tools/call` is forwarded
//! as a [`ToolRequest`]. A failed tool call is reported as an error result
//! (`isError: true`), never as a JSON-RPC error.

use rmcp::handler::server::ServerHandler;
use rmcp::model::{
    CallToolRequestParams, CallToolResult, Content, Implementation, ListToolsResult,
    PaginatedRequestParams, ServerCapabilities, ServerInfo, Tool, ToolsCapability,
};
use rmcp::service::RequestContext;
use rmcp::{ErrorData as McpError, RoleServer};

use super::protocol::{ProtocolHandler, ToolRequest, ToolResult};
use super::registry::ToolDefinition;
use crate::gitremote::config::ClientConfig;
use crate::gitremote::error::Result;

/// Repository inspection tools exposed through the MCP protocol
///
/// A thin wrapper around the [`ProtocolHandler`]; clones share the HTTP
/// client and its rate-limit state.
#[derive(Clone)]
pub struct GitRemoteTools {
    handler: ProtocolHandler,
}

impl GitRemoteTools {
    pub fn new(handler: ProtocolHandler) -> Self {
        Self { handler }
    }

    /// Creates the tools from a client configuration
    ///
    /// # Authentication
    ///
    /// The token in `config` is used as is; see
    /// [`ClientConfig::from_env`] and [`ClientConfig::with_token_override`]
    /// for how it is usually resolved.
    pub fn from_config(config: ClientConfig) -> Result<Self> {
        Ok(Self::new(ProtocolHandler::from_config(config)?))
    }

    pub fn handler(&self) -> &ProtocolHandler {
        &self.handler
    }

    fn instructions(&self) -> String {
        format!(
            "# Remote Repository Inspection MCP Server

Inspect GitHub repositories without cloning them.

## Authentication Status
{}

## Available Tools
- `get_tags`: Tags sorted by semantic version, newest first
- `get_file_tree`: Repository file listing at a ref
- `get_file_content`: Content of one file at a ref
- `get_readme`: The repository README
- `get_changelog`: Commits between two tags, oldest first
- `search_repository`: Code search within the repository (token required)

## Authentication
A token raises the rate limit from 60 to 5,000 requests/hour and enables code search.

### Option 1: Command Line Argument (highest priority)
```
gitremote-mcp stdio --github-token=your_token
```

### Option 2: Environment Variable
```
export GITREMOTE_MCP_GITHUB_TOKEN=your_github_token
```
`GITHUB_TOKEN` is used when `GITREMOTE_MCP_GITHUB_TOKEN` is not set.

## Errors
Failed calls return `{{\"error\": {{\"kind\", \"message\"}}}}`. `RateLimited` errors include `reset_at`
and `retry_after_secs`; retry after that time instead of immediately.
",
            self.handler.config().auth_status()
        )
    }
}

fn to_mcp_tool(definition: &ToolDefinition) -> Tool {
    Tool {
        name: definition.name.to_string().into(),
        title: Some(definition.title.to_string()),
        description: Some(definition.description.into()),
        input_schema: definition.input_schema.clone(),
        output_schema: None,
        annotations: None,
        icons: None,
        meta: None,
    }
}

impl ServerHandler for GitRemoteTools {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: Default::default(),
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability {
                    list_changed: Some(false),
                }),
                ..Default::default()
            },
            server_info: Implementation {
                name: env!("CARGO_PKG_NAME").to_string(),
                title: Some("GitRemote MCP".to_string()),
                version: env!("CARGO_PKG_VERSION").to_string(),
                icons: None,
                website_url: None,
            },
            instructions: Some(self.instructions()),
        }
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> std::result::Result<ListToolsResult, McpError> {
        let tools = self
            .handler
            .registry()
            .definitions()
            .iter()
            .map(to_mcp_tool)
            .collect();

        Ok(ListToolsResult {
            next_cursor: None,
            tools,
            meta: None,
        })
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParams,
        _context: RequestContext<RoleServer>,
    ) -> std::result::Result<CallToolResult, McpError> {
        let tool_request = ToolRequest::new(
            request.name.to_string(),
            request.arguments.unwrap_or_default(),
        );
        let result = self.handler.handle(tool_request).await;

        let text = serde_json::to_string_pretty(&result.to_json()).unwrap_or_default();
        Ok(match result {
            ToolResult::Success(_) => CallToolResult::success(vec![Content::text(text)]),
            ToolResult::Failure(_) => CallToolResult::error(vec![Content::text(text)]),
        })
    }
}
