//! MCP tool layer
//!
//! - [`params`]: typed arguments, the source of each tool's input schema
//! - [`registry`]: the closed set of tools and argument validation
//! - [`protocol`]: request handling that never fails the session
//! - [`responses`]: success payloads
//! - [`server`]: the rmcp `ServerHandler` bridge

pub mod params;
pub mod protocol;
pub mod registry;
pub mod responses;
pub mod server;

pub use protocol::{ProtocolHandler, ToolFailure, ToolRequest, ToolResult};
pub use registry::{ToolCall, ToolDefinition, ToolName, ToolRegistry};
pub use server::GitRemoteTools;
