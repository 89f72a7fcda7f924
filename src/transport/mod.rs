//! Transports serving the MCP tools

pub mod stdio;
