use crate::gitremote::config::ClientConfig;
use crate::tools::GitRemoteTools;
use anyhow::Result;
use rmcp::transport::stdio;
use rmcp::ServiceExt;

/// Serves the tools on stdin/stdout until the client closes the stream
pub async fn run_stdio_server(config: ClientConfig) -> Result<()> {
    let service = GitRemoteTools::from_config(config)?;

    let server = service.serve(stdio()).await?;

    server.waiting().await?;
    Ok(())
}
