//! MCP server command implementation.
//!
//! Starts an MCP server on stdio for AI assistant integration.

use moveflow_chain::AptosConfig;
use moveflow_mcp::{run_server, McpServerConfig};
use tracing::info;

use crate::error::{CliError, CliResult};

/// Start the MCP server.
///
/// Blocks until the client disconnects.
pub async fn mcp_server(aptos: AptosConfig) -> CliResult<String> {
    if aptos.private_key.is_none() {
        return Err(CliError::config(
            "APTOS_PRIVATE_KEY is required to run the MCP server",
        ));
    }

    info!(
        network = %aptos.network,
        node_url = %aptos.node_url(),
        "Starting MCP server"
    );

    run_server(McpServerConfig { aptos })
        .await
        .map_err(|e| CliError::user(format!("MCP server error: {}", e)))?;

    Ok("MCP server stopped.".to_string())
}
