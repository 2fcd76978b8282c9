//! MCP server implementation for MoveFlow.
//!
//! Uses the RMCP SDK to expose payment-stream creation, lookup and
//! cancellation to AI assistants. Every tool answers with a JSON text block,
//! `{"success": true, ...}` on success and
//! `{"success": false, "error", "code", "message", "suggestion", ...}` on
//! failure. Errors never escape a tool call.

use rmcp::{
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::*,
    tool, tool_handler, tool_router, ErrorData as McpError,
};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use moveflow_chain::AptosConfig;
use moveflow_ops::StreamOperations;

use crate::error::{McpError as MoveflowMcpError, McpResult};
use crate::tools::{
    AccountStreamsInput, BatchCreateStreamInput, StatusOutput, StreamIdInput, StreamOutput,
    WalletBalanceInput,
};

/// Create a standardized error response for MCP tools.
///
/// Returns a JSON-formatted error with error code, message, recovery
/// suggestion and any error-specific details.
fn tool_error(error: &MoveflowMcpError) -> CallToolResult {
    let code = error.error_code();
    let mut response = Map::new();
    response.insert("success".into(), Value::Bool(false));
    response.insert("error".into(), Value::String(code.to_string()));
    response.insert("code".into(), Value::from(code.code()));
    response.insert("message".into(), Value::String(error.to_string()));
    response.insert("suggestion".into(), Value::String(error.suggestion().to_string()));
    response.extend(error.details());
    CallToolResult::error(vec![Content::text(Value::Object(response).to_string())])
}

/// Wrap a serializable result in the success envelope.
fn success_json<T: Serialize>(value: &T) -> McpResult<String> {
    let mut response = Map::new();
    response.insert("success".into(), Value::Bool(true));
    match serde_json::to_value(value)? {
        Value::Object(fields) => response.extend(fields),
        other => {
            response.insert("result".into(), other);
        }
    }
    Ok(serde_json::to_string_pretty(&Value::Object(response))?)
}

/// Turn an operation outcome into a tool result.
fn respond<T: Serialize>(tool: &str, result: McpResult<T>) -> CallToolResult {
    match result.and_then(|value| success_json(&value)) {
        Ok(json) => CallToolResult::success(vec![Content::text(json)]),
        Err(e) => {
            warn!(tool, error = %e, "Tool call failed");
            tool_error(&e)
        }
    }
}

/// Configuration for the MCP server.
#[derive(Debug, Clone, Default)]
pub struct McpServerConfig {
    /// Chain and query configuration.
    pub aptos: AptosConfig,
}

/// MoveFlow MCP Server.
///
/// Implements the MCP server handler with the stream tools. Holds no
/// per-session state; each call runs against the shared operations.
#[derive(Clone)]
pub struct MoveflowMcpServer {
    /// Stream operations instance.
    ops: StreamOperations,
    /// Tool router for MCP.
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl MoveflowMcpServer {
    /// Create a server over existing operations.
    pub fn new(ops: StreamOperations) -> Self {
        Self {
            ops,
            tool_router: Self::tool_router(),
        }
    }

    /// Create a server backed by the node REST API.
    ///
    /// Submitting tools need a signing key, so the server refuses to start
    /// without one.
    pub fn from_config(config: McpServerConfig) -> McpResult<Self> {
        let aptos = config.aptos;
        if aptos
            .private_key
            .as_deref()
            .map_or(true, |k| k.trim().is_empty())
        {
            return Err(MoveflowMcpError::config(
                "APTOS_PRIVATE_KEY is required to run the MCP server",
            ));
        }
        aptos.validate()?;

        let ops = StreamOperations::from_config(aptos)?;
        info!(
            network = %ops.config().network,
            contract = %ops.config().contract_address(),
            account = ?ops.current_address(),
            "MoveFlow operations ready"
        );
        Ok(Self::new(ops))
    }

    /// Create one payment stream per recipient.
    #[tool(
        description = "Create MoveFlow payment streams in one transaction, one per recipient (up to 200). Amounts are decimal strings per recipient; duration is in seconds. Optional: token_type (APT, USDC, USDT or full coin type), names, interval, start_delay, cliff_time_enabled, pauseable/closeable/recipient_modifiable (sender, recipient, both, none), remark."
    )]
    async fn batch_create_stream(
        &self,
        Parameters(input): Parameters<BatchCreateStreamInput>,
    ) -> Result<CallToolResult, McpError> {
        debug!(recipients = input.recipients.len(), "Processing batch_create_stream request");

        let result: McpResult<_> = async {
            let request = input.into_request()?;
            Ok(self.ops.batch_create_streams(&request).await?)
        }
        .await;
        Ok(respond("batch_create_stream", result))
    }

    /// Look up one stream.
    #[tool(
        description = "Get details of a MoveFlow payment stream by id: parties, amounts, token, schedule, status and progress."
    )]
    async fn get_stream(
        &self,
        Parameters(input): Parameters<StreamIdInput>,
    ) -> Result<CallToolResult, McpError> {
        debug!(stream_id = %input.stream_id, "Processing get_stream request");
        let result = self.ops.get_stream(&input.stream_id).await;
        Ok(respond(
            "get_stream",
            result.map(|stream| StreamOutput { stream }).map_err(Into::into),
        ))
    }

    /// Alias of `get_stream`.
    #[tool(description = "Alias of get_stream. Get details of a MoveFlow payment stream by id.")]
    async fn get_stream_info(
        &self,
        Parameters(input): Parameters<StreamIdInput>,
    ) -> Result<CallToolResult, McpError> {
        self.get_stream(Parameters(input)).await
    }

    /// Aggregate every stream an account sends or receives.
    #[tool(
        description = "List every MoveFlow stream an account sends or receives, merged from several on-chain sources. Defaults to the server's own account. Partial results carry incomplete=true and a note naming the failed sources."
    )]
    async fn get_account_streams(
        &self,
        Parameters(input): Parameters<AccountStreamsInput>,
    ) -> Result<CallToolResult, McpError> {
        debug!(address = ?input.address, "Processing get_account_streams request");
        let result = self.ops.get_account_streams(input.address.as_deref()).await;
        Ok(respond("get_account_streams", result.map_err(Into::into)))
    }

    /// Close a stream.
    #[tool(
        description = "Cancel (close) a MoveFlow payment stream. Unreleased funds return to the sender."
    )]
    async fn cancel_stream(
        &self,
        Parameters(input): Parameters<StreamIdInput>,
    ) -> Result<CallToolResult, McpError> {
        debug!(stream_id = %input.stream_id, "Processing cancel_stream request");
        let result = self.ops.cancel_stream(&input.stream_id).await;
        Ok(respond("cancel_stream", result.map_err(Into::into)))
    }

    /// Token balance of an account.
    #[tool(
        description = "Get the token balance of an Aptos account. Defaults to the server's own account and APT."
    )]
    async fn get_wallet_balance(
        &self,
        Parameters(input): Parameters<WalletBalanceInput>,
    ) -> Result<CallToolResult, McpError> {
        debug!(address = ?input.address, token = ?input.token_type, "Processing get_wallet_balance request");
        let result = self
            .ops
            .get_wallet_balance(input.address.as_deref(), input.token_type.as_deref())
            .await;
        Ok(respond("get_wallet_balance", result.map_err(Into::into)))
    }

    /// Server configuration summary.
    #[tool(
        description = "Get the network, node URL, MoveFlow contract address and account this server uses."
    )]
    async fn status(&self) -> Result<CallToolResult, McpError> {
        let config = self.ops.config();
        let account_address = self.ops.current_address();
        let output = StatusOutput {
            version: env!("CARGO_PKG_VERSION").to_string(),
            network: config.network.to_string(),
            node_url: config.node_url(),
            contract_address: config.contract_address(),
            can_sign: config
                .private_key
                .as_deref()
                .is_some_and(|k| !k.trim().is_empty()),
            account_address,
        };

        info!(network = %output.network, can_sign = output.can_sign, "Status requested");
        Ok(respond("status", Ok(output)))
    }
}

#[tool_handler]
impl rmcp::ServerHandler for MoveflowMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation::from_build_env(),
            instructions: Some(
                "MoveFlow MCP Server - Create and inspect token payment streams on Aptos. \
                 Use `get_account_streams` to discover streams, `get_stream` for details, \
                 `batch_create_stream` to open streams and `cancel_stream` to close one. \
                 `get_wallet_balance` checks funds before creating streams."
                    .into(),
            ),
        }
    }
}

/// Run the MCP server on stdio transport.
pub async fn run_server(
    config: McpServerConfig,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    use rmcp::{transport::stdio, ServiceExt};

    info!("Starting MoveFlow MCP server");

    let server = MoveflowMcpServer::from_config(config)?;

    // A transport that closes during setup (stdin already gone) is a clean exit.
    let service = match server.serve(stdio()).await {
        Ok(s) => s,
        Err(e) => {
            info!("MCP transport closed during setup: {}", e);
            return Ok(());
        }
    };

    // Client disconnect and stdin EOF end the session normally.
    if let Err(e) = service.waiting().await {
        info!("MCP transport closed: {}", e);
    }

    info!("MCP server stopped");
    Ok(())
}
