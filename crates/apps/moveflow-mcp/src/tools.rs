//! MCP tool input/output types.
//!
//! Inputs are deserialized from tool-call arguments. Outputs reuse the
//! serializable result types of `moveflow-ops`, wrapped in a
//! `{success: true, ...}` envelope by the server.

use moveflow_ops::BatchCreateRequest;
use moveflow_types::{NormalizedStream, Permission, TypesResult};
use rmcp::schemars;
use rmcp::schemars::JsonSchema;
use serde::{Deserialize, Serialize};

// ============================================================================
// batch_create_stream Tool
// ============================================================================

/// Input for the `batch_create_stream` tool.
///
/// Opens one stream per recipient on a shared schedule, in one transaction.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct BatchCreateStreamInput {
    /// Recipient addresses (0x-prefixed hex), at most 200.
    pub recipients: Vec<String>,

    /// Amounts per recipient as decimal strings, e.g. "1.5".
    pub amounts: Vec<String>,

    /// Token shorthand (APT, USDC, USDT) or full coin type. Defaults to APT.
    #[serde(default)]
    pub token_type: Option<String>,

    /// Stream duration in seconds.
    pub duration: u64,

    /// Stream names, one per recipient. Defaults to "MCP stream {i}".
    #[serde(default)]
    pub names: Option<Vec<String>>,

    /// Release interval in seconds. Defaults to one day.
    #[serde(default)]
    pub interval: Option<u64>,

    /// Seconds between submission and start. Defaults to 300.
    #[serde(default)]
    pub start_delay: Option<u64>,

    /// Whether the cliff is set at the start time. Defaults to true.
    #[serde(default)]
    pub cliff_time_enabled: Option<bool>,

    /// Who may pause: sender, recipient, both or none.
    #[serde(default)]
    pub pauseable: Option<String>,

    /// Who may close: sender, recipient, both or none.
    #[serde(default)]
    pub closeable: Option<String>,

    /// Who may change the recipient: sender, recipient, both or none.
    #[serde(default)]
    pub recipient_modifiable: Option<String>,

    /// Free-form remark stored with the streams.
    #[serde(default)]
    pub remark: Option<String>,
}

fn parse_permission(value: &Option<String>) -> TypesResult<Option<Permission>> {
    value
        .as_deref()
        .filter(|v| !v.trim().is_empty())
        .map(str::parse)
        .transpose()
}

impl BatchCreateStreamInput {
    /// Convert to an operations request, parsing permission names.
    pub fn into_request(self) -> TypesResult<BatchCreateRequest> {
        Ok(BatchCreateRequest {
            pauseable: parse_permission(&self.pauseable)?,
            closeable: parse_permission(&self.closeable)?,
            recipient_modifiable: parse_permission(&self.recipient_modifiable)?,
            recipients: self.recipients,
            amounts: self.amounts,
            token_type: self.token_type.unwrap_or_default(),
            duration: self.duration,
            names: self.names,
            interval: self.interval,
            start_delay: self.start_delay,
            cliff_time_enabled: self.cliff_time_enabled,
            remark: self.remark,
        })
    }
}

// ============================================================================
// get_stream / get_stream_info / cancel_stream Tools
// ============================================================================

/// Input for tools that act on one stream.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct StreamIdInput {
    /// Stream id as shown by get_account_streams.
    pub stream_id: String,
}

// ============================================================================
// get_account_streams Tool
// ============================================================================

/// Input for the `get_account_streams` tool.
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct AccountStreamsInput {
    /// Account address. Defaults to the server's own account.
    #[serde(default)]
    pub address: Option<String>,
}

// ============================================================================
// get_wallet_balance Tool
// ============================================================================

/// Input for the `get_wallet_balance` tool.
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct WalletBalanceInput {
    /// Account address. Defaults to the server's own account.
    #[serde(default)]
    pub address: Option<String>,

    /// Token shorthand or full coin type. Defaults to APT.
    #[serde(default)]
    pub token_type: Option<String>,
}

// ============================================================================
// get_stream Tool
// ============================================================================

/// Output from `get_stream` and `get_stream_info`.
#[derive(Debug, Clone, Serialize)]
pub struct StreamOutput {
    pub stream: NormalizedStream,
}

// ============================================================================
// status Tool
// ============================================================================

/// Output from the `status` tool.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct StatusOutput {
    /// Server version.
    pub version: String,

    /// Aptos network name.
    pub network: String,

    /// Full-node URL in use.
    pub node_url: String,

    /// MoveFlow module address in use.
    pub contract_address: String,

    /// Account the server acts for, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_address: Option<String>,

    /// Whether the server holds a key and can submit transactions.
    pub can_sign: bool,
}
