//! MoveFlow protocol constants.
//!
//! Network presets, call-class timeouts and stream-creation defaults.

// =============================================================================
// Network Presets
// =============================================================================

/// Aptos mainnet full-node REST endpoint
pub const MAINNET_NODE_URL: &str = "https://fullnode.mainnet.aptoslabs.com/v1";

/// Aptos testnet full-node REST endpoint
pub const TESTNET_NODE_URL: &str = "https://fullnode.testnet.aptoslabs.com/v1";

/// MoveFlow stream module address on mainnet
pub const MAINNET_CONTRACT_ADDRESS: &str =
    "0x15a5484b9f8369dd3d60c43e4530e7c1bb82eef041bf4cf8a2090399bebde5d4";

/// MoveFlow stream module address on testnet
pub const TESTNET_CONTRACT_ADDRESS: &str =
    "0x4836e267e5290dd8c4e21a0afa83e7c5f589005f58cc6fae76407b90f5383da";

// =============================================================================
// Tokens
// =============================================================================

/// Native coin type
pub const APT_COIN_TYPE: &str = "0x1::aptos_coin::AptosCoin";

/// USDT shorthand target
pub const USDT_COIN_TYPE: &str = "0x2::usdt::USDT";

/// USDC shorthand target
pub const USDC_COIN_TYPE: &str = "0x2::usdc::USDC";

/// Decimal places of the native coin (1 APT = 10^8 octas)
pub const APT_DECIMALS: u32 = 8;

// =============================================================================
// Timeouts (milliseconds)
// =============================================================================

/// Deadline for a single stream lookup
pub const STREAM_INFO_TIMEOUT_MS: u64 = 20_000;

/// Overall deadline for an account stream aggregation
pub const ACCOUNT_STREAMS_TIMEOUT_MS: u64 = 40_000;

/// Deadline for one HTTP request to the node
pub const FETCH_REQUEST_TIMEOUT_MS: u64 = 10_000;

/// Deadline for one enrichment lookup of a bare stream id
pub const FALLBACK_FETCH_TIMEOUT_MS: u64 = 5_000;

// =============================================================================
// Retry
// =============================================================================

/// Retries after the first attempt
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Base delay for linear backoff
pub const DEFAULT_RETRY_BASE_DELAY_MS: u64 = 1_000;

// =============================================================================
// Query Limits
// =============================================================================

/// Bare stream ids enriched through the view function per request
pub const MAX_STREAMS_TO_PROCESS: usize = 5;

/// Page size for SDK stream listings
pub const DEFAULT_PAGE_LIMIT: u32 = 100;

/// Account transaction history scanned per request
pub const ACCOUNT_TRANSACTIONS_LIMIT: u32 = 50;

/// Global transaction feed scanned as the last resort
pub const GLOBAL_TRANSACTIONS_LIMIT: u32 = 100;

/// Resource types listed when a token store is missing
pub const MAX_LISTED_RESOURCES: usize = 10;

// =============================================================================
// Stream Creation Defaults
// =============================================================================

/// Maximum streams in one batch creation
pub const MAX_BATCH_SIZE: usize = 200;

/// Release interval in seconds (one day)
pub const DEFAULT_INTERVAL_SECS: u64 = 86_400;

/// Delay between submission and stream start
pub const DEFAULT_START_DELAY_SECS: u64 = 300;

/// Auto-withdraw interval in seconds (30 days)
pub const DEFAULT_AUTO_WITHDRAW_INTERVAL_SECS: u64 = 2_592_000;

/// Remark attached to created streams
pub const DEFAULT_REMARK: &str = "remarks";

/// Name prefix for batch-created streams without explicit names
pub const DEFAULT_STREAM_NAME_PREFIX: &str = "MCP stream";

/// Value used when a stream id cannot be resolved
pub const UNKNOWN_STREAM_ID: &str = "unknown";
