//! Stream SDK seam.
//!
//! The query and creation pipelines talk to MoveFlow only through
//! [`StreamSdk`], so tests can substitute an in-memory implementation.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use moveflow_types::{Permission, RawRecord, StreamDirection};

use crate::error::ChainResult;

/// Paging for stream listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// Maximum items to fetch
    pub limit: u32,
}

impl PageRequest {
    pub fn first(limit: u32) -> Self {
        Self { limit }
    }
}

/// Schedule and permission settings shared by single and batch creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamTerms {
    /// Cliff time in unix seconds (0 when disabled)
    pub cliff_time: u64,
    /// Start time in unix seconds
    pub start_time: u64,
    /// Stop time in unix seconds
    pub stop_time: u64,
    /// Release interval in seconds
    pub interval: u64,
    /// Whether the module withdraws on the recipient's behalf
    pub auto_withdraw: bool,
    /// Auto-withdraw interval in seconds
    pub auto_withdraw_interval: u64,
    pub pauseable: Permission,
    pub closeable: Permission,
    pub recipient_modifiable: Permission,
}

/// Parameters for a single stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateStreamParams {
    /// Full coin type path
    pub coin_type: String,
    pub name: String,
    pub remark: String,
    pub recipient: String,
    /// Deposit in base units
    pub deposit_amount: u64,
    /// Released at the cliff, in base units
    pub cliff_amount: u64,
    pub terms: StreamTerms,
}

/// Parameters for many streams sharing one schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchCreateParams {
    /// Full coin type path
    pub coin_type: String,
    pub remark: String,
    pub names: Vec<String>,
    pub recipients: Vec<String>,
    /// Deposits in base units, parallel to `recipients`
    pub deposit_amounts: Vec<u64>,
    /// Cliff amounts in base units, parallel to `recipients`
    pub cliff_amounts: Vec<u64>,
    pub terms: StreamTerms,
}

/// Result of a committed transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxnOutcome {
    /// Transaction hash
    pub hash: String,
    /// Whether execution succeeded
    pub success: bool,
    /// VM status string
    pub vm_status: String,
    /// Ledger version the transaction committed at
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Gas units consumed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas_used: Option<String>,
}

/// MoveFlow stream operations.
#[async_trait]
pub trait StreamSdk: Send + Sync {
    /// Address of the account this SDK acts for, if any.
    fn sender_address(&self) -> Option<String>;

    /// Fetch one stream by id. `Ok(None)` when the stream does not exist.
    async fn fetch_stream(&self, stream_id: &str) -> ChainResult<Option<RawRecord>>;

    /// List streams where `address` is the recipient (incoming) or sender (outgoing).
    async fn list_streams(
        &self,
        address: &str,
        direction: StreamDirection,
        page: PageRequest,
    ) -> ChainResult<Vec<RawRecord>>;

    /// Create a single stream.
    async fn create_stream(&self, params: &CreateStreamParams) -> ChainResult<TxnOutcome>;

    /// Create several streams in one transaction.
    async fn batch_create_streams(&self, params: &BatchCreateParams) -> ChainResult<TxnOutcome>;

    /// Close a stream, returning unreleased funds to the sender.
    async fn close_stream(&self, stream_id: &str) -> ChainResult<TxnOutcome>;
}
