//! Helper functions for creating test fixtures.
//!
//! Provides failure modes for the mocks, JSON shaped like node responses,
//! and pre-configured `StreamOperations`.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Map, Value};

use moveflow_chain::{AptosConfig, ChainError, RetryConfig};
use moveflow_ops::{FixedClock, StreamOperations};
use moveflow_types::RawRecord;

use crate::{MockNodeApi, MockStreamSdk};

/// Contract address used by [`test_config`].
pub const TEST_CONTRACT: &str = "0xc0ffee";

/// Error a mock returns when configured to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    /// Connection error (retryable)
    Network,
    /// Deadline error (retryable)
    Timeout,
    /// HTTP 503 (retryable)
    Unavailable,
    /// HTTP 404
    NotFound,
    /// Unexpected body shape
    Malformed,
}

impl Failure {
    pub fn to_error(self, context: &str) -> ChainError {
        match self {
            Failure::Network => ChainError::network(format!("mock: {} unreachable", context)),
            Failure::Timeout => ChainError::timeout(format!("mock: {} timed out", context)),
            Failure::Unavailable => ChainError::http(503, format!("mock: {} unavailable", context)),
            Failure::NotFound => ChainError::not_found(format!("mock: {}", context)),
            Failure::Malformed => ChainError::malformed(format!("mock: {} returned garbage", context)),
        }
    }
}

/// Config pointing at [`TEST_CONTRACT`] with millisecond retries.
pub fn test_config() -> AptosConfig {
    AptosConfig {
        contract_address: Some(TEST_CONTRACT.to_string()),
        retry: RetryConfig {
            max_retries: 3,
            base_delay: Duration::from_millis(1),
        },
        ..AptosConfig::default()
    }
}

/// Operations over the given mocks with a fixed clock.
pub fn test_operations(sdk: &MockStreamSdk, node: &MockNodeApi, now: u64) -> StreamOperations {
    StreamOperations::new(Arc::new(sdk.clone()), Arc::new(node.clone()), test_config())
        .with_clock(Arc::new(FixedClock(now)))
}

/// Object fields from a `json!` literal. Non-objects yield an empty map.
pub fn fields(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

/// SDK record built from a `json!` literal.
pub fn sdk_record(value: Value) -> RawRecord {
    RawRecord::sdk(fields(value))
}

/// A node event with the given type and payload.
pub fn event_json(event_type: &str, data: Value) -> Value {
    json!({
        "guid": {"creation_number": "0", "account_address": TEST_CONTRACT},
        "sequence_number": "0",
        "type": event_type,
        "data": data,
    })
}

/// Stream creation event of [`TEST_CONTRACT`].
pub fn stream_event(stream_id: &str, sender: &str, recipient: &str) -> Value {
    event_json(
        &format!("{}::stream::StreamEvent", TEST_CONTRACT),
        json!({"stream_id": stream_id, "sender": sender, "recipient": recipient}),
    )
}

/// A committed user transaction calling `function` and emitting `events`.
pub fn transaction_json(version: u64, function: &str, events: Vec<Value>) -> Value {
    json!({
        "type": "user_transaction",
        "version": version.to_string(),
        "hash": format!("0x{:064x}", version),
        "success": true,
        "vm_status": "Executed successfully",
        "payload": {"type": "entry_function_payload", "function": function},
        "events": events,
    })
}

/// Coin store resource holding `value` base units of `coin_type`.
pub fn coin_store(coin_type: &str, value: &str) -> Value {
    json!({
        "type": format!("0x1::coin::CoinStore<{}>", coin_type),
        "data": {"coin": {"value": value}, "frozen": false},
    })
}

/// Full view/SDK payload for a stream.
pub fn stream_view(stream_id: &str, sender: &str, recipient: &str, deposit: &str) -> Value {
    json!({
        "id": stream_id,
        "sender": sender,
        "recipient": recipient,
        "deposit_amount": deposit,
        "withdrawn_amount": "0",
        "coin_type": "0x1::aptos_coin::AptosCoin",
        "start_time": "100",
        "stop_time": "200",
        "interval": "10",
        "paused": false,
        "closed": false,
    })
}
