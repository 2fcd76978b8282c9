//! Entry-function submission.
//!
//! Transactions are built as JSON, encoded to their signing message by the
//! node, signed locally and submitted back. No BCS encoding happens here.

use std::time::{SystemTime, UNIX_EPOCH};

use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::error::{ChainError, ChainResult};
use crate::node::NodeApi;
use crate::sdk::TxnOutcome;
use crate::signer::LocalSigner;

/// Default gas ceiling for stream entry functions.
pub const DEFAULT_MAX_GAS_AMOUNT: u64 = 200_000;

/// Seconds a submitted transaction stays valid.
pub const DEFAULT_EXPIRATION_SECS: u64 = 60;

/// An entry-function call.
#[derive(Debug, Clone, PartialEq)]
pub struct EntryFunction {
    /// `address::module::function`
    pub function: String,
    pub type_arguments: Vec<String>,
    /// JSON-encoded Move arguments (u64 as strings)
    pub arguments: Vec<Value>,
}

impl EntryFunction {
    pub fn new(function: impl Into<String>) -> Self {
        Self {
            function: function.into(),
            type_arguments: Vec::new(),
            arguments: Vec::new(),
        }
    }

    pub fn type_arg(mut self, type_tag: impl Into<String>) -> Self {
        self.type_arguments.push(type_tag.into());
        self
    }

    pub fn arg(mut self, value: Value) -> Self {
        self.arguments.push(value);
        self
    }

    /// Append a u64 argument in its JSON string form.
    pub fn u64_arg(self, value: u64) -> Self {
        self.arg(Value::String(value.to_string()))
    }

    fn payload(&self) -> Value {
        json!({
            "type": "entry_function_payload",
            "function": self.function,
            "type_arguments": self.type_arguments,
            "arguments": self.arguments,
        })
    }
}

/// Build, sign, submit and wait for an entry-function transaction.
///
/// Not retried: a resubmission after an ambiguous failure could execute
/// twice.
pub async fn submit_entry_function(
    node: &dyn NodeApi,
    signer: &LocalSigner,
    call: &EntryFunction,
) -> ChainResult<TxnOutcome> {
    let account = node.get_account(signer.address()).await?;
    let sequence_number = account
        .get("sequence_number")
        .and_then(Value::as_str)
        .ok_or_else(|| ChainError::malformed("account has no sequence_number"))?
        .to_string();

    let gas_unit_price = node.estimate_gas_price().await?;
    let expiration = unix_now()? + DEFAULT_EXPIRATION_SECS;

    let mut request = json!({
        "sender": signer.address(),
        "sequence_number": sequence_number,
        "max_gas_amount": DEFAULT_MAX_GAS_AMOUNT.to_string(),
        "gas_unit_price": gas_unit_price.to_string(),
        "expiration_timestamp_secs": expiration.to_string(),
        "payload": call.payload(),
    });

    let message_hex = node.encode_submission(&request).await?;
    let message = hex::decode(message_hex.trim_start_matches("0x"))
        .map_err(|e| ChainError::malformed(format!("signing message is not hex: {}", e)))?;

    request["signature"] = json!({
        "type": "ed25519_signature",
        "public_key": signer.public_key_hex(),
        "signature": signer.sign_hex(&message),
    });

    let pending = node.submit_transaction(&request).await?;
    let hash = pending
        .get("hash")
        .and_then(Value::as_str)
        .ok_or_else(|| ChainError::malformed("pending transaction has no hash"))?
        .to_string();
    debug!(hash = %hash, function = %call.function, "Submitted transaction");

    let committed = node.wait_for_transaction(&hash).await?;
    let outcome = outcome_from_committed(hash, &committed);

    if outcome.success {
        info!(hash = %outcome.hash, version = ?outcome.version, "Transaction committed");
        Ok(outcome)
    } else {
        warn!(hash = %outcome.hash, vm_status = %outcome.vm_status, "Transaction failed");
        Err(ChainError::transaction_failed(format!(
            "{} ({})",
            outcome.vm_status, outcome.hash
        )))
    }
}

fn outcome_from_committed(hash: String, committed: &Value) -> TxnOutcome {
    let text = |key: &str| committed.get(key).and_then(Value::as_str).map(str::to_string);
    TxnOutcome {
        hash,
        success: committed
            .get("success")
            .and_then(Value::as_bool)
            .unwrap_or(false),
        vm_status: text("vm_status").unwrap_or_else(|| "unknown".to_string()),
        version: text("version"),
        gas_used: text("gas_used"),
    }
}

fn unix_now() -> ChainResult<u64> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .map_err(|e| ChainError::config(format!("system clock before epoch: {}", e)))
}
