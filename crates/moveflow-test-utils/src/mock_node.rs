//! Mock implementation of the `NodeApi` trait for testing.
//!
//! Holds resources, event logs, transactions and view results in memory.
//! Failures and delays can be injected per endpoint.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use moveflow_chain::{ChainError, ChainResult, NodeApi};
use moveflow_types::normalize_address;

use crate::helpers::Failure;

/// Node endpoint, for failure injection and call counting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeEndpoint {
    Account,
    Resources,
    AccountEvents,
    EventHandle,
    AccountTransactions,
    Transactions,
    View,
    GasPrice,
    EncodeSubmission,
    Submit,
    WaitForTransaction,
}

#[derive(Default)]
struct MockNodeApiInner {
    /// Address -> sequence number.
    sequence_numbers: HashMap<String, u64>,
    /// Address -> raw resources body.
    resources: HashMap<String, Value>,
    /// Addresses answering `account_not_found`.
    missing_accounts: HashSet<String>,
    /// Address -> account event log.
    account_events: HashMap<String, Vec<Value>>,
    /// (handle, field) -> events.
    handle_events: HashMap<(String, String), Vec<Value>>,
    /// Address -> transactions.
    account_transactions: HashMap<String, Vec<Value>>,
    /// Global transaction feed.
    transactions: Vec<Value>,
    /// Stream id -> `get_stream` result.
    views: HashMap<String, Value>,
    /// Whether submitted transactions execute successfully.
    vm_failure: Option<String>,
    failures: HashMap<NodeEndpoint, Failure>,
    delays: HashMap<NodeEndpoint, Duration>,
    calls: HashMap<NodeEndpoint, u32>,
    /// Record of submitted signed transactions.
    submitted: Vec<Value>,
}

/// A mock implementation of the `NodeApi` trait.
///
/// Uses `Arc<RwLock<...>>` internally, so it is cheap to clone and all
/// clones share the same state.
#[derive(Clone, Default)]
pub struct MockNodeApi {
    inner: Arc<RwLock<MockNodeApiInner>>,
}

impl MockNodeApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the raw resources body of an account.
    pub fn with_resources(self, address: &str, resources: Value) -> Self {
        self.inner
            .write()
            .unwrap()
            .resources
            .insert(normalize_address(address), resources);
        self
    }

    /// Make an account answer `account_not_found`.
    pub fn with_missing_account(self, address: &str) -> Self {
        self.inner
            .write()
            .unwrap()
            .missing_accounts
            .insert(normalize_address(address));
        self
    }

    /// Set an account's raw event log.
    pub fn with_account_events(self, address: &str, events: Vec<Value>) -> Self {
        self.inner
            .write()
            .unwrap()
            .account_events
            .insert(normalize_address(address), events);
        self
    }

    /// Set the events of an event handle field.
    pub fn with_handle_events(self, handle: &str, field: &str, events: Vec<Value>) -> Self {
        self.inner
            .write()
            .unwrap()
            .handle_events
            .insert((handle.to_string(), field.to_string()), events);
        self
    }

    /// Set an account's transaction history.
    pub fn with_account_transactions(self, address: &str, transactions: Vec<Value>) -> Self {
        self.inner
            .write()
            .unwrap()
            .account_transactions
            .insert(normalize_address(address), transactions);
        self
    }

    /// Set the global transaction feed.
    pub fn with_transactions(self, transactions: Vec<Value>) -> Self {
        self.inner.write().unwrap().transactions = transactions;
        self
    }

    /// Make `get_stream` return `value` for `stream_id`.
    pub fn with_view(self, stream_id: &str, value: Value) -> Self {
        self.inner
            .write()
            .unwrap()
            .views
            .insert(stream_id.to_string(), value);
        self
    }

    /// Make submitted transactions abort with `vm_status`.
    pub fn with_vm_failure(self, vm_status: &str) -> Self {
        self.inner.write().unwrap().vm_failure = Some(vm_status.to_string());
        self
    }

    /// Make an endpoint fail.
    pub fn with_failure(self, endpoint: NodeEndpoint, failure: Failure) -> Self {
        self.inner.write().unwrap().failures.insert(endpoint, failure);
        self
    }

    /// Delay an endpoint's answers.
    pub fn with_delay(self, endpoint: NodeEndpoint, delay: Duration) -> Self {
        self.inner.write().unwrap().delays.insert(endpoint, delay);
        self
    }

    /// Clear an injected failure at runtime.
    pub fn clear_failure(&self, endpoint: NodeEndpoint) {
        self.inner.write().unwrap().failures.remove(&endpoint);
    }

    // =========================================================================
    // Assertion Helpers
    // =========================================================================

    pub fn calls(&self, endpoint: NodeEndpoint) -> u32 {
        self.inner
            .read()
            .unwrap()
            .calls
            .get(&endpoint)
            .copied()
            .unwrap_or(0)
    }

    pub fn submitted(&self) -> Vec<Value> {
        self.inner.read().unwrap().submitted.clone()
    }

    /// Count the call, wait out any delay, then apply any failure.
    async fn enter(&self, endpoint: NodeEndpoint, context: &str) -> ChainResult<()> {
        let delay = {
            let mut inner = self.inner.write().unwrap();
            *inner.calls.entry(endpoint).or_insert(0) += 1;
            inner.delays.get(&endpoint).copied()
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let failure = self.inner.read().unwrap().failures.get(&endpoint).copied();
        match failure {
            Some(failure) => Err(failure.to_error(context)),
            None => Ok(()),
        }
    }

    fn check_account(&self, address: &str) -> ChainResult<String> {
        let address = normalize_address(address);
        if self.inner.read().unwrap().missing_accounts.contains(&address) {
            return Err(ChainError::account_not_found(
                address.clone(),
                format!(
                    "Account not found by Address({}) and Ledger version(4242)",
                    address
                ),
            ));
        }
        Ok(address)
    }
}

#[async_trait]
impl NodeApi for MockNodeApi {
    async fn get_account(&self, address: &str) -> ChainResult<Value> {
        self.enter(NodeEndpoint::Account, "get_account").await?;
        let address = self.check_account(address)?;
        let sequence = self
            .inner
            .read()
            .unwrap()
            .sequence_numbers
            .get(&address)
            .copied()
            .unwrap_or(0);
        Ok(json!({
            "sequence_number": sequence.to_string(),
            "authentication_key": address,
        }))
    }

    async fn get_account_resources(&self, address: &str) -> ChainResult<Value> {
        self.enter(NodeEndpoint::Resources, "get_account_resources").await?;
        let address = self.check_account(address)?;
        Ok(self
            .inner
            .read()
            .unwrap()
            .resources
            .get(&address)
            .cloned()
            .unwrap_or_else(|| json!([])))
    }

    async fn get_account_events(&self, address: &str, limit: u32) -> ChainResult<Vec<Value>> {
        self.enter(NodeEndpoint::AccountEvents, "get_account_events").await?;
        let address = normalize_address(address);
        let inner = self.inner.read().unwrap();
        let events = inner.account_events.get(&address).cloned().unwrap_or_default();
        Ok(events.into_iter().take(limit as usize).collect())
    }

    async fn get_events_by_handle(
        &self,
        _address: &str,
        event_handle: &str,
        field_name: &str,
        limit: u32,
    ) -> ChainResult<Vec<Value>> {
        self.enter(NodeEndpoint::EventHandle, "get_events_by_handle").await?;
        let inner = self.inner.read().unwrap();
        match inner
            .handle_events
            .get(&(event_handle.to_string(), field_name.to_string()))
        {
            Some(events) => Ok(events.iter().take(limit as usize).cloned().collect()),
            None => Err(ChainError::not_found(format!(
                "event handle {}/{}",
                event_handle, field_name
            ))),
        }
    }

    async fn get_account_transactions(
        &self,
        address: &str,
        limit: u32,
    ) -> ChainResult<Vec<Value>> {
        self.enter(NodeEndpoint::AccountTransactions, "get_account_transactions")
            .await?;
        let address = normalize_address(address);
        let inner = self.inner.read().unwrap();
        let txns = inner
            .account_transactions
            .get(&address)
            .cloned()
            .unwrap_or_default();
        Ok(txns.into_iter().take(limit as usize).collect())
    }

    async fn get_transactions(&self, limit: u32) -> ChainResult<Vec<Value>> {
        self.enter(NodeEndpoint::Transactions, "get_transactions").await?;
        let inner = self.inner.read().unwrap();
        Ok(inner.transactions.iter().take(limit as usize).cloned().collect())
    }

    async fn view(
        &self,
        function: &str,
        _type_arguments: &[String],
        arguments: &[Value],
    ) -> ChainResult<Vec<Value>> {
        self.enter(NodeEndpoint::View, "view").await?;
        if !function.ends_with("::stream::get_stream") {
            return Err(ChainError::not_found(format!("function {}", function)));
        }
        let stream_id = arguments.first().and_then(Value::as_str).unwrap_or_default();
        let inner = self.inner.read().unwrap();
        match inner.views.get(stream_id) {
            Some(value) => Ok(vec![value.clone()]),
            None => Err(ChainError::http(400, format!("stream {} does not exist", stream_id))),
        }
    }

    async fn estimate_gas_price(&self) -> ChainResult<u64> {
        self.enter(NodeEndpoint::GasPrice, "estimate_gas_price").await?;
        Ok(100)
    }

    async fn encode_submission(&self, _request: &Value) -> ChainResult<String> {
        self.enter(NodeEndpoint::EncodeSubmission, "encode_submission")
            .await?;
        Ok("0xb5e97db07fa0bd0e5598aa3643a9bc6f6693bddc1a9fec9e674a461eaa00b193".to_string())
    }

    async fn submit_transaction(&self, signed: &Value) -> ChainResult<Value> {
        self.enter(NodeEndpoint::Submit, "submit_transaction").await?;
        let mut inner = self.inner.write().unwrap();
        inner.submitted.push(signed.clone());
        let sender = signed
            .get("sender")
            .and_then(Value::as_str)
            .map(normalize_address)
            .unwrap_or_default();
        *inner.sequence_numbers.entry(sender).or_insert(0) += 1;
        Ok(json!({"hash": format!("0x{:064x}", inner.submitted.len())}))
    }

    async fn wait_for_transaction(&self, hash: &str) -> ChainResult<Value> {
        self.enter(NodeEndpoint::WaitForTransaction, "wait_for_transaction")
            .await?;
        let inner = self.inner.read().unwrap();
        let (success, vm_status) = match &inner.vm_failure {
            Some(status) => (false, status.clone()),
            None => (true, "Executed successfully".to_string()),
        };
        Ok(json!({
            "hash": hash,
            "success": success,
            "vm_status": vm_status,
            "version": inner.submitted.len().to_string(),
            "gas_used": "42",
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::helpers::{stream_event, TEST_CONTRACT};

    #[tokio::test]
    async fn test_failure_injection_and_counting() {
        let node = MockNodeApi::new().with_failure(NodeEndpoint::Transactions, Failure::Unavailable);
        let err = node.get_transactions(10).await.unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(node.calls(NodeEndpoint::Transactions), 1);

        node.clear_failure(NodeEndpoint::Transactions);
        assert!(node.get_transactions(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_account_message_has_ledger_version() {
        let node = MockNodeApi::new().with_missing_account("0xdead");
        match node.get_account_resources("0xDEAD").await {
            Err(ChainError::AccountNotFound { message, .. }) => {
                assert!(message.contains("Ledger version(4242)"))
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_handle_events() {
        let handle = format!("{}::stream::SenderEvents", TEST_CONTRACT);
        let node = MockNodeApi::new().with_handle_events(
            &handle,
            "create_events",
            vec![stream_event("1", "0xa", "0xb")],
        );
        let events = node
            .get_events_by_handle(TEST_CONTRACT, &handle, "create_events", 10)
            .await
            .unwrap();
        assert_eq!(events.len(), 1);
        assert!(node
            .get_events_by_handle(TEST_CONTRACT, &handle, "other", 10)
            .await
            .is_err());
    }
}
