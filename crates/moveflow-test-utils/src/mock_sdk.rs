//! Mock implementation of the `StreamSdk` trait for testing.
//!
//! Streams and listings live in memory. Failures can be injected per
//! operation and every call is counted.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;

use moveflow_chain::{
    BatchCreateParams, ChainError, ChainResult, CreateStreamParams, PageRequest, StreamSdk,
    TxnOutcome,
};
use moveflow_types::{normalize_address, RawRecord, StreamDirection};

use crate::helpers::Failure;

#[derive(Default)]
struct MockStreamSdkInner {
    /// Own account address.
    sender: Option<String>,
    /// Stream id -> record returned by `fetch_stream`.
    streams: HashMap<String, RawRecord>,
    /// (address, direction) -> listing.
    listings: HashMap<(String, StreamDirection), Vec<RawRecord>>,
    /// Failure for `fetch_stream`, with the number of calls it lasts for.
    fetch_failure: Option<(Failure, Option<u32>)>,
    /// Wait before answering `fetch_stream`.
    fetch_delay: Option<Duration>,
    /// Failing listing directions.
    list_failures: HashMap<StreamDirection, Failure>,
    /// Failure for every write.
    write_failure: Option<Failure>,
    /// Record of single creations.
    created: Vec<CreateStreamParams>,
    /// Record of batch creations.
    batches: Vec<BatchCreateParams>,
    /// Record of closed stream ids.
    closed: Vec<String>,
    fetch_calls: u32,
    list_calls: HashMap<StreamDirection, u32>,
    tx_counter: u64,
}

/// A mock implementation of the `StreamSdk` trait.
///
/// Uses `Arc<RwLock<...>>` internally, so it is cheap to clone and all
/// clones share the same state.
#[derive(Clone, Default)]
pub struct MockStreamSdk {
    inner: Arc<RwLock<MockStreamSdkInner>>,
}

impl MockStreamSdk {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the own account address.
    pub fn with_sender(self, address: &str) -> Self {
        self.inner.write().unwrap().sender = Some(normalize_address(address));
        self
    }

    /// Make `fetch_stream` return `record` for `stream_id`.
    pub fn with_stream(self, stream_id: &str, record: RawRecord) -> Self {
        self.inner
            .write()
            .unwrap()
            .streams
            .insert(stream_id.to_string(), record);
        self
    }

    /// Set the listing for an address and direction.
    pub fn with_listing(
        self,
        address: &str,
        direction: StreamDirection,
        records: Vec<RawRecord>,
    ) -> Self {
        self.inner
            .write()
            .unwrap()
            .listings
            .insert((normalize_address(address), direction), records);
        self
    }

    /// Make every `fetch_stream` call fail.
    pub fn with_fetch_failure(self, failure: Failure) -> Self {
        self.inner.write().unwrap().fetch_failure = Some((failure, None));
        self
    }

    /// Make the next `times` `fetch_stream` calls fail.
    pub fn with_transient_fetch_failure(self, failure: Failure, times: u32) -> Self {
        self.inner.write().unwrap().fetch_failure = Some((failure, Some(times)));
        self
    }

    /// Make every `fetch_stream` call wait `delay` before answering.
    pub fn with_fetch_delay(self, delay: Duration) -> Self {
        self.inner.write().unwrap().fetch_delay = Some(delay);
        self
    }

    /// Make listings in one direction fail.
    pub fn with_list_failure(self, direction: StreamDirection, failure: Failure) -> Self {
        self.inner
            .write()
            .unwrap()
            .list_failures
            .insert(direction, failure);
        self
    }

    /// Make every write fail.
    pub fn with_write_failure(self, failure: Failure) -> Self {
        self.inner.write().unwrap().write_failure = Some(failure);
        self
    }

    // =========================================================================
    // Assertion Helpers
    // =========================================================================

    pub fn created(&self) -> Vec<CreateStreamParams> {
        self.inner.read().unwrap().created.clone()
    }

    pub fn batches(&self) -> Vec<BatchCreateParams> {
        self.inner.read().unwrap().batches.clone()
    }

    pub fn closed(&self) -> Vec<String> {
        self.inner.read().unwrap().closed.clone()
    }

    pub fn fetch_calls(&self) -> u32 {
        self.inner.read().unwrap().fetch_calls
    }

    pub fn list_calls(&self, direction: StreamDirection) -> u32 {
        self.inner
            .read()
            .unwrap()
            .list_calls
            .get(&direction)
            .copied()
            .unwrap_or(0)
    }

    /// Total writes of any kind.
    pub fn write_count(&self) -> usize {
        let inner = self.inner.read().unwrap();
        inner.created.len() + inner.batches.len() + inner.closed.len()
    }

    fn outcome(inner: &mut MockStreamSdkInner) -> TxnOutcome {
        inner.tx_counter += 1;
        TxnOutcome {
            hash: format!("0x{:064x}", inner.tx_counter),
            success: true,
            vm_status: "Executed successfully".to_string(),
            version: Some(inner.tx_counter.to_string()),
            gas_used: Some("42".to_string()),
        }
    }
}

#[async_trait]
impl StreamSdk for MockStreamSdk {
    fn sender_address(&self) -> Option<String> {
        self.inner.read().unwrap().sender.clone()
    }

    async fn fetch_stream(&self, stream_id: &str) -> ChainResult<Option<RawRecord>> {
        let delay = self.inner.read().unwrap().fetch_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut inner = self.inner.write().unwrap();
        inner.fetch_calls += 1;

        let configured = inner.fetch_failure;
        if let Some((failure, remaining)) = configured {
            match remaining {
                None => return Err(failure.to_error("fetch_stream")),
                Some(0) => inner.fetch_failure = None,
                Some(n) => {
                    inner.fetch_failure = Some((failure, Some(n - 1)));
                    return Err(failure.to_error("fetch_stream"));
                }
            }
        }

        Ok(inner.streams.get(stream_id).cloned())
    }

    async fn list_streams(
        &self,
        address: &str,
        direction: StreamDirection,
        page: PageRequest,
    ) -> ChainResult<Vec<RawRecord>> {
        let mut inner = self.inner.write().unwrap();
        *inner.list_calls.entry(direction).or_insert(0) += 1;

        if let Some(failure) = inner.list_failures.get(&direction) {
            return Err(failure.to_error(&format!("list_streams {}", direction.as_str())));
        }

        let records = inner
            .listings
            .get(&(normalize_address(address), direction))
            .cloned()
            .unwrap_or_default();
        Ok(records.into_iter().take(page.limit as usize).collect())
    }

    async fn create_stream(&self, params: &CreateStreamParams) -> ChainResult<TxnOutcome> {
        let mut inner = self.inner.write().unwrap();
        if let Some(failure) = inner.write_failure {
            return Err(failure.to_error("create_stream"));
        }
        inner.created.push(params.clone());
        Ok(Self::outcome(&mut inner))
    }

    async fn batch_create_streams(&self, params: &BatchCreateParams) -> ChainResult<TxnOutcome> {
        let mut inner = self.inner.write().unwrap();
        if let Some(failure) = inner.write_failure {
            return Err(failure.to_error("batch_create_streams"));
        }
        inner.batches.push(params.clone());
        Ok(Self::outcome(&mut inner))
    }

    async fn close_stream(&self, stream_id: &str) -> ChainResult<TxnOutcome> {
        let mut inner = self.inner.write().unwrap();
        if let Some(failure) = inner.write_failure {
            return Err(failure.to_error("close_stream"));
        }
        if !inner.streams.contains_key(stream_id) {
            return Err(ChainError::not_found(format!("stream {}", stream_id)));
        }
        inner.closed.push(stream_id.to_string());
        Ok(Self::outcome(&mut inner))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::helpers::sdk_record;
    use serde_json::json;

    #[tokio::test]
    async fn test_transient_failure_recovers() {
        let sdk = MockStreamSdk::new()
            .with_stream("1", sdk_record(json!({"id": "1"})))
            .with_transient_fetch_failure(Failure::Unavailable, 2);

        assert!(sdk.fetch_stream("1").await.is_err());
        assert!(sdk.fetch_stream("1").await.is_err());
        assert!(sdk.fetch_stream("1").await.unwrap().is_some());
        assert_eq!(sdk.fetch_calls(), 3);
    }

    #[tokio::test]
    async fn test_listing_by_direction() {
        let sdk = MockStreamSdk::new().with_listing(
            "0xA",
            StreamDirection::Incoming,
            vec![sdk_record(json!({"id": "1"}))],
        );
        let page = PageRequest::first(10);
        assert_eq!(
            sdk.list_streams("0xa", StreamDirection::Incoming, page).await.unwrap().len(),
            1
        );
        assert!(sdk
            .list_streams("0xa", StreamDirection::Outgoing, page)
            .await
            .unwrap()
            .is_empty());
        assert_eq!(sdk.list_calls(StreamDirection::Incoming), 1);
    }
}
