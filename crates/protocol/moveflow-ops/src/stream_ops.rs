//! Main StreamOperations implementation.
//!
//! `StreamOperations` holds the shared, immutable clients every operation
//! needs. The operations themselves live in [`crate::query`],
//! [`crate::create`], [`crate::wallet`] and [`crate::diagnostics`].

use std::sync::Arc;

use moveflow_chain::{AptosConfig, AptosStreamClient, NodeApi, RetryPolicy, StreamSdk};
use moveflow_types::normalize_address;

use crate::clock::{Clock, SystemClock};
use crate::collector::{CollectorSettings, EventCollector};
use crate::error::{OpsError, OpsResult};

/// Stream operations over one network.
///
/// Cloning is cheap; every client is behind an `Arc`. Nothing is cached
/// between calls.
#[derive(Clone)]
pub struct StreamOperations {
    /// Stream SDK used for fetches, listings and writes.
    pub(crate) sdk: Arc<dyn StreamSdk>,
    /// Raw node API for scans and balances.
    pub(crate) node: Arc<dyn NodeApi>,
    /// Multi-source collector for account queries.
    pub(crate) collector: EventCollector,
    /// Time source for status derivation and creation schedules.
    pub(crate) clock: Arc<dyn Clock>,
    /// Retry policy for single-source reads.
    pub(crate) retry: RetryPolicy,
    /// Chain configuration.
    pub(crate) config: AptosConfig,
}

impl StreamOperations {
    /// Create operations over the given SDK and node clients.
    pub fn new(sdk: Arc<dyn StreamSdk>, node: Arc<dyn NodeApi>, config: AptosConfig) -> Self {
        let settings = CollectorSettings::from_config(&config);
        Self {
            collector: EventCollector::new(Arc::clone(&sdk), Arc::clone(&node), settings),
            retry: RetryPolicy::from_config(&config.retry),
            clock: Arc::new(SystemClock),
            sdk,
            node,
            config,
        }
    }

    /// Create operations backed by the REST stream client.
    pub fn from_config(config: AptosConfig) -> OpsResult<Self> {
        let client = AptosStreamClient::from_config(&config)?;
        let node = client.node();
        Ok(Self::new(Arc::new(client), node, config))
    }

    /// Replace the clock.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Replace the retry policy for single reads and every collector source.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        let mut settings = self.collector.settings().clone();
        settings.retry = retry.clone();
        self.collector = EventCollector::new(Arc::clone(&self.sdk), Arc::clone(&self.node), settings);
        self.retry = retry;
        self
    }

    pub fn config(&self) -> &AptosConfig {
        &self.config
    }

    pub fn collector(&self) -> &EventCollector {
        &self.collector
    }

    /// Current account address, if a key or address is configured.
    pub fn current_address(&self) -> Option<String> {
        self.sdk.sender_address()
    }

    /// Normalize `address`, substituting the current account when empty.
    pub fn resolve_address(&self, address: Option<&str>) -> OpsResult<String> {
        let normalized = address.map(normalize_address).unwrap_or_default();
        if !normalized.is_empty() {
            return Ok(normalized);
        }
        self.current_address()
            .map(|a| normalize_address(&a))
            .filter(|a| !a.is_empty())
            .ok_or(OpsError::NoAccount)
    }

    pub(crate) fn now(&self) -> u64 {
        self.clock.now_secs()
    }
}
