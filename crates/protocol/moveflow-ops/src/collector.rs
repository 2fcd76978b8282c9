//! Multi-source event collection.
//!
//! Every read path that can reveal an account's streams runs concurrently.
//! A failing source is logged, reported and treated as empty; it never
//! aborts the others. The output is unordered and may hold duplicates.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use moveflow_chain::aptos::{
    RECIPIENT_EVENTS, RECIPIENT_RECEIVE_FIELD, SENDER_CREATE_FIELD, SENDER_EVENTS,
};
use moveflow_chain::{
    event_handle, AptosConfig, ChainError, ChainResult, NodeApi, PageRequest, RetryPolicy,
    StreamSdk,
};
use moveflow_types::{
    addresses_match, RawRecord, RecordOrigin, StreamDirection, ACCOUNT_TRANSACTIONS_LIMIT,
    GLOBAL_TRANSACTIONS_LIMIT,
};

use crate::resolver::{resolve_string, FieldSpec};

// =============================================================================
// Source Reports
// =============================================================================

/// One read path of the collector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    SdkIncoming,
    SdkOutgoing,
    AccountEvents,
    AccountTransactions,
    SenderEventHandle,
    RecipientEventHandle,
    StreamEventHandle,
    GlobalTransactions,
    ViewEnrichment,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SdkIncoming => "sdk_incoming",
            Self::SdkOutgoing => "sdk_outgoing",
            Self::AccountEvents => "account_events",
            Self::AccountTransactions => "account_transactions",
            Self::SenderEventHandle => "sender_event_handle",
            Self::RecipientEventHandle => "recipient_event_handle",
            Self::StreamEventHandle => "stream_event_handle",
            Self::GlobalTransactions => "global_transactions",
            Self::ViewEnrichment => "view_enrichment",
        }
    }
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceReport {
    pub source: SourceKind,
    pub ok: bool,
    pub records: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SourceReport {
    pub fn succeeded(source: SourceKind, records: usize) -> Self {
        Self {
            source,
            ok: true,
            records,
            error: None,
        }
    }

    pub fn failed(source: SourceKind, error: impl Into<String>) -> Self {
        Self {
            source,
            ok: false,
            records: 0,
            error: Some(error.into()),
        }
    }
}

/// Everything the collector gathered for one address.
#[derive(Debug, Clone, Default)]
pub struct Collection {
    pub records: Vec<RawRecord>,
    pub reports: Vec<SourceReport>,
    /// Records returned by the incoming SDK listing
    pub incoming_count: usize,
    /// Records returned by the outgoing SDK listing
    pub outgoing_count: usize,
}

impl Collection {
    /// Sources that failed after retries.
    pub fn failed_sources(&self) -> Vec<SourceKind> {
        self.reports
            .iter()
            .filter(|r| !r.ok)
            .map(|r| r.source)
            .collect()
    }

    /// Whether the SDK listings (the primary sources) both failed.
    pub fn primary_failed(&self) -> bool {
        let failed = self.failed_sources();
        failed.contains(&SourceKind::SdkIncoming) && failed.contains(&SourceKind::SdkOutgoing)
    }

    fn absorb(&mut self, (report, records): (SourceReport, Vec<RawRecord>)) {
        self.reports.push(report);
        self.records.extend(records);
    }
}

// =============================================================================
// Extraction Helpers
// =============================================================================

fn event_type(event: &Value) -> &str {
    event.get("type").and_then(Value::as_str).unwrap_or_default()
}

fn event_data(event: &Value) -> Value {
    event.get("data").cloned().unwrap_or_else(|| json!({}))
}

/// Whether the event payload names `address` as sender or recipient.
pub fn event_mentions(data: &Value, address: &str) -> bool {
    ["sender", "recipient"].iter().any(|party| {
        data.get(*party)
            .and_then(Value::as_str)
            .is_some_and(|p| addresses_match(p, address))
    })
}

/// Whether a transaction calls or emits anything of the stream protocol.
pub fn is_protocol_transaction(tx: &Value, contract: &str) -> bool {
    let function_matches = tx
        .get("payload")
        .and_then(|p| p.get("function"))
        .and_then(Value::as_str)
        .is_some_and(|f| f.contains(contract) || f.contains("stream"));
    let events_match = tx
        .get("events")
        .and_then(Value::as_array)
        .is_some_and(|events| {
            events.iter().any(|e| {
                let ty = event_type(e);
                ty.contains(contract) || ty.contains("stream")
            })
        });
    function_matches || events_match
}

/// Stream events emitted by a transaction.
pub fn stream_events_of(tx: &Value) -> impl Iterator<Item = &Value> {
    tx.get("events")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter(|e| event_type(e).to_ascii_lowercase().contains("stream"))
}

/// Records from a raw account event log.
pub fn records_from_account_events(events: &[Value], address: &str) -> Vec<RawRecord> {
    events
        .iter()
        .filter(|event| {
            let data = event.get("data").unwrap_or(&Value::Null);
            event_type(event).contains("stream")
                || data.get("stream_id").is_some_and(|v| !v.is_null())
                || event_mentions(data, address)
        })
        .filter_map(|event| {
            RawRecord::from_value(
                RecordOrigin::Event {
                    event_type: event_type(event).to_string(),
                },
                event_data(event),
            )
        })
        .collect()
}

/// Records from protocol transactions, optionally restricted to `address`.
pub fn records_from_transactions(
    transactions: &[Value],
    contract: &str,
    address: Option<&str>,
) -> Vec<RawRecord> {
    let mut records = Vec::new();
    for tx in transactions.iter().filter(|tx| is_protocol_transaction(tx, contract)) {
        let version = tx
            .get("version")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        for event in stream_events_of(tx) {
            let data = event_data(event);
            if let Some(addr) = address {
                if !event_mentions(&data, addr) {
                    continue;
                }
            }
            if let Some(record) = RawRecord::from_value(
                RecordOrigin::Transaction {
                    version: version.clone(),
                },
                data,
            ) {
                records.push(record);
            }
        }
    }
    records
}

/// Records from a contract event handle whose `party` field is `address`.
pub fn records_from_handle(events: &[Value], party: &str, address: &str) -> Vec<RawRecord> {
    events
        .iter()
        .filter(|event| {
            event
                .get("data")
                .and_then(|d| d.get(party))
                .and_then(Value::as_str)
                .is_some_and(|p| addresses_match(p, address))
        })
        .filter_map(|event| {
            RawRecord::from_value(
                RecordOrigin::Event {
                    event_type: event_type(event).to_string(),
                },
                event_data(event),
            )
        })
        .collect()
}

/// Stream ids seen only in event-derived records, first-seen order.
pub fn bare_stream_ids(records: &[RawRecord]) -> Vec<String> {
    let authoritative: Vec<String> = records
        .iter()
        .filter(|r| !r.is_event_derived())
        .filter_map(|r| resolve_string(&r.fields, &FieldSpec::ID))
        .collect();

    let mut ids: Vec<String> = Vec::new();
    for record in records.iter().filter(|r| r.is_event_derived()) {
        if let Some(id) = resolve_string(&record.fields, &FieldSpec::ID) {
            if !authoritative.contains(&id) && !ids.contains(&id) {
                ids.push(id);
            }
        }
    }
    ids
}

// =============================================================================
// Collector
// =============================================================================

/// Knobs for one collector.
#[derive(Debug, Clone)]
pub struct CollectorSettings {
    /// MoveFlow module address
    pub contract: String,
    /// Page size for SDK listings and event handles
    pub page_limit: u32,
    /// Bare ids enriched through the view function
    pub max_streams_to_process: usize,
    /// Deadline per enrichment lookup
    pub fallback_fetch: Duration,
    /// Retry policy per source call
    pub retry: RetryPolicy,
}

impl CollectorSettings {
    pub fn from_config(config: &AptosConfig) -> Self {
        Self {
            contract: config.contract_address(),
            page_limit: config.page_limit,
            max_streams_to_process: config.max_streams_to_process,
            fallback_fetch: config.timeouts.fallback_fetch,
            retry: RetryPolicy::from_config(&config.retry),
        }
    }
}

/// Fans out to every read path for an address.
#[derive(Clone)]
pub struct EventCollector {
    sdk: Arc<dyn StreamSdk>,
    node: Arc<dyn NodeApi>,
    settings: CollectorSettings,
}

impl EventCollector {
    pub fn new(sdk: Arc<dyn StreamSdk>, node: Arc<dyn NodeApi>, settings: CollectorSettings) -> Self {
        Self {
            sdk,
            node,
            settings,
        }
    }

    pub fn settings(&self) -> &CollectorSettings {
        &self.settings
    }

    async fn run_source<F, Fut>(&self, kind: SourceKind, op: F) -> (SourceReport, Vec<RawRecord>)
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = ChainResult<Vec<RawRecord>>>,
    {
        match self.settings.retry.execute(op).await {
            Ok(records) => {
                debug!(source = kind.as_str(), count = records.len(), "Source returned records");
                (SourceReport::succeeded(kind, records.len()), records)
            }
            // Absent handles and accounts hold no streams.
            Err(ChainError::NotFound(_)) | Err(ChainError::AccountNotFound { .. }) => {
                debug!(source = kind.as_str(), "Source has no data");
                (SourceReport::succeeded(kind, 0), Vec::new())
            }
            Err(e) => {
                warn!(source = kind.as_str(), error = %e, "Source failed, treating as empty");
                (SourceReport::failed(kind, e.to_string()), Vec::new())
            }
        }
    }

    /// Collect raw records for `address` from every source.
    pub async fn collect(&self, address: &str) -> Collection {
        let sdk = self.sdk.as_ref();
        let node = self.node.as_ref();
        let contract = self.settings.contract.as_str();
        let limit = self.settings.page_limit;
        let page = PageRequest::first(limit);
        let sender_handle = event_handle(contract, SENDER_EVENTS);
        let recipient_handle = event_handle(contract, RECIPIENT_EVENTS);
        let sender_handle = sender_handle.as_str();
        let recipient_handle = recipient_handle.as_str();

        let (incoming, outgoing, account_events, account_txns, sender_events, recipient_events) = tokio::join!(
            self.run_source(SourceKind::SdkIncoming, move || {
                sdk.list_streams(address, StreamDirection::Incoming, page)
            }),
            self.run_source(SourceKind::SdkOutgoing, move || {
                sdk.list_streams(address, StreamDirection::Outgoing, page)
            }),
            self.run_source(SourceKind::AccountEvents, move || async move {
                let events = node.get_account_events(address, limit).await?;
                Ok(records_from_account_events(&events, address))
            }),
            self.run_source(SourceKind::AccountTransactions, move || async move {
                let txns = node
                    .get_account_transactions(address, ACCOUNT_TRANSACTIONS_LIMIT)
                    .await?;
                Ok(records_from_transactions(&txns, contract, None))
            }),
            self.run_source(SourceKind::SenderEventHandle, move || async move {
                let events = node
                    .get_events_by_handle(contract, sender_handle, SENDER_CREATE_FIELD, limit)
                    .await?;
                Ok(records_from_handle(&events, "sender", address))
            }),
            self.run_source(SourceKind::RecipientEventHandle, move || async move {
                let events = node
                    .get_events_by_handle(contract, recipient_handle, RECIPIENT_RECEIVE_FIELD, limit)
                    .await?;
                Ok(records_from_handle(&events, "recipient", address))
            }),
        );

        let mut collection = Collection {
            incoming_count: incoming.1.len(),
            outgoing_count: outgoing.1.len(),
            ..Collection::default()
        };
        for source in [incoming, outgoing, account_events, account_txns, sender_events, recipient_events] {
            collection.absorb(source);
        }

        if collection.records.is_empty() {
            info!(address, "Primary sources empty, scanning global transactions");
            let global = self
                .run_source(SourceKind::GlobalTransactions, move || async move {
                    let txns = node.get_transactions(GLOBAL_TRANSACTIONS_LIMIT).await?;
                    Ok(records_from_transactions(&txns, contract, Some(address)))
                })
                .await;
            collection.absorb(global);
        }

        let enrichment = self.enrich(&collection.records).await;
        if let Some(source) = enrichment {
            collection.absorb(source);
        }

        collection
    }

    /// Look up ids that only appeared in events through the view function.
    async fn enrich(&self, records: &[RawRecord]) -> Option<(SourceReport, Vec<RawRecord>)> {
        let mut ids = bare_stream_ids(records);
        if ids.is_empty() {
            return None;
        }
        if ids.len() > self.settings.max_streams_to_process {
            info!(
                found = ids.len(),
                limit = self.settings.max_streams_to_process,
                "Limiting stream detail lookups"
            );
            ids.truncate(self.settings.max_streams_to_process);
        }

        let lookups = ids.iter().map(|id| self.view_stream(id));
        let results = join_all(lookups).await;

        let mut found = Vec::new();
        let mut failures = Vec::new();
        for (id, result) in ids.iter().zip(results) {
            match result {
                Ok(Some(record)) => found.push(record),
                Ok(None) => debug!(stream_id = %id, "No view data for stream"),
                Err(e) => {
                    warn!(stream_id = %id, error = %e, "Stream detail lookup failed");
                    failures.push(format!("{}: {}", id, e));
                }
            }
        }

        let report = if failures.is_empty() {
            SourceReport::succeeded(SourceKind::ViewEnrichment, found.len())
        } else {
            SourceReport {
                source: SourceKind::ViewEnrichment,
                ok: false,
                records: found.len(),
                error: Some(failures.join("; ")),
            }
        };
        Some((report, found))
    }

    /// Fetch one stream through `get_stream`, bounded by the fallback deadline.
    pub async fn view_stream(&self, stream_id: &str) -> ChainResult<Option<RawRecord>> {
        let function = format!("{}::stream::get_stream", self.settings.contract);
        let args = [json!(stream_id)];
        let call = self.node.view(&function, &[], &args);

        let values = match tokio::time::timeout(self.settings.fallback_fetch, call).await {
            Err(_) => {
                return Err(ChainError::timeout(format!(
                    "stream {} lookup exceeded {:?}",
                    stream_id, self.settings.fallback_fetch
                )))
            }
            Ok(Err(ChainError::NotFound(_))) | Ok(Err(ChainError::Http { status: 400, .. })) => {
                return Ok(None)
            }
            Ok(result) => result?,
        };

        let record = values
            .into_iter()
            .next()
            .and_then(|v| RawRecord::from_value(RecordOrigin::View, v))
            .map(|mut record| {
                if resolve_string(&record.fields, &FieldSpec::ID).is_none() {
                    record
                        .fields
                        .insert("stream_id".to_string(), json!(stream_id));
                }
                record
            });
        Ok(record)
    }
}
