//! Raw node scan for troubleshooting missing streams.
//!
//! Unlike [`StreamOperations::get_account_streams`], the scan bypasses the
//! SDK and reports what each node endpoint returned, so a user can see
//! which path knows about a stream.

use futures::future::join_all;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use moveflow_chain::aptos::{
    RECIPIENT_EVENTS, RECIPIENT_RECEIVE_FIELD, SENDER_CREATE_FIELD, SENDER_EVENTS, STREAM_EVENTS,
    STREAM_EVENT_FIELDS,
};
use moveflow_chain::{event_handle, ChainError, ChainResult};
use moveflow_types::{
    NormalizedStream, RawRecord, RecordOrigin, ACCOUNT_TRANSACTIONS_LIMIT,
    GLOBAL_TRANSACTIONS_LIMIT,
};

use crate::collector::{
    event_mentions, records_from_handle, records_from_transactions, SourceKind, SourceReport,
};
use crate::error::OpsResult;
use crate::normalize::normalize_record;
use crate::resolver::{resolve_string, FieldSpec};
use crate::stream_ops::StreamOperations;

/// Events shown when no stream details could be fetched.
const SAMPLE_EVENTS: usize = 3;

/// Result of a raw scan.
#[derive(Debug, Clone, Serialize)]
pub struct StreamScan {
    pub address: String,
    pub contract: String,
    /// What each endpoint returned
    pub sources: Vec<SourceReport>,
    /// Distinct stream ids across every source, first-seen order
    pub stream_ids: Vec<String>,
    /// Ids skipped by the lookup limit
    pub skipped_ids: usize,
    /// Streams resolved through the view function
    pub details: Vec<NormalizedStream>,
    /// Contract table resources, listed only when no details resolved
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub table_resources: Vec<String>,
    /// First few collected events, listed only when no details resolved
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sample_events: Vec<Value>,
}

fn scanned(kind: SourceKind, result: ChainResult<Vec<RawRecord>>) -> (SourceReport, Vec<RawRecord>) {
    match result {
        Ok(records) => {
            debug!(source = kind.as_str(), count = records.len(), "Scan source returned events");
            (SourceReport::succeeded(kind, records.len()), records)
        }
        Err(ChainError::NotFound(_)) => (SourceReport::succeeded(kind, 0), Vec::new()),
        Err(e) => {
            warn!(source = kind.as_str(), error = %e, "Scan source failed");
            (SourceReport::failed(kind, e.to_string()), Vec::new())
        }
    }
}

/// Table resources of the module that may hold streams.
pub fn stream_table_types(resources: &Value) -> Vec<String> {
    resources
        .as_array()
        .into_iter()
        .flatten()
        .filter_map(|r| r.get("type").and_then(Value::as_str))
        .filter(|ty| ty.contains("Table") && ty.to_ascii_lowercase().contains("stream"))
        .map(str::to_string)
        .collect()
}

impl StreamOperations {
    async fn stream_event_records(&self, address: &str) -> ChainResult<Vec<RawRecord>> {
        let contract = self.collector.settings().contract.as_str();
        let handle = event_handle(contract, STREAM_EVENTS);
        let limit = self.config.page_limit;

        let lookups = STREAM_EVENT_FIELDS
            .iter()
            .map(|field| self.node.get_events_by_handle(contract, &handle, field, limit));
        let results = join_all(lookups).await;

        let mut records = Vec::new();
        let mut first_error = None;
        let mut any_ok = false;
        for (field, result) in STREAM_EVENT_FIELDS.iter().zip(results) {
            match result {
                Ok(events) => {
                    any_ok = true;
                    for event in events {
                        let data = event.get("data").cloned().unwrap_or(Value::Null);
                        if !event_mentions(&data, address) {
                            continue;
                        }
                        let event_type = format!("{}/{}", handle, field);
                        if let Some(record) =
                            RawRecord::from_value(RecordOrigin::Event { event_type }, data)
                        {
                            records.push(record);
                        }
                    }
                }
                Err(e) => {
                    debug!(field, error = %e, "Stream event field unavailable");
                    if first_error.is_none() {
                        first_error = Some(e);
                    }
                }
            }
        }

        match first_error {
            Some(e) if !any_ok => Err(e),
            _ => Ok(records),
        }
    }

    /// Scan every node endpoint for streams of `address`.
    pub async fn scan_streams(&self, address: Option<&str>) -> OpsResult<StreamScan> {
        let address = self.resolve_address(address)?;
        let contract = self.collector.settings().contract.clone();
        let limit = self.config.page_limit;
        let node = self.node.as_ref();
        let sender_handle = event_handle(&contract, SENDER_EVENTS);
        let recipient_handle = event_handle(&contract, RECIPIENT_EVENTS);

        info!(address = %address, "Scanning node endpoints for streams");

        let (sender, recipient, stream_events, user_txns, global_txns) = tokio::join!(
            async {
                node.get_events_by_handle(&contract, &sender_handle, SENDER_CREATE_FIELD, limit)
                    .await
                    .map(|events| records_from_handle(&events, "sender", &address))
            },
            async {
                node.get_events_by_handle(&contract, &recipient_handle, RECIPIENT_RECEIVE_FIELD, limit)
                    .await
                    .map(|events| records_from_handle(&events, "recipient", &address))
            },
            self.stream_event_records(&address),
            async {
                node.get_account_transactions(&address, ACCOUNT_TRANSACTIONS_LIMIT)
                    .await
                    .map(|txns| records_from_transactions(&txns, &contract, None))
            },
            async {
                node.get_transactions(GLOBAL_TRANSACTIONS_LIMIT)
                    .await
                    .map(|txns| records_from_transactions(&txns, &contract, Some(address.as_str())))
            },
        );

        let mut sources = Vec::new();
        let mut records = Vec::new();
        for (kind, result) in [
            (SourceKind::SenderEventHandle, sender),
            (SourceKind::RecipientEventHandle, recipient),
            (SourceKind::StreamEventHandle, stream_events),
            (SourceKind::AccountTransactions, user_txns),
            (SourceKind::GlobalTransactions, global_txns),
        ] {
            let (report, found) = scanned(kind, result);
            sources.push(report);
            records.extend(found);
        }

        let mut stream_ids: Vec<String> = Vec::new();
        for record in &records {
            if let Some(id) = resolve_string(&record.fields, &FieldSpec::ID) {
                if !stream_ids.contains(&id) {
                    stream_ids.push(id);
                }
            }
        }

        let max = self.config.max_streams_to_process;
        let skipped_ids = stream_ids.len().saturating_sub(max);
        if skipped_ids > 0 {
            info!(found = stream_ids.len(), limit = max, "Limiting stream detail lookups");
        }

        let lookups = stream_ids
            .iter()
            .take(max)
            .map(|id| self.collector.view_stream(id));
        let now = self.now();
        let details: Vec<NormalizedStream> = join_all(lookups)
            .await
            .into_iter()
            .filter_map(|result| match result {
                Ok(record) => record,
                Err(e) => {
                    warn!(error = %e, "Stream detail lookup failed");
                    None
                }
            })
            .map(|record| normalize_record(&record, now))
            .collect();

        let (table_resources, sample_events) = if details.is_empty() {
            info!("No stream details resolved, listing contract tables");
            let tables = match node.get_account_resources(&contract).await {
                Ok(resources) => stream_table_types(&resources),
                Err(e) => {
                    warn!(error = %e, "Contract resource scan failed");
                    Vec::new()
                }
            };
            let samples = records
                .iter()
                .take(SAMPLE_EVENTS)
                .map(|r| Value::Object(r.fields.clone()))
                .collect();
            (tables, samples)
        } else {
            (Vec::new(), Vec::new())
        };

        Ok(StreamScan {
            address,
            contract,
            sources,
            stream_ids,
            skipped_ids,
            details,
            table_resources,
            sample_events,
        })
    }
}
