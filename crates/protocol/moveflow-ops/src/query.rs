//! Query operations.
//!
//! `get_stream` resolves one stream id; `get_account_streams` aggregates
//! every stream an address sends or receives. Both degrade to event data
//! when the primary SDK path fails.

use std::time::Duration;

use futures::future::join_all;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use moveflow_chain::aptos::{
    RECIPIENT_EVENTS, RECIPIENT_RECEIVE_FIELD, SENDER_CREATE_FIELD, SENDER_EVENTS, STREAM_EVENTS,
    STREAM_EVENT_FIELDS,
};
use moveflow_chain::{event_handle, event_stream_id, ChainError};
use moveflow_types::{NormalizedStream, RawRecord, RecordOrigin};

use crate::collector::{Collection, SourceKind, SourceReport};
use crate::dedup::dedup_records;
use crate::error::{OpsError, OpsResult};
use crate::normalize::normalize_record;
use crate::stream_ops::StreamOperations;

/// How an account query was answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryMode {
    /// SDK listings plus event and transaction scans
    MultiSource,
    /// Only the global transaction feed had data
    Fallback,
}

/// Aggregated streams of one account.
#[derive(Debug, Clone, Serialize)]
pub struct AccountStreams {
    pub streams: Vec<NormalizedStream>,
    pub total_count: usize,
    pub incoming_count: usize,
    pub outgoing_count: usize,
    pub address: String,
    pub query_mode: QueryMode,
    pub sources: Vec<SourceReport>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub incomplete: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

fn incomplete_note(failed: &[SourceKind]) -> String {
    let names: Vec<&str> = failed.iter().map(SourceKind::as_str).collect();
    format!("results may be incomplete: {} failed", names.join(", "))
}

impl StreamOperations {
    /// Look up one stream by id.
    ///
    /// Tries the SDK with retries under the `stream_info` deadline, then the
    /// contract's event handles. Event-derived results carry no status
    /// unless the events hold flags or a full window.
    pub async fn get_stream(&self, stream_id: &str) -> OpsResult<NormalizedStream> {
        let stream_id = stream_id.trim();
        if stream_id.is_empty() {
            return Err(OpsError::StreamNotFound(String::new()));
        }

        // One deadline covers the SDK lookup and the event search together.
        let deadline = self.config.timeouts.stream_info;
        let expires = tokio::time::Instant::now() + deadline;
        let sdk = self.sdk.as_ref();
        let primary = tokio::time::timeout_at(
            expires,
            self.retry.execute(move || sdk.fetch_stream(stream_id)),
        )
        .await;

        let primary_error = match primary {
            Ok(Ok(Some(record))) => {
                debug!(stream_id, "Stream found via SDK");
                return Ok(normalize_record(&record, self.now()));
            }
            Ok(Ok(None)) => {
                info!(stream_id, "Stream not found via SDK, searching events");
                None
            }
            Ok(Err(e)) => {
                warn!(stream_id, error = %e, "SDK lookup failed, searching events");
                Some(OpsError::from(e))
            }
            Err(_) => {
                warn!(stream_id, ?deadline, "SDK lookup timed out, searching events");
                Some(OpsError::timeout("get_stream", millis(deadline)))
            }
        };

        let fallback = tokio::time::timeout_at(expires, self.find_stream_events(stream_id)).await;
        match fallback {
            Ok(records) if !records.is_empty() => {
                let mut best = dedup_records(records);
                // Every record shares the id, so dedup leaves exactly one.
                match best.pop() {
                    Some(record) => Ok(normalize_record(&record, self.now())),
                    None => Err(OpsError::StreamNotFound(stream_id.to_string())),
                }
            }
            Ok(_) => Err(primary_error
                .unwrap_or_else(|| OpsError::StreamNotFound(stream_id.to_string()))),
            Err(_) => {
                warn!(stream_id, "Event search timed out");
                Err(primary_error
                    .unwrap_or_else(|| OpsError::timeout("get_stream", millis(deadline))))
            }
        }
    }

    /// Event records mentioning `stream_id` in the contract's event handles.
    async fn find_stream_events(&self, stream_id: &str) -> Vec<RawRecord> {
        let contract = self.collector.settings().contract.clone();
        let limit = self.config.page_limit;

        let mut handles: Vec<(String, &str)> = vec![
            (event_handle(&contract, SENDER_EVENTS), SENDER_CREATE_FIELD),
            (event_handle(&contract, RECIPIENT_EVENTS), RECIPIENT_RECEIVE_FIELD),
        ];
        for field in STREAM_EVENT_FIELDS {
            handles.push((event_handle(&contract, STREAM_EVENTS), field));
        }

        let lookups = handles.iter().map(|(handle, field)| {
            self.node
                .get_events_by_handle(&contract, handle, field, limit)
        });
        let results = join_all(lookups).await;

        let mut records = Vec::new();
        for ((handle, field), result) in handles.iter().zip(results) {
            let events = match result {
                Ok(events) => events,
                Err(ChainError::NotFound(_)) => continue,
                Err(e) => {
                    debug!(handle = %handle, field, error = %e, "Event handle unavailable");
                    continue;
                }
            };
            for event in events {
                let data = event.get("data").cloned().unwrap_or(Value::Null);
                if event_stream_id(&data).as_deref() != Some(stream_id) {
                    continue;
                }
                let event_type = event
                    .get("type")
                    .and_then(Value::as_str)
                    .unwrap_or(handle.as_str())
                    .to_string();
                if let Some(record) = RawRecord::from_value(RecordOrigin::Event { event_type }, data) {
                    records.push(record);
                }
            }
        }
        records
    }

    /// Aggregate every stream `address` sends or receives.
    ///
    /// `None` or an empty address queries the configured account. The whole
    /// aggregation runs under the `account_streams` deadline.
    pub async fn get_account_streams(&self, address: Option<&str>) -> OpsResult<AccountStreams> {
        let address = self.resolve_address(address)?;
        let deadline = self.config.timeouts.account_streams;

        info!(address = %address, "Querying account streams");
        let collection = tokio::time::timeout(deadline, self.collector.collect(&address))
            .await
            .map_err(|_| OpsError::timeout("get_account_streams", millis(deadline)))?;

        self.summarize(address, collection)
    }

    fn summarize(&self, address: String, collection: Collection) -> OpsResult<AccountStreams> {
        let failed = collection.failed_sources();
        if !collection.reports.is_empty() && failed.len() == collection.reports.len() {
            let errors: Vec<String> = collection
                .reports
                .iter()
                .filter_map(|r| r.error.as_ref().map(|e| format!("{}: {}", r.source, e)))
                .collect();
            return Err(OpsError::AllSourcesFailed(errors.join("; ")));
        }

        let query_mode = if collection
            .reports
            .iter()
            .any(|r| r.source == SourceKind::GlobalTransactions && r.records > 0)
        {
            QueryMode::Fallback
        } else {
            QueryMode::MultiSource
        };

        let now = self.now();
        let streams: Vec<NormalizedStream> = dedup_records(collection.records)
            .iter()
            .map(|record| normalize_record(record, now))
            .collect();

        let incomplete = !failed.is_empty();
        let note = if incomplete {
            Some(incomplete_note(&failed))
        } else if streams.is_empty() {
            Some("no streams found for this address".to_string())
        } else {
            None
        };

        info!(
            address = %address,
            total = streams.len(),
            incomplete,
            "Account streams aggregated"
        );

        Ok(AccountStreams {
            total_count: streams.len(),
            incoming_count: collection.incoming_count,
            outgoing_count: collection.outgoing_count,
            streams,
            address,
            query_mode,
            sources: collection.reports,
            incomplete,
            note,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_incomplete_note_lists_sources() {
        let note = incomplete_note(&[SourceKind::SdkOutgoing, SourceKind::AccountEvents]);
        assert_eq!(
            note,
            "results may be incomplete: sdk_outgoing, account_events failed"
        );
    }

    #[test]
    fn test_account_streams_serialization_skips_complete_flag() {
        let result = AccountStreams {
            streams: vec![],
            total_count: 0,
            incoming_count: 0,
            outgoing_count: 0,
            address: "0xa".into(),
            query_mode: QueryMode::MultiSource,
            sources: vec![],
            incomplete: false,
            note: None,
        };
        let json = serde_json::to_value(&result).unwrap();
        assert!(json.get("incomplete").is_none());
        assert!(json.get("note").is_none());
        assert_eq!(json["query_mode"], "multi_source");
    }
}
