//! End-to-end account stream aggregation tests.
//!
//! These run the full collect → dedup → normalize pipeline against the
//! in-memory SDK and node mocks.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;

use moveflow_ops::{FixedClock, OpsError, QueryMode, SourceKind, StreamOperations};
use moveflow_test_utils::{
    event_json, sdk_record, stream_event, stream_view, test_config, test_operations,
    transaction_json, Failure, MockNodeApi, MockStreamSdk, NodeEndpoint, TEST_CONTRACT,
};
use moveflow_types::{RecordSource, StreamDirection, StreamStatus};

const ALICE: &str = "0xa";
const BOB: &str = "0xb";
const NOW: u64 = 150;

fn incoming_record() -> moveflow_types::RawRecord {
    sdk_record(json!({
        "id": "7",
        "sender": ALICE,
        "recipient": BOB,
        "deposit_amount": "100000000",
        "start_time": "100",
        "stop_time": "200",
    }))
}

fn sender_handle() -> String {
    format!("{}::stream::SenderEvents", TEST_CONTRACT)
}

// ============ DEDUP AND NORMALIZATION ============

#[tokio::test]
async fn test_duplicate_across_sources_yields_one_entry() {
    let sdk = MockStreamSdk::new().with_listing(BOB, StreamDirection::Incoming, vec![incoming_record()]);
    let node = MockNodeApi::new().with_account_events(
        BOB,
        vec![event_json(
            &format!("{}::stream::StreamEvent", TEST_CONTRACT),
            json!({"stream_id": "7", "paused": false}),
        )],
    );
    let ops = test_operations(&sdk, &node, NOW);

    let result = ops.get_account_streams(Some(BOB)).await.unwrap();

    assert_eq!(result.streams.len(), 1);
    assert_eq!(result.total_count, 1);
    assert_eq!(result.incoming_count, 1);
    assert_eq!(result.outgoing_count, 0);
    assert!(!result.incomplete);
    assert_eq!(result.query_mode, QueryMode::MultiSource);

    let stream = &result.streams[0];
    assert_eq!(stream.stream_id, "7");
    assert_eq!(stream.amounts.total.as_deref(), Some("1.00000000 APT"));
    assert_eq!(stream.status, Some(StreamStatus::Active));
    assert_eq!(stream.progress.as_deref(), Some("50%"));
    assert_eq!(stream.sender.as_deref(), Some(ALICE));
    assert_eq!(stream.source, RecordSource::Sdk);

    // The id was already known, so no view lookups happen
    assert_eq!(node.calls(NodeEndpoint::View), 0);
}

#[tokio::test]
async fn test_richer_event_duplicate_replaces_listing_record() {
    let sdk = MockStreamSdk::new().with_listing(BOB, StreamDirection::Incoming, vec![incoming_record()]);
    let node = MockNodeApi::new().with_account_events(
        BOB,
        vec![event_json(
            &format!("{}::stream::StreamEvent", TEST_CONTRACT),
            json!({
                "stream_id": "7",
                "sender": ALICE,
                "recipient": BOB,
                "deposit_amount": "100000000",
                "start_time": "100",
                "stop_time": "200",
                "paused": false,
            }),
        )],
    );
    let ops = test_operations(&sdk, &node, NOW);

    let result = ops.get_account_streams(Some(BOB)).await.unwrap();

    assert_eq!(result.streams.len(), 1);
    assert_eq!(result.incoming_count, 1);

    let stream = &result.streams[0];
    assert_eq!(stream.stream_id, "7");
    // One more populated field than the listing record, so the event wins
    assert_eq!(stream.source, RecordSource::Event);
    assert_eq!(stream.amounts.total.as_deref(), Some("1.00000000 APT"));
    assert_eq!(stream.status, Some(StreamStatus::Active));
    assert_eq!(stream.progress.as_deref(), Some("50%"));
}

#[tokio::test]
async fn test_query_is_idempotent() {
    let sdk = MockStreamSdk::new().with_listing(BOB, StreamDirection::Incoming, vec![incoming_record()]);
    let node = MockNodeApi::new();
    let ops = test_operations(&sdk, &node, NOW);

    let first = ops.get_account_streams(Some(BOB)).await.unwrap();
    let second = ops.get_account_streams(Some(BOB)).await.unwrap();
    assert_eq!(first.streams, second.streams);
}

#[tokio::test]
async fn test_address_is_normalized() {
    let sdk = MockStreamSdk::new().with_listing(BOB, StreamDirection::Incoming, vec![incoming_record()]);
    let ops = test_operations(&sdk, &MockNodeApi::new(), NOW);

    let result = ops.get_account_streams(Some("  B ")).await.unwrap();
    assert_eq!(result.address, "0xb");
    assert_eq!(result.total_count, 1);
}

// ============ PARTIAL FAILURE ============

#[tokio::test]
async fn test_outgoing_failure_marks_result_incomplete() {
    let sdk = MockStreamSdk::new()
        .with_listing(BOB, StreamDirection::Incoming, vec![incoming_record()])
        .with_list_failure(StreamDirection::Outgoing, Failure::Network);
    let ops = test_operations(&sdk, &MockNodeApi::new(), NOW);

    let result = ops.get_account_streams(Some(BOB)).await.unwrap();

    assert_eq!(result.streams.len(), 1);
    assert_eq!(result.streams[0].stream_id, "7");
    assert!(result.incomplete);
    let note = result.note.unwrap();
    assert!(note.contains("incomplete"));
    assert!(note.contains("sdk_outgoing"));

    // One attempt plus three retries
    assert_eq!(sdk.list_calls(StreamDirection::Outgoing), 4);
    let failed: Vec<_> = result.sources.iter().filter(|s| !s.ok).map(|s| s.source).collect();
    assert_eq!(failed, vec![SourceKind::SdkOutgoing]);
}

#[tokio::test]
async fn test_malformed_source_is_not_retried() {
    let sdk = MockStreamSdk::new()
        .with_listing(BOB, StreamDirection::Incoming, vec![incoming_record()])
        .with_list_failure(StreamDirection::Outgoing, Failure::Malformed);
    let ops = test_operations(&sdk, &MockNodeApi::new(), NOW);

    let result = ops.get_account_streams(Some(BOB)).await.unwrap();
    assert!(result.incomplete);
    assert_eq!(sdk.list_calls(StreamDirection::Outgoing), 1);
}

#[tokio::test]
async fn test_every_source_failing_is_an_error() {
    let sdk = MockStreamSdk::new()
        .with_list_failure(StreamDirection::Incoming, Failure::Malformed)
        .with_list_failure(StreamDirection::Outgoing, Failure::Malformed);
    let node = MockNodeApi::new()
        .with_failure(NodeEndpoint::AccountEvents, Failure::Malformed)
        .with_failure(NodeEndpoint::AccountTransactions, Failure::Malformed)
        .with_failure(NodeEndpoint::EventHandle, Failure::Malformed)
        .with_failure(NodeEndpoint::Transactions, Failure::Malformed);
    let ops = test_operations(&sdk, &node, NOW);

    let err = ops.get_account_streams(Some(BOB)).await.unwrap_err();
    assert!(matches!(err, OpsError::AllSourcesFailed(_)));
    assert!(!err.suggestion().is_empty());
}

// ============ FALLBACK AND ENRICHMENT ============

#[tokio::test]
async fn test_bare_ids_are_enriched_through_view() {
    let node = MockNodeApi::new()
        .with_account_transactions(
            BOB,
            vec![transaction_json(
                10,
                &format!("{}::stream::create", TEST_CONTRACT),
                vec![stream_event("9", ALICE, BOB)],
            )],
        )
        .with_view("9", stream_view("9", ALICE, BOB, "300000000"));
    let ops = test_operations(&MockStreamSdk::new(), &node, NOW);

    let result = ops.get_account_streams(Some(BOB)).await.unwrap();

    assert_eq!(result.streams.len(), 1);
    let stream = &result.streams[0];
    assert_eq!(stream.source, RecordSource::View);
    assert_eq!(stream.amounts.total.as_deref(), Some("3.00000000 APT"));
    assert_eq!(stream.status, Some(StreamStatus::Active));
    assert_eq!(node.calls(NodeEndpoint::View), 1);
}

#[tokio::test]
async fn test_enrichment_is_bounded() {
    let events = (1..=7).map(|i| stream_event(&i.to_string(), ALICE, BOB)).collect();
    let node = MockNodeApi::new().with_handle_events(&sender_handle(), "create_events", events);
    let ops = test_operations(&MockStreamSdk::new(), &node, NOW);

    let result = ops.get_account_streams(Some(ALICE)).await.unwrap();

    // Unresolved lookups keep their event records
    assert_eq!(result.total_count, 7);
    assert_eq!(node.calls(NodeEndpoint::View), 5);
    assert!(result
        .streams
        .iter()
        .all(|s| s.source == RecordSource::Event && s.status.is_none()));
}

#[tokio::test]
async fn test_global_feed_is_last_resort() {
    let node = MockNodeApi::new().with_transactions(vec![
        transaction_json(
            20,
            &format!("{}::stream::create", TEST_CONTRACT),
            vec![stream_event("11", ALICE, BOB), stream_event("12", "0xc", "0xd")],
        ),
        transaction_json(21, "0x1::coin::transfer", vec![]),
    ]);
    let ops = test_operations(&MockStreamSdk::new(), &node, NOW);

    let result = ops.get_account_streams(Some(ALICE)).await.unwrap();

    assert_eq!(result.query_mode, QueryMode::Fallback);
    assert_eq!(result.total_count, 1);
    assert_eq!(result.streams[0].stream_id, "11");
    assert_eq!(result.streams[0].source, RecordSource::Transaction);
    assert_eq!(node.calls(NodeEndpoint::Transactions), 1);
}

#[tokio::test]
async fn test_global_feed_skipped_when_primary_has_data() {
    let sdk = MockStreamSdk::new().with_listing(BOB, StreamDirection::Incoming, vec![incoming_record()]);
    let node = MockNodeApi::new();
    let ops = test_operations(&sdk, &node, NOW);

    ops.get_account_streams(Some(BOB)).await.unwrap();
    assert_eq!(node.calls(NodeEndpoint::Transactions), 0);
}

#[tokio::test]
async fn test_empty_account_has_note() {
    let ops = test_operations(&MockStreamSdk::new(), &MockNodeApi::new(), NOW);
    let result = ops.get_account_streams(Some(BOB)).await.unwrap();
    assert!(result.streams.is_empty());
    assert!(!result.incomplete);
    assert!(result.note.is_some());
}

// ============ ADDRESSES AND DEADLINES ============

#[tokio::test]
async fn test_missing_address_uses_current_account() {
    let sdk = MockStreamSdk::new()
        .with_sender(BOB)
        .with_listing(BOB, StreamDirection::Incoming, vec![incoming_record()]);
    let ops = test_operations(&sdk, &MockNodeApi::new(), NOW);

    let result = ops.get_account_streams(None).await.unwrap();
    assert_eq!(result.address, BOB);
    assert_eq!(result.total_count, 1);

    let result = ops.get_account_streams(Some("")).await.unwrap();
    assert_eq!(result.address, BOB);
}

#[tokio::test]
async fn test_no_address_and_no_account() {
    let ops = test_operations(&MockStreamSdk::new(), &MockNodeApi::new(), NOW);
    let err = ops.get_account_streams(None).await.unwrap_err();
    assert!(matches!(err, OpsError::NoAccount));
}

#[tokio::test]
async fn test_overall_deadline() {
    let mut config = test_config();
    config.timeouts.account_streams = Duration::from_millis(50);
    let node = MockNodeApi::new().with_delay(NodeEndpoint::AccountEvents, Duration::from_secs(5));
    let ops = StreamOperations::new(Arc::new(MockStreamSdk::new()), Arc::new(node), config)
        .with_clock(Arc::new(FixedClock(NOW)));

    let err = ops.get_account_streams(Some(BOB)).await.unwrap_err();
    assert!(matches!(err, OpsError::Timeout { millis: 50, .. }));
}
