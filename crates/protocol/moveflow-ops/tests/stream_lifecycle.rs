//! Single-stream lookups, creation, cancellation, balances and scans.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::json;

use moveflow_ops::{BatchCreateRequest, FixedClock, OpsError, StreamOperations};
use moveflow_test_utils::{
    coin_store, sdk_record, stream_event, stream_view, test_config, test_operations, Failure,
    MockNodeApi, MockStreamSdk, NodeEndpoint, TEST_CONTRACT,
};
use moveflow_types::{ErrorCode, Permission, RecordSource, StreamStatus, APT_COIN_TYPE};

const ALICE: &str = "0xa11ce";
const BOB: &str = "0xb0b";
const NOW: u64 = 150;

fn stream_events_handle() -> String {
    format!("{}::stream::StreamEvent", TEST_CONTRACT)
}

fn known_stream(id: &str) -> MockStreamSdk {
    MockStreamSdk::new().with_stream(id, sdk_record(stream_view(id, ALICE, BOB, "100000000")))
}

// ============ GET STREAM ============

#[tokio::test]
async fn test_get_stream_from_sdk() {
    let sdk = known_stream("5");
    let node = MockNodeApi::new();
    let ops = test_operations(&sdk, &node, NOW);

    let stream = ops.get_stream("5").await.unwrap();
    assert_eq!(stream.stream_id, "5");
    assert_eq!(stream.source, RecordSource::Sdk);
    assert_eq!(stream.status, Some(StreamStatus::Active));
    assert_eq!(stream.amounts.total.as_deref(), Some("1.00000000 APT"));
    assert_eq!(stream.amounts.withdrawn.as_deref(), Some("0.00000000 APT"));
    assert_eq!(stream.times.interval.as_deref(), Some("10s"));
    assert_eq!(node.calls(NodeEndpoint::EventHandle), 0);
}

#[tokio::test]
async fn test_get_stream_retries_transient_failures() {
    let sdk = known_stream("5").with_transient_fetch_failure(Failure::Unavailable, 2);
    let ops = test_operations(&sdk, &MockNodeApi::new(), NOW);

    let stream = ops.get_stream("5").await.unwrap();
    assert_eq!(stream.stream_id, "5");
    assert_eq!(sdk.fetch_calls(), 3);
}

#[tokio::test]
async fn test_get_stream_falls_back_to_events() {
    let sdk = MockStreamSdk::new().with_fetch_failure(Failure::Network);
    let node = MockNodeApi::new().with_handle_events(
        &stream_events_handle(),
        "create_events",
        vec![stream_event("8", ALICE, BOB), stream_event("9", BOB, ALICE)],
    );
    let ops = test_operations(&sdk, &node, NOW);

    let stream = ops.get_stream("8").await.unwrap();
    assert_eq!(stream.stream_id, "8");
    assert_eq!(stream.source, RecordSource::Event);
    assert_eq!(stream.sender.as_deref(), Some(ALICE));
    assert_eq!(stream.recipient.as_deref(), Some(BOB));
    // Events carry neither flags nor a window
    assert!(stream.status.is_none());
    assert!(stream.progress.is_none());
    assert_eq!(sdk.fetch_calls(), 4);
}

#[tokio::test]
async fn test_get_stream_not_found() {
    let ops = test_operations(&MockStreamSdk::new(), &MockNodeApi::new(), NOW);

    let err = ops.get_stream("42").await.unwrap_err();
    assert!(matches!(err, OpsError::StreamNotFound(ref id) if id == "42"));
    assert_eq!(err.error_code(), ErrorCode::StreamNotFound);

    let err = ops.get_stream("   ").await.unwrap_err();
    assert!(matches!(err, OpsError::StreamNotFound(_)));
}

#[tokio::test]
async fn test_get_stream_deadline_covers_both_lookups() {
    let mut config = test_config();
    config.timeouts.stream_info = Duration::from_millis(200);
    let sdk = known_stream("5").with_fetch_delay(Duration::from_secs(5));
    let node = MockNodeApi::new().with_delay(NodeEndpoint::EventHandle, Duration::from_secs(5));
    let ops = StreamOperations::new(Arc::new(sdk), Arc::new(node), config)
        .with_clock(Arc::new(FixedClock(NOW)));

    let started = Instant::now();
    let err = ops.get_stream("5").await.unwrap_err();
    let elapsed = started.elapsed();

    assert!(matches!(err, OpsError::Timeout { millis: 200, .. }));
    assert_eq!(err.error_code(), ErrorCode::Timeout);
    // A slow SDK must not leave the event search a fresh deadline
    assert!(elapsed < Duration::from_millis(350), "took {:?}", elapsed);
}

#[tokio::test]
async fn test_get_stream_malformed_is_not_retried() {
    let sdk = MockStreamSdk::new().with_fetch_failure(Failure::Malformed);
    let ops = test_operations(&sdk, &MockNodeApi::new(), NOW);

    let err = ops.get_stream("5").await.unwrap_err();
    assert_eq!(err.error_code(), ErrorCode::MalformedResponse);
    assert_eq!(sdk.fetch_calls(), 1);
}

// ============ CREATE AND CANCEL ============

fn request(recipients: &[&str], amounts: &[&str]) -> BatchCreateRequest {
    BatchCreateRequest {
        recipients: recipients.iter().map(|s| s.to_string()).collect(),
        amounts: amounts.iter().map(|s| s.to_string()).collect(),
        token_type: "APT".into(),
        duration: 3600,
        ..Default::default()
    }
}

#[tokio::test]
async fn test_batch_create_submits_one_transaction() {
    let sdk = MockStreamSdk::new();
    let ops = test_operations(&sdk, &MockNodeApi::new(), 1_000);

    let result = ops
        .batch_create_streams(&request(&[ALICE, "0xB0B"], &["1", "0.5"]))
        .await
        .unwrap();

    assert_eq!(result.streams_created, 2);
    assert_eq!(result.recipients, vec![ALICE.to_string(), BOB.to_string()]);
    assert_eq!(result.names, vec!["MCP stream 1", "MCP stream 2"]);
    assert_eq!(result.amounts, vec!["1.00000000 APT", "0.50000000 APT"]);
    assert!(result.transaction.success);
    assert_eq!(result.token.token_type, APT_COIN_TYPE);

    let batches = sdk.batches();
    assert_eq!(batches.len(), 1);
    assert!(sdk.created().is_empty());
    assert_eq!(batches[0].deposit_amounts, vec![100_000_000, 50_000_000]);
    assert_eq!(batches[0].terms.start_time, 1_300);
    assert_eq!(batches[0].terms.stop_time, 4_900);
}

#[tokio::test]
async fn test_single_recipient_uses_single_create() {
    let sdk = MockStreamSdk::new();
    let ops = test_operations(&sdk, &MockNodeApi::new(), 1_000);

    let mut req = request(&[BOB], &["2"]);
    req.names = Some(vec!["salary".into()]);
    req.pauseable = Some(Permission::Both);
    let result = ops.batch_create_streams(&req).await.unwrap();

    assert_eq!(result.streams_created, 1);
    assert_eq!(result.permissions.pauseable, Permission::Both);
    let created = sdk.created();
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].name, "salary");
    assert_eq!(created[0].deposit_amount, 200_000_000);
    assert!(sdk.batches().is_empty());
}

#[tokio::test]
async fn test_invalid_batch_never_submits() {
    let sdk = MockStreamSdk::new();
    let ops = test_operations(&sdk, &MockNodeApi::new(), 1_000);

    let err = ops
        .batch_create_streams(&request(&[ALICE, BOB], &["1"]))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        OpsError::LengthMismatch {
            recipients: 2,
            amounts: 1
        }
    ));

    let err = ops
        .batch_create_streams(&request(&[ALICE, "not-an-address"], &["1", "1"]))
        .await
        .unwrap_err();
    assert!(matches!(err, OpsError::InvalidAddress(_)));
    assert!(err.is_validation());

    assert_eq!(sdk.write_count(), 0);
}

#[tokio::test]
async fn test_write_failure_surfaces() {
    let sdk = MockStreamSdk::new().with_write_failure(Failure::Network);
    let ops = test_operations(&sdk, &MockNodeApi::new(), 1_000);

    let err = ops
        .batch_create_streams(&request(&[ALICE, BOB], &["1", "1"]))
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), ErrorCode::ConnectionFailed);
    assert_eq!(sdk.write_count(), 0);
}

#[tokio::test]
async fn test_cancel_stream() {
    let sdk = known_stream("5");
    let ops = test_operations(&sdk, &MockNodeApi::new(), NOW);

    let result = ops.cancel_stream(" 5 ").await.unwrap();
    assert_eq!(result.stream_id, "5");
    assert_eq!(sdk.closed(), vec!["5".to_string()]);

    let err = ops.cancel_stream("99").await.unwrap_err();
    assert_eq!(err.error_code(), ErrorCode::StreamNotFound);

    let err = ops.cancel_stream("").await.unwrap_err();
    assert!(matches!(err, OpsError::StreamNotFound(_)));
    assert_eq!(sdk.closed().len(), 1);
}

// ============ WALLET BALANCE ============

#[tokio::test]
async fn test_native_balance() {
    let node = MockNodeApi::new().with_resources(
        ALICE,
        json!([
            {"type": "0x1::account::Account", "data": {}},
            coin_store(APT_COIN_TYPE, "250000000"),
        ]),
    );
    let ops = test_operations(&MockStreamSdk::new(), &node, NOW);

    let balance = ops.get_wallet_balance(Some(ALICE), None).await.unwrap();
    assert_eq!(balance.balance, "2.50000000 APT");
    assert_eq!(balance.raw_balance, "250000000");
    assert_eq!(balance.token_type, APT_COIN_TYPE);
    assert_eq!(balance.address, ALICE);
}

#[tokio::test]
async fn test_balance_of_other_token() {
    let node = MockNodeApi::new().with_resources(
        ALICE,
        json!([
            coin_store(APT_COIN_TYPE, "1"),
            coin_store("0x9::wrapped::USDC", "1234567"),
        ]),
    );
    let ops = test_operations(&MockStreamSdk::new(), &node, NOW);

    let balance = ops.get_wallet_balance(Some(ALICE), Some("USDC")).await.unwrap();
    assert_eq!(balance.balance, "1,234,567 USDC");
    assert_eq!(balance.token_type, "0x9::wrapped::USDC");
}

#[tokio::test]
async fn test_balance_of_missing_account() {
    let node = MockNodeApi::new().with_missing_account(ALICE);
    let ops = test_operations(&MockStreamSdk::new(), &node, NOW);

    let err = ops.get_wallet_balance(Some(ALICE), None).await.unwrap_err();
    match err {
        OpsError::AccountNotFound {
            address,
            network,
            ledger_version,
        } => {
            assert_eq!(address, ALICE);
            assert_eq!(network, "testnet");
            assert_eq!(ledger_version, Some(4242));
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_balance_non_array_resources() {
    let node = MockNodeApi::new().with_resources(ALICE, json!({"message": "rate limited"}));
    let ops = test_operations(&MockStreamSdk::new(), &node, NOW);

    let err = ops.get_wallet_balance(Some(ALICE), None).await.unwrap_err();
    match err {
        OpsError::Malformed { raw_data, .. } => {
            assert_eq!(raw_data, Some(json!({"message": "rate limited"})));
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_balance_without_coin_store() {
    let node = MockNodeApi::new().with_resources(
        ALICE,
        json!([{"type": "0x1::account::Account", "data": {}}]),
    );
    let ops = test_operations(&MockStreamSdk::new(), &node, NOW);

    let err = ops.get_wallet_balance(Some(ALICE), None).await.unwrap_err();
    match err {
        OpsError::TokenNotFound {
            available_resources,
            ..
        } => assert_eq!(available_resources, vec!["0x1::account::Account".to_string()]),
        other => panic!("unexpected error: {:?}", other),
    }
}

// ============ SCAN ============

#[tokio::test]
async fn test_scan_resolves_details() {
    let sender_handle = format!("{}::stream::SenderEvents", TEST_CONTRACT);
    let node = MockNodeApi::new()
        .with_handle_events(
            &sender_handle,
            "create_events",
            vec![stream_event("1", ALICE, BOB), stream_event("2", ALICE, BOB)],
        )
        .with_view("1", stream_view("1", ALICE, BOB, "100000000"));
    let ops = test_operations(&MockStreamSdk::new(), &node, NOW);

    let scan = ops.scan_streams(Some(ALICE)).await.unwrap();
    assert_eq!(scan.stream_ids, vec!["1".to_string(), "2".to_string()]);
    assert_eq!(scan.skipped_ids, 0);
    assert_eq!(scan.details.len(), 1);
    assert_eq!(scan.details[0].source, RecordSource::View);
    assert!(scan.table_resources.is_empty());
    assert!(scan.sample_events.is_empty());
    assert!(scan.sources.iter().all(|s| s.ok));
}

#[tokio::test]
async fn test_scan_lists_tables_when_nothing_resolves() {
    let sender_handle = format!("{}::stream::SenderEvents", TEST_CONTRACT);
    let events = (1..=4).map(|i| stream_event(&i.to_string(), ALICE, BOB)).collect();
    let node = MockNodeApi::new()
        .with_handle_events(&sender_handle, "create_events", events)
        .with_resources(
            TEST_CONTRACT,
            json!([
                {"type": "0x1::table::Table<u64, 0xc0ffee::stream::StreamInfo>", "data": {}},
                {"type": "0xc0ffee::stream::GlobalConfig", "data": {}},
            ]),
        );
    let ops = test_operations(&MockStreamSdk::new(), &node, NOW);

    let scan = ops.scan_streams(Some(ALICE)).await.unwrap();
    assert_eq!(scan.stream_ids.len(), 4);
    assert!(scan.details.is_empty());
    assert_eq!(
        scan.table_resources,
        vec!["0x1::table::Table<u64, 0xc0ffee::stream::StreamInfo>".to_string()]
    );
    assert_eq!(scan.sample_events.len(), 3);
}
