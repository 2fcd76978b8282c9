//! Raw stream scan command.

use moveflow_ops::StreamOperations;
use tracing::info;

use crate::error::CliResult;
use crate::output::{OutputFormat, Render};

/// Execute the query-streams command.
pub async fn query_streams(
    ops: &StreamOperations,
    address: &str,
    format: OutputFormat,
) -> CliResult<String> {
    let scan = ops.scan_streams(Some(address)).await?;
    info!(
        address = %scan.address,
        ids = scan.stream_ids.len(),
        details = scan.details.len(),
        "Scan finished"
    );
    Ok(scan.render(format))
}

#[cfg(test)]
mod tests {
    use super::*;
    use moveflow_test_utils::{
        stream_event, stream_view, test_operations, MockNodeApi, MockStreamSdk, TEST_CONTRACT,
    };

    const ALICE: &str = "0xa11ce";
    const BOB: &str = "0xb0b";

    #[tokio::test]
    async fn test_scan_renders_details() {
        let sender_handle = format!("{}::stream::SenderEvents", TEST_CONTRACT);
        let node = MockNodeApi::new()
            .with_handle_events(&sender_handle, "create_events", vec![stream_event("1", ALICE, BOB)])
            .with_view("1", stream_view("1", ALICE, BOB, "100000000"));
        let ops = test_operations(&MockStreamSdk::new(), &node, 150);

        let json = query_streams(&ops, ALICE, OutputFormat::Json).await.unwrap();
        let json: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(json["stream_ids"], serde_json::json!(["1"]));
        assert_eq!(json["details"][0]["amounts"]["total"], "1.00000000 APT");
    }

    #[tokio::test]
    async fn test_empty_scan_human() {
        colored::control::set_override(false);
        let ops = test_operations(&MockStreamSdk::new(), &MockNodeApi::new(), 150);

        let out = query_streams(&ops, ALICE, OutputFormat::Human).await.unwrap();
        assert!(out.contains("Stream scan for 0xa11ce"));
        assert!(out.contains("No stream ids found."));
    }
}
