//! Raw stream records as delivered by upstream sources.
//!
//! Key names differ between sources and protocol versions, so each record
//! keeps its fields in an open bag next to a tag describing its origin.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::stream::RecordSource;

/// Origin of a raw record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum RecordOrigin {
    /// Stream SDK fetch or listing
    Sdk,
    /// On-chain view function result
    View,
    /// Decoded event payload
    Event { event_type: String },
    /// Event extracted from a transaction
    Transaction { version: String },
}

/// One raw stream record from a single source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    pub origin: RecordOrigin,
    pub fields: Map<String, Value>,
}

impl RawRecord {
    /// Build a record, unwrapping a `decoded_value` envelope if present.
    pub fn new(origin: RecordOrigin, fields: Map<String, Value>) -> Self {
        Self {
            origin,
            fields: unwrap_decoded(fields),
        }
    }

    /// Build a record from any JSON value. Non-objects yield `None`.
    pub fn from_value(origin: RecordOrigin, value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self::new(origin, map)),
            _ => None,
        }
    }

    pub fn sdk(fields: Map<String, Value>) -> Self {
        Self::new(RecordOrigin::Sdk, fields)
    }

    pub fn view(fields: Map<String, Value>) -> Self {
        Self::new(RecordOrigin::View, fields)
    }

    /// True for records reconstructed from events, which carry partial state.
    pub fn is_event_derived(&self) -> bool {
        matches!(
            self.origin,
            RecordOrigin::Event { .. } | RecordOrigin::Transaction { .. }
        )
    }

    pub fn source(&self) -> RecordSource {
        match self.origin {
            RecordOrigin::Sdk => RecordSource::Sdk,
            RecordOrigin::View => RecordSource::View,
            RecordOrigin::Event { .. } => RecordSource::Event,
            RecordOrigin::Transaction { .. } => RecordSource::Transaction,
        }
    }

    /// Number of non-null leaf values, counting through nested objects and arrays.
    pub fn populated_field_count(&self) -> usize {
        self.fields.values().map(count_leaves).sum()
    }
}

fn unwrap_decoded(mut fields: Map<String, Value>) -> Map<String, Value> {
    if let Some(Value::Object(_)) = fields.get("decoded_value") {
        if let Some(Value::Object(inner)) = fields.remove("decoded_value") {
            return inner;
        }
    }
    fields
}

fn count_leaves(value: &Value) -> usize {
    match value {
        Value::Null => 0,
        Value::Object(map) => map.values().map(count_leaves).sum(),
        Value::Array(items) => items.iter().map(count_leaves).sum(),
        _ => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obj(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_decoded_value_is_unwrapped() {
        let record = RawRecord::sdk(obj(json!({
            "decoded_value": { "id": "5", "sender": "0xa" },
            "type": "0x1::stream::Stream"
        })));
        assert_eq!(record.fields.get("id"), Some(&json!("5")));
        assert!(!record.fields.contains_key("type"));
    }

    #[test]
    fn test_non_object_decoded_value_kept() {
        let record = RawRecord::sdk(obj(json!({ "decoded_value": "raw", "id": "1" })));
        assert_eq!(record.fields.get("decoded_value"), Some(&json!("raw")));
    }

    #[test]
    fn test_event_derived() {
        let event = RawRecord::new(
            RecordOrigin::Event {
                event_type: "0x1::stream::StreamEvent".into(),
            },
            Map::new(),
        );
        assert!(event.is_event_derived());
        assert_eq!(event.source(), RecordSource::Event);
        assert!(!RawRecord::view(Map::new()).is_event_derived());
    }

    #[test]
    fn test_populated_field_count() {
        let record = RawRecord::sdk(obj(json!({
            "id": "1",
            "sender": null,
            "coin_type": { "inner": "0x1::aptos_coin::AptosCoin", "extra": null },
            "tags": ["a", null, 3]
        })));
        assert_eq!(record.populated_field_count(), 4);
    }

    #[test]
    fn test_from_value_rejects_non_object() {
        assert!(RawRecord::from_value(RecordOrigin::Sdk, json!([1, 2])).is_none());
        assert!(RawRecord::from_value(RecordOrigin::Sdk, json!({"id": 1})).is_some());
    }
}
