//! Field resolution over raw stream records.
//!
//! Sources name the same field differently (`id` / `stream_id` / `streamId`,
//! `coin_type` / `asset_type`). Every known spelling of a field lives in one
//! [`FieldSpec`]; lookups take the first candidate that is present and
//! non-null. Candidates are dot-paths into nested objects.

use num_bigint::BigUint;
use serde_json::{Map, Value};

use moveflow_types::{normalize_address, Permission};

/// Revision of the candidate lists below. Bump when adding spellings.
pub const SCHEMA_VERSION: u32 = 2;

/// Known spellings of one logical field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    /// Logical name
    pub name: &'static str,
    /// Candidate dot-paths, most preferred first
    pub candidates: &'static [&'static str],
}

impl FieldSpec {
    pub const ID: FieldSpec = FieldSpec {
        name: "id",
        candidates: &["id", "stream_id", "streamId"],
    };
    pub const NAME: FieldSpec = FieldSpec {
        name: "name",
        candidates: &["name", "stream_name"],
    };
    pub const SENDER: FieldSpec = FieldSpec {
        name: "sender",
        candidates: &["sender", "from"],
    };
    pub const RECIPIENT: FieldSpec = FieldSpec {
        name: "recipient",
        candidates: &["recipient", "to"],
    };
    pub const DEPOSIT: FieldSpec = FieldSpec {
        name: "deposit",
        candidates: &["deposit_amount", "depositAmount"],
    };
    pub const WITHDRAWN: FieldSpec = FieldSpec {
        name: "withdrawn",
        candidates: &["withdrawn_amount", "withdrawnAmount"],
    };
    pub const RELEASED: FieldSpec = FieldSpec {
        name: "released",
        candidates: &["computed_amount", "streamed_amount", "released_amount"],
    };
    pub const WITHDRAWABLE: FieldSpec = FieldSpec {
        name: "withdrawable",
        candidates: &["withdrawable_amount", "available_amount"],
    };
    pub const REMAINING: FieldSpec = FieldSpec {
        name: "remaining",
        candidates: &["remaining_amount", "remainingAmount"],
    };
    pub const TOKEN_TYPE: FieldSpec = FieldSpec {
        name: "token_type",
        candidates: &["coin_type", "asset_type", "coinType", "token_type", "metadata.inner"],
    };
    pub const CREATED: FieldSpec = FieldSpec {
        name: "created",
        candidates: &["created_at", "create_at", "createdAt"],
    };
    pub const START: FieldSpec = FieldSpec {
        name: "start",
        candidates: &["start_time", "startTime"],
    };
    pub const STOP: FieldSpec = FieldSpec {
        name: "stop",
        candidates: &["stop_time", "end_time", "stopTime"],
    };
    pub const INTERVAL: FieldSpec = FieldSpec {
        name: "interval",
        candidates: &["interval", "rate_interval"],
    };
    pub const PAUSED: FieldSpec = FieldSpec {
        name: "paused",
        candidates: &["paused", "is_paused", "pause_info.paused"],
    };
    pub const CLOSED: FieldSpec = FieldSpec {
        name: "closed",
        candidates: &["closed", "is_closed"],
    };
    pub const PAUSEABLE: FieldSpec = FieldSpec {
        name: "pauseable",
        candidates: &["pauseable", "feature_info.pauseable"],
    };
    pub const CLOSEABLE: FieldSpec = FieldSpec {
        name: "closeable",
        candidates: &["closeable", "feature_info.closeable"],
    };
    pub const RECIPIENT_MODIFIABLE: FieldSpec = FieldSpec {
        name: "recipient_modifiable",
        candidates: &[
            "recipient_modifiable",
            "recipientModifiable",
            "feature_info.recipient_modifiable",
        ],
    };
    pub const REMARK: FieldSpec = FieldSpec {
        name: "remark",
        candidates: &["_remark", "remark"],
    };
}

/// Follow a dot-path through nested objects.
fn lookup<'a>(fields: &'a Map<String, Value>, path: &str) -> Option<&'a Value> {
    let mut segments = path.split('.');
    let first = segments.next()?;
    let mut current = fields.get(first)?;
    for segment in segments {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

/// Value of the first candidate that is present and non-null.
pub fn resolve<'a>(fields: &'a Map<String, Value>, candidates: &[&str]) -> Option<&'a Value> {
    candidates
        .iter()
        .filter_map(|path| lookup(fields, path))
        .find(|v| !v.is_null())
}

/// Like [`resolve`], falling back to `default`.
pub fn resolve_or<'a>(
    fields: &'a Map<String, Value>,
    candidates: &[&str],
    default: &'a Value,
) -> &'a Value {
    resolve(fields, candidates).unwrap_or(default)
}

/// Unwrap `{ "inner": ... }` wrappers used for addresses and object refs.
fn unwrap_inner(value: &Value) -> &Value {
    match value.as_object().and_then(|o| o.get("inner")) {
        Some(inner) => inner,
        None => value,
    }
}

/// Resolve a non-empty string. Numbers render in decimal.
pub fn resolve_string(fields: &Map<String, Value>, spec: &FieldSpec) -> Option<String> {
    match unwrap_inner(resolve(fields, spec.candidates)?) {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Resolve an account address, normalized.
pub fn resolve_address(fields: &Map<String, Value>, spec: &FieldSpec) -> Option<String> {
    match unwrap_inner(resolve(fields, spec.candidates)?) {
        Value::String(s) => {
            let normalized = normalize_address(s);
            (!normalized.is_empty()).then_some(normalized)
        }
        _ => None,
    }
}

/// Resolve a u64 from a JSON number or a numeric string.
pub fn resolve_u64(fields: &Map<String, Value>, spec: &FieldSpec) -> Option<u64> {
    match resolve(fields, spec.candidates)? {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Resolve a bool from a JSON bool or `"true"` / `"false"`.
pub fn resolve_bool(fields: &Map<String, Value>, spec: &FieldSpec) -> Option<bool> {
    match resolve(fields, spec.candidates)? {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// Resolve a base-unit amount from an integer string or non-negative integer.
pub fn resolve_amount(fields: &Map<String, Value>, spec: &FieldSpec) -> Option<BigUint> {
    match resolve(fields, spec.candidates)? {
        Value::Number(n) => n.as_u64().map(BigUint::from),
        Value::String(s) => {
            let digits = s.trim();
            if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            BigUint::parse_bytes(digits.as_bytes(), 10)
        }
        _ => None,
    }
}

/// Resolve a permission from its name or on-chain number.
pub fn resolve_permission(fields: &Map<String, Value>, spec: &FieldSpec) -> Option<Permission> {
    match resolve(fields, spec.candidates)? {
        Value::String(s) => s.parse().ok(),
        Value::Number(n) => n
            .as_u64()
            .and_then(|v| u8::try_from(v).ok())
            .and_then(Permission::from_u8),
        _ => None,
    }
}
