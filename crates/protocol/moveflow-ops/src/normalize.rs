//! Raw record to [`NormalizedStream`].
//!
//! Every output field comes from a resolved source field; nothing is
//! invented. Fields that cannot be derived are left out.

use chrono::DateTime;
use num_bigint::BigUint;

use moveflow_types::{
    format_base_units, is_native, NormalizedStream, Permission, Permissions, RawRecord,
    StreamAmounts, StreamTimes, TokenInfo, APT_COIN_TYPE, UNKNOWN_STREAM_ID,
};

use crate::resolver::{
    resolve_address, resolve_amount, resolve_permission, resolve_string, resolve_u64, FieldSpec,
};
use crate::status::{derive_progress, derive_status};

/// Render unix seconds as `YYYY-MM-DD HH:MM:SS UTC`.
pub fn format_timestamp(secs: u64) -> Option<String> {
    let secs = i64::try_from(secs).ok()?;
    DateTime::from_timestamp(secs, 0).map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
}

/// Amount with token suffix. The native formatter already appends `APT`.
pub fn display_amount(value: &BigUint, token: &TokenInfo) -> String {
    let formatted = format_base_units(value, &token.token_type);
    if is_native(&token.token_type) {
        formatted
    } else {
        format!("{} {}", formatted, token.name)
    }
}

fn nonzero_time(record: &RawRecord, spec: &FieldSpec) -> Option<String> {
    resolve_u64(&record.fields, spec)
        .filter(|t| *t != 0)
        .and_then(format_timestamp)
}

fn amounts(record: &RawRecord, token: &TokenInfo) -> StreamAmounts {
    let fields = &record.fields;
    let deposit = resolve_amount(fields, &FieldSpec::DEPOSIT);
    let withdrawn = resolve_amount(fields, &FieldSpec::WITHDRAWN);
    let released = resolve_amount(fields, &FieldSpec::RELEASED);

    let available = match (&released, &withdrawn) {
        (Some(r), Some(w)) if r >= w => Some(r - w),
        _ => resolve_amount(fields, &FieldSpec::WITHDRAWABLE),
    };
    let remaining = match (&deposit, &released) {
        (Some(d), Some(r)) if d >= r => Some(d - r),
        _ => resolve_amount(fields, &FieldSpec::REMAINING),
    };

    let show = |v: Option<BigUint>| v.map(|v| display_amount(&v, token));
    StreamAmounts {
        total: show(deposit),
        withdrawn: show(withdrawn),
        available: show(available),
        remaining: show(remaining),
    }
}

/// Normalize one raw record at time `now`.
pub fn normalize_record(record: &RawRecord, now: u64) -> NormalizedStream {
    let fields = &record.fields;

    let token_type = resolve_string(fields, &FieldSpec::TOKEN_TYPE)
        .unwrap_or_else(|| APT_COIN_TYPE.to_string());
    let token = TokenInfo::from_type(token_type);

    let defaults = Permissions::default();
    let permission = |spec: &FieldSpec, default: Permission| {
        resolve_permission(fields, spec).unwrap_or(default)
    };

    NormalizedStream {
        stream_id: resolve_string(fields, &FieldSpec::ID)
            .unwrap_or_else(|| UNKNOWN_STREAM_ID.to_string()),
        name: resolve_string(fields, &FieldSpec::NAME),
        sender: resolve_address(fields, &FieldSpec::SENDER),
        recipient: resolve_address(fields, &FieldSpec::RECIPIENT),
        amounts: amounts(record, &token),
        times: StreamTimes {
            created: nonzero_time(record, &FieldSpec::CREATED),
            start: nonzero_time(record, &FieldSpec::START),
            end: nonzero_time(record, &FieldSpec::STOP),
            interval: resolve_u64(fields, &FieldSpec::INTERVAL)
                .filter(|i| *i != 0)
                .map(|i| format!("{}s", i)),
        },
        status: derive_status(record, now),
        permissions: Permissions {
            pauseable: permission(&FieldSpec::PAUSEABLE, defaults.pauseable),
            closeable: permission(&FieldSpec::CLOSEABLE, defaults.closeable),
            recipient_modifiable: permission(
                &FieldSpec::RECIPIENT_MODIFIABLE,
                defaults.recipient_modifiable,
            ),
        },
        progress: derive_progress(record, now),
        remark: resolve_string(fields, &FieldSpec::REMARK),
        token,
        source: record.source(),
    }
}
