//! Stream creation and cancellation.
//!
//! Every request is validated in full before anything is submitted; a
//! rejected batch never reaches the chain.

use chrono::{DateTime, SecondsFormat};
use num_bigint::BigUint;
use num_traits::Zero;
use serde::{Deserialize, Serialize};
use tracing::info;

use moveflow_chain::{BatchCreateParams, CreateStreamParams, StreamTerms, TxnOutcome};
use moveflow_types::{
    is_valid_address, normalize_address, normalize_token_type, parse_display_amount,
    to_u64_amount, Permission, Permissions, TokenInfo, TypesError, DEFAULT_AUTO_WITHDRAW_INTERVAL_SECS,
    DEFAULT_INTERVAL_SECS, DEFAULT_REMARK, DEFAULT_START_DELAY_SECS, DEFAULT_STREAM_NAME_PREFIX,
    MAX_BATCH_SIZE,
};

use crate::error::{OpsError, OpsResult};
use crate::normalize::display_amount;
use crate::stream_ops::StreamOperations;

/// A request to open one stream per recipient on a shared schedule.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchCreateRequest {
    pub recipients: Vec<String>,
    /// Display amounts, parallel to `recipients`
    pub amounts: Vec<String>,
    /// Shorthand (`APT`, `USDC`, ...) or full type path; empty means APT
    pub token_type: String,
    /// Stream length in seconds
    pub duration: u64,
    pub names: Option<Vec<String>>,
    pub interval: Option<u64>,
    pub start_delay: Option<u64>,
    pub cliff_time_enabled: Option<bool>,
    pub pauseable: Option<Permission>,
    pub closeable: Option<Permission>,
    pub recipient_modifiable: Option<Permission>,
    pub remark: Option<String>,
}

/// Schedule echoed back to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimeSettings {
    pub start_time: String,
    pub end_time: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cliff_time: Option<String>,
    pub duration_seconds: u64,
    pub interval_seconds: u64,
}

/// Outcome of a batch creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchCreateResult {
    pub transaction: TxnOutcome,
    pub streams_created: usize,
    pub recipients: Vec<String>,
    pub names: Vec<String>,
    /// Formatted deposits, parallel to `recipients`
    pub amounts: Vec<String>,
    pub token: TokenInfo,
    pub permissions: Permissions,
    pub time_settings: TimeSettings,
}

/// Outcome of a cancellation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CancelResult {
    pub stream_id: String,
    pub transaction: TxnOutcome,
}

/// Validated, chain-ready form of a [`BatchCreateRequest`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedBatch {
    pub params: BatchCreateParams,
    pub token: TokenInfo,
    pub time_settings: TimeSettings,
}

fn rfc3339(secs: u64) -> OpsResult<String> {
    i64::try_from(secs)
        .ok()
        .and_then(|s| DateTime::from_timestamp(s, 0))
        .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Millis, true))
        .ok_or_else(|| OpsError::InvalidDuration(format!("time {} out of range", secs)))
}

/// Validate a request and compute the schedule relative to `now`.
pub fn prepare_batch(request: &BatchCreateRequest, now: u64) -> OpsResult<PreparedBatch> {
    let count = request.recipients.len();
    if count == 0 {
        return Err(OpsError::EmptyBatch);
    }
    if count > MAX_BATCH_SIZE {
        return Err(OpsError::BatchTooLarge {
            size: count,
            max: MAX_BATCH_SIZE,
        });
    }
    if request.amounts.len() != count {
        return Err(OpsError::LengthMismatch {
            recipients: count,
            amounts: request.amounts.len(),
        });
    }
    if let Some(names) = &request.names {
        if names.len() != count {
            return Err(OpsError::NamesMismatch {
                names: names.len(),
                recipients: count,
            });
        }
    }
    if let Some(bad) = request.recipients.iter().find(|r| !is_valid_address(r)) {
        return Err(OpsError::InvalidAddress(bad.clone()));
    }
    if request.duration == 0 {
        return Err(OpsError::InvalidDuration("duration must be positive".into()));
    }
    let interval = request.interval.unwrap_or(DEFAULT_INTERVAL_SECS);
    if interval == 0 {
        return Err(OpsError::InvalidDuration("interval must be positive".into()));
    }

    let token = TokenInfo::from_type(normalize_token_type(&request.token_type));
    let mut deposits = Vec::with_capacity(count);
    for amount in &request.amounts {
        let base = parse_display_amount(amount, &token.token_type)?;
        if base.is_zero() {
            return Err(TypesError::InvalidAmount(amount.clone()).into());
        }
        deposits.push(to_u64_amount(&base)?);
    }

    let start_delay = request.start_delay.unwrap_or(DEFAULT_START_DELAY_SECS);
    let overflow = || OpsError::InvalidDuration("schedule overflows".into());
    let start_time = now.checked_add(start_delay).ok_or_else(overflow)?;
    let stop_time = start_time.checked_add(request.duration).ok_or_else(overflow)?;
    let cliff_time = if request.cliff_time_enabled.unwrap_or(true) {
        start_time
    } else {
        0
    };

    let defaults = Permissions::default();
    let terms = StreamTerms {
        cliff_time,
        start_time,
        stop_time,
        interval,
        auto_withdraw: false,
        auto_withdraw_interval: DEFAULT_AUTO_WITHDRAW_INTERVAL_SECS,
        pauseable: request.pauseable.unwrap_or(defaults.pauseable),
        closeable: request.closeable.unwrap_or(defaults.closeable),
        recipient_modifiable: request
            .recipient_modifiable
            .unwrap_or(defaults.recipient_modifiable),
    };

    let names = match &request.names {
        Some(names) => names.clone(),
        None => (1..=count)
            .map(|i| format!("{} {}", DEFAULT_STREAM_NAME_PREFIX, i))
            .collect(),
    };

    let time_settings = TimeSettings {
        start_time: rfc3339(start_time)?,
        end_time: rfc3339(stop_time)?,
        cliff_time: if cliff_time == 0 {
            None
        } else {
            Some(rfc3339(cliff_time)?)
        },
        duration_seconds: request.duration,
        interval_seconds: interval,
    };

    Ok(PreparedBatch {
        params: BatchCreateParams {
            coin_type: token.token_type.clone(),
            remark: request
                .remark
                .clone()
                .filter(|r| !r.is_empty())
                .unwrap_or_else(|| DEFAULT_REMARK.to_string()),
            names,
            recipients: request.recipients.iter().map(|r| normalize_address(r)).collect(),
            cliff_amounts: vec![0; count],
            deposit_amounts: deposits,
            terms,
        },
        token,
        time_settings,
    })
}

impl StreamOperations {
    /// Create one stream per recipient.
    ///
    /// A single recipient goes through the single-stream entry function.
    pub async fn batch_create_streams(
        &self,
        request: &BatchCreateRequest,
    ) -> OpsResult<BatchCreateResult> {
        let prepared = prepare_batch(request, self.now())?;
        let params = &prepared.params;
        let count = params.recipients.len();

        info!(
            count,
            token = %prepared.token.token_type,
            start = params.terms.start_time,
            stop = params.terms.stop_time,
            "Creating streams"
        );

        let transaction = if count == 1 {
            let single = CreateStreamParams {
                coin_type: params.coin_type.clone(),
                name: params.names[0].clone(),
                remark: params.remark.clone(),
                recipient: params.recipients[0].clone(),
                deposit_amount: params.deposit_amounts[0],
                cliff_amount: params.cliff_amounts[0],
                terms: params.terms.clone(),
            };
            self.sdk.create_stream(&single).await?
        } else {
            self.sdk.batch_create_streams(params).await?
        };

        info!(hash = %transaction.hash, count, "Streams created");

        let amounts = params
            .deposit_amounts
            .iter()
            .map(|a| display_amount(&BigUint::from(*a), &prepared.token))
            .collect();

        Ok(BatchCreateResult {
            streams_created: count,
            recipients: params.recipients.clone(),
            names: params.names.clone(),
            amounts,
            permissions: Permissions {
                pauseable: params.terms.pauseable,
                closeable: params.terms.closeable,
                recipient_modifiable: params.terms.recipient_modifiable,
            },
            transaction,
            token: prepared.token,
            time_settings: prepared.time_settings,
        })
    }

    /// Close a stream, returning unreleased funds to the sender.
    pub async fn cancel_stream(&self, stream_id: &str) -> OpsResult<CancelResult> {
        let stream_id = stream_id.trim();
        if stream_id.is_empty() {
            return Err(OpsError::StreamNotFound(String::new()));
        }

        info!(stream_id, "Closing stream");
        let transaction = self.sdk.close_stream(stream_id).await?;
        info!(stream_id, hash = %transaction.hash, "Stream closed");

        Ok(CancelResult {
            stream_id: stream_id.to_string(),
            transaction,
        })
    }
}
