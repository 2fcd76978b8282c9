//! MoveFlow stream SDK backed by the node REST API.
//!
//! Reads go through the module's `get_stream` view function and its
//! sender/recipient event handles. Writes call the module's entry functions
//! through [`submit_entry_function`].

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use serde_json::{json, Value};
use tracing::{debug, warn};

use moveflow_types::{
    addresses_match, normalize_address, RawRecord, RecordOrigin, StreamDirection, APT_COIN_TYPE,
};

use crate::config::AptosConfig;
use crate::error::{ChainError, ChainResult};
use crate::node::{NodeApi, NodeClient};
use crate::sdk::{BatchCreateParams, CreateStreamParams, PageRequest, StreamSdk, TxnOutcome};
use crate::signer::LocalSigner;
use crate::transaction::{submit_entry_function, EntryFunction};

/// Event handle struct holding stream creations, keyed by sender.
pub const SENDER_EVENTS: &str = "stream::SenderEvents";
/// Field of [`SENDER_EVENTS`] with creation events.
pub const SENDER_CREATE_FIELD: &str = "create_events";
/// Event handle struct holding stream creations, keyed by recipient.
pub const RECIPIENT_EVENTS: &str = "stream::RecipientEvents";
/// Field of [`RECIPIENT_EVENTS`] with creation events.
pub const RECIPIENT_RECEIVE_FIELD: &str = "receive_events";
/// Event handle struct with lifecycle events.
pub const STREAM_EVENTS: &str = "stream::StreamEvent";
/// Lifecycle fields of [`STREAM_EVENTS`].
pub const STREAM_EVENT_FIELDS: [&str; 5] = [
    "create_events",
    "withdraw_events",
    "pause_events",
    "resume_events",
    "close_events",
];

const STREAM_ID_KEYS: [&str; 3] = ["id", "stream_id", "streamId"];

/// Fully qualified event handle struct of the module.
pub fn event_handle(contract: &str, handle: &str) -> String {
    format!("{}::{}", contract, handle)
}

/// REST-backed [`StreamSdk`].
#[derive(Clone)]
pub struct AptosStreamClient {
    node: Arc<dyn NodeApi>,
    signer: Option<LocalSigner>,
    account_address: Option<String>,
    contract: String,
}

impl AptosStreamClient {
    /// Build from configuration, creating a [`NodeClient`].
    ///
    /// A missing private key yields a read-only client.
    pub fn from_config(config: &AptosConfig) -> ChainResult<Self> {
        config.validate()?;
        let node: Arc<dyn NodeApi> = Arc::new(NodeClient::new(config)?);
        Self::with_node(node, config)
    }

    /// Build around an existing node client.
    pub fn with_node(node: Arc<dyn NodeApi>, config: &AptosConfig) -> ChainResult<Self> {
        let signer = match config.private_key.as_deref().filter(|k| !k.trim().is_empty()) {
            Some(key) => {
                let signer = LocalSigner::from_hex(key)?;
                Some(match config.account_address.as_deref() {
                    Some(addr) => signer.with_address(addr)?,
                    None => signer,
                })
            }
            None => None,
        };

        let account_address = signer
            .as_ref()
            .map(|s| s.address().to_string())
            .or_else(|| config.account_address.as_deref().map(normalize_address));

        Ok(Self {
            node,
            signer,
            account_address,
            contract: config.contract_address(),
        })
    }

    /// Module address.
    pub fn contract(&self) -> &str {
        &self.contract
    }

    /// Node client used for reads and submissions.
    pub fn node(&self) -> Arc<dyn NodeApi> {
        Arc::clone(&self.node)
    }

    fn function(&self, name: &str) -> String {
        format!("{}::stream::{}", self.contract, name)
    }

    fn signer(&self) -> ChainResult<&LocalSigner> {
        self.signer
            .as_ref()
            .ok_or_else(|| ChainError::config("APTOS_PRIVATE_KEY is required to submit transactions"))
    }

    /// Coin type recorded on a stream, defaulting to the native coin.
    async fn stream_coin_type(&self, stream_id: &str) -> ChainResult<String> {
        let record = self
            .fetch_stream(stream_id)
            .await?
            .ok_or_else(|| ChainError::not_found(format!("stream {}", stream_id)))?;
        let coin_type = ["coin_type", "asset_type"]
            .iter()
            .find_map(|key| match record.fields.get(*key) {
                Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
                Some(Value::Object(obj)) => obj.get("inner").and_then(Value::as_str).map(str::to_string),
                _ => None,
            })
            .unwrap_or_else(|| APT_COIN_TYPE.to_string());
        Ok(coin_type)
    }
}

#[async_trait]
impl StreamSdk for AptosStreamClient {
    fn sender_address(&self) -> Option<String> {
        self.account_address.clone()
    }

    async fn fetch_stream(&self, stream_id: &str) -> ChainResult<Option<RawRecord>> {
        let result = self
            .node
            .view(&self.function("get_stream"), &[], &[json!(stream_id)])
            .await;

        let values = match result {
            Ok(values) => values,
            Err(ChainError::NotFound(_)) | Err(ChainError::Http { status: 400, .. }) => {
                debug!(stream_id, "Stream not found via view");
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        match values.into_iter().next() {
            Some(Value::Object(mut fields)) => {
                if !STREAM_ID_KEYS.iter().any(|k| fields.contains_key(*k)) {
                    fields.insert("stream_id".to_string(), json!(stream_id));
                }
                Ok(Some(RawRecord::sdk(fields)))
            }
            Some(Value::Null) | None => Ok(None),
            Some(other) => Err(ChainError::malformed(format!(
                "get_stream returned non-object: {}",
                other
            ))),
        }
    }

    async fn list_streams(
        &self,
        address: &str,
        direction: StreamDirection,
        page: PageRequest,
    ) -> ChainResult<Vec<RawRecord>> {
        let (handle, field, party) = match direction {
            StreamDirection::Outgoing => (SENDER_EVENTS, SENDER_CREATE_FIELD, "sender"),
            StreamDirection::Incoming => (RECIPIENT_EVENTS, RECIPIENT_RECEIVE_FIELD, "recipient"),
        };
        let handle = event_handle(&self.contract, handle);

        let events = self
            .node
            .get_events_by_handle(&self.contract, &handle, field, page.limit)
            .await?;

        let mut seen = Vec::new();
        let mut matching = Vec::new();
        for event in events {
            let data = event.get("data").cloned().unwrap_or(Value::Null);
            let party_matches = data
                .get(party)
                .and_then(Value::as_str)
                .is_some_and(|p| addresses_match(p, address));
            if !party_matches {
                continue;
            }
            if let Some(id) = event_stream_id(&data) {
                if !seen.contains(&id) {
                    seen.push(id.clone());
                    let event_type = event
                        .get("type")
                        .and_then(Value::as_str)
                        .unwrap_or(handle.as_str())
                        .to_string();
                    matching.push((id, event_type, data));
                }
            }
        }

        debug!(
            address,
            direction = direction.as_str(),
            count = matching.len(),
            "Stream ids from event handle"
        );

        let lookups = matching.iter().map(|(id, _, _)| self.fetch_stream(id));
        let fetched = join_all(lookups).await;

        let mut records = Vec::with_capacity(matching.len());
        for ((id, event_type, data), result) in matching.into_iter().zip(fetched) {
            match result {
                Ok(Some(record)) => {
                    records.push(record);
                    continue;
                }
                Ok(None) => {
                    debug!(stream_id = %id, "Listed stream missing from view, keeping event data")
                }
                Err(e) => warn!(stream_id = %id, error = %e, "View lookup failed, keeping event data"),
            }
            if let Some(record) = RawRecord::from_value(RecordOrigin::Event { event_type }, data) {
                records.push(record);
            }
        }

        Ok(records)
    }

    async fn create_stream(&self, params: &CreateStreamParams) -> ChainResult<TxnOutcome> {
        let signer = self.signer()?;
        let terms = &params.terms;
        let call = EntryFunction::new(self.function("create"))
            .type_arg(&params.coin_type)
            .arg(json!(params.name))
            .arg(json!(params.remark))
            .arg(json!(normalize_address(&params.recipient)))
            .u64_arg(params.deposit_amount)
            .u64_arg(params.cliff_amount)
            .u64_arg(terms.cliff_time)
            .u64_arg(terms.start_time)
            .u64_arg(terms.stop_time)
            .u64_arg(terms.interval)
            .arg(json!(terms.auto_withdraw))
            .u64_arg(terms.auto_withdraw_interval)
            .arg(json!(terms.pauseable.to_u8()))
            .arg(json!(terms.closeable.to_u8()))
            .arg(json!(terms.recipient_modifiable.to_u8()));

        submit_entry_function(self.node.as_ref(), signer, &call).await
    }

    async fn batch_create_streams(&self, params: &BatchCreateParams) -> ChainResult<TxnOutcome> {
        let signer = self.signer()?;
        let count = params.recipients.len();
        if params.names.len() != count
            || params.deposit_amounts.len() != count
            || params.cliff_amounts.len() != count
        {
            return Err(ChainError::invalid_input(
                "batch argument lists must have equal length",
            ));
        }

        let terms = &params.terms;
        let recipients: Vec<String> = params.recipients.iter().map(|r| normalize_address(r)).collect();
        let deposits: Vec<String> = params.deposit_amounts.iter().map(u64::to_string).collect();
        let cliffs: Vec<String> = params.cliff_amounts.iter().map(u64::to_string).collect();

        let call = EntryFunction::new(self.function("batch_create"))
            .type_arg(&params.coin_type)
            .arg(json!(params.names))
            .arg(json!(params.remark))
            .arg(json!(recipients))
            .arg(json!(deposits))
            .arg(json!(cliffs))
            .u64_arg(terms.cliff_time)
            .u64_arg(terms.start_time)
            .u64_arg(terms.stop_time)
            .u64_arg(terms.interval)
            .arg(json!(terms.auto_withdraw))
            .u64_arg(terms.auto_withdraw_interval)
            .arg(json!(terms.pauseable.to_u8()))
            .arg(json!(terms.closeable.to_u8()))
            .arg(json!(terms.recipient_modifiable.to_u8()));

        submit_entry_function(self.node.as_ref(), signer, &call).await
    }

    async fn close_stream(&self, stream_id: &str) -> ChainResult<TxnOutcome> {
        let signer = self.signer()?;
        let coin_type = self.stream_coin_type(stream_id).await?;
        let call = EntryFunction::new(self.function("close"))
            .type_arg(coin_type)
            .arg(json!(stream_id));

        submit_entry_function(self.node.as_ref(), signer, &call).await
    }
}

/// Stream id carried in an event payload.
pub fn event_stream_id(data: &Value) -> Option<String> {
    STREAM_ID_KEYS.iter().find_map(|key| match data.get(*key) {
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}
