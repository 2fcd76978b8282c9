//! Aptos full-node REST client.
//!
//! [`NodeApi`] is the seam the query pipeline reads through; [`NodeClient`]
//! is the reqwest-backed implementation. Responses are returned as raw JSON
//! because their shapes vary across protocol versions and are interpreted
//! by the field resolver downstream.

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde_json::{json, Value};
use tracing::debug;

use moveflow_types::normalize_address;

use crate::config::AptosConfig;
use crate::error::{ChainError, ChainResult};

/// Read and submit operations against an Aptos full node.
#[async_trait]
pub trait NodeApi: Send + Sync {
    // =========================================================================
    // Accounts
    // =========================================================================

    /// `GET /accounts/{addr}`: sequence number and authentication key.
    async fn get_account(&self, address: &str) -> ChainResult<Value>;

    /// `GET /accounts/{addr}/resources`: raw body, expected to be an array.
    async fn get_account_resources(&self, address: &str) -> ChainResult<Value>;

    /// `GET /accounts/{addr}/events`: raw account event log.
    async fn get_account_events(&self, address: &str, limit: u32) -> ChainResult<Vec<Value>>;

    /// `GET /accounts/{addr}/events/{handle}/{field}`.
    async fn get_events_by_handle(
        &self,
        address: &str,
        event_handle: &str,
        field_name: &str,
        limit: u32,
    ) -> ChainResult<Vec<Value>>;

    /// `GET /accounts/{addr}/transactions?limit=N`.
    async fn get_account_transactions(&self, address: &str, limit: u32)
        -> ChainResult<Vec<Value>>;

    // =========================================================================
    // Ledger
    // =========================================================================

    /// `GET /transactions?limit=N`: most recent global transactions.
    async fn get_transactions(&self, limit: u32) -> ChainResult<Vec<Value>>;

    /// `POST /view`: evaluate a view function.
    async fn view(
        &self,
        function: &str,
        type_arguments: &[String],
        arguments: &[Value],
    ) -> ChainResult<Vec<Value>>;

    /// `GET /estimate_gas_price`: recommended gas unit price.
    async fn estimate_gas_price(&self) -> ChainResult<u64>;

    // =========================================================================
    // Submission
    // =========================================================================

    /// `POST /transactions/encode_submission`: BCS signing message as hex.
    async fn encode_submission(&self, request: &Value) -> ChainResult<String>;

    /// `POST /transactions`: submit a signed transaction.
    async fn submit_transaction(&self, signed: &Value) -> ChainResult<Value>;

    /// `GET /transactions/wait_by_hash/{hash}`: block until committed.
    async fn wait_for_transaction(&self, hash: &str) -> ChainResult<Value>;
}

/// reqwest-backed [`NodeApi`].
#[derive(Clone)]
pub struct NodeClient {
    /// HTTP client with the per-request timeout
    client: Client,
    /// Full-node base URL without trailing slash
    base_url: String,
}

impl NodeClient {
    /// Create a client for the node URL and per-request timeout in `config`.
    pub fn new(config: &AptosConfig) -> ChainResult<Self> {
        let client = Client::builder()
            .timeout(config.timeouts.fetch_request)
            .build()
            .map_err(|e| ChainError::network(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.node_url(),
        })
    }

    /// Base URL requests are sent to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_json(&self, path: &str) -> ChainResult<Value> {
        let url = format!("{}{}", self.base_url, path);
        debug!(url = %url, "GET");
        let response = self.client.get(&url).send().await?;
        Self::read_json(response).await
    }

    async fn post_json(&self, path: &str, body: &Value) -> ChainResult<Value> {
        let url = format!("{}{}", self.base_url, path);
        debug!(url = %url, "POST");
        let response = self.client.post(&url).json(body).send().await?;
        Self::read_json(response).await
    }

    async fn read_json(response: Response) -> ChainResult<Value> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_failure(status, &body));
        }

        response
            .json()
            .await
            .map_err(|e| ChainError::malformed(format!("failed to parse node response: {}", e)))
    }

    async fn get_array(&self, path: &str) -> ChainResult<Vec<Value>> {
        match self.get_json(path).await? {
            Value::Array(items) => Ok(items),
            other => Err(ChainError::malformed(format!(
                "expected array from {}, got {}",
                path,
                json_kind(&other)
            ))),
        }
    }
}

#[async_trait]
impl NodeApi for NodeClient {
    async fn get_account(&self, address: &str) -> ChainResult<Value> {
        let address = normalize_address(address);
        self.get_json(&format!("/accounts/{}", address))
            .await
            .map_err(|e| attach_address(e, &address))
    }

    async fn get_account_resources(&self, address: &str) -> ChainResult<Value> {
        let address = normalize_address(address);
        self.get_json(&format!("/accounts/{}/resources", address))
            .await
            .map_err(|e| attach_address(e, &address))
    }

    async fn get_account_events(&self, address: &str, limit: u32) -> ChainResult<Vec<Value>> {
        let address = normalize_address(address);
        self.get_array(&format!("/accounts/{}/events?limit={}", address, limit))
            .await
            .map_err(|e| attach_address(e, &address))
    }

    async fn get_events_by_handle(
        &self,
        address: &str,
        event_handle: &str,
        field_name: &str,
        limit: u32,
    ) -> ChainResult<Vec<Value>> {
        let address = normalize_address(address);
        self.get_array(&format!(
            "/accounts/{}/events/{}/{}?limit={}",
            address, event_handle, field_name, limit
        ))
        .await
    }

    async fn get_account_transactions(
        &self,
        address: &str,
        limit: u32,
    ) -> ChainResult<Vec<Value>> {
        let address = normalize_address(address);
        self.get_array(&format!("/accounts/{}/transactions?limit={}", address, limit))
            .await
            .map_err(|e| attach_address(e, &address))
    }

    async fn get_transactions(&self, limit: u32) -> ChainResult<Vec<Value>> {
        self.get_array(&format!("/transactions?limit={}", limit)).await
    }

    async fn view(
        &self,
        function: &str,
        type_arguments: &[String],
        arguments: &[Value],
    ) -> ChainResult<Vec<Value>> {
        let body = json!({
            "function": function,
            "type_arguments": type_arguments,
            "arguments": arguments,
        });
        match self.post_json("/view", &body).await? {
            Value::Array(items) => Ok(items),
            other => Err(ChainError::malformed(format!(
                "expected array from /view, got {}",
                json_kind(&other)
            ))),
        }
    }

    async fn estimate_gas_price(&self) -> ChainResult<u64> {
        let body = self.get_json("/estimate_gas_price").await?;
        body.get("gas_estimate")
            .and_then(Value::as_u64)
            .ok_or_else(|| ChainError::malformed("missing gas_estimate"))
    }

    async fn encode_submission(&self, request: &Value) -> ChainResult<String> {
        match self.post_json("/transactions/encode_submission", request).await? {
            Value::String(hex) => Ok(hex),
            other => Err(ChainError::malformed(format!(
                "expected hex string from encode_submission, got {}",
                json_kind(&other)
            ))),
        }
    }

    async fn submit_transaction(&self, signed: &Value) -> ChainResult<Value> {
        self.post_json("/transactions", signed).await
    }

    async fn wait_for_transaction(&self, hash: &str) -> ChainResult<Value> {
        self.get_json(&format!("/transactions/wait_by_hash/{}", hash))
            .await
    }
}

/// Turn a non-success response into an error, keeping the node's message.
fn classify_failure(status: StatusCode, body: &str) -> ChainError {
    let parsed: Option<Value> = serde_json::from_str(body).ok();
    let message = parsed
        .as_ref()
        .and_then(|v| v.get("message"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| body.to_string());
    let error_code = parsed
        .as_ref()
        .and_then(|v| v.get("error_code"))
        .and_then(Value::as_str)
        .unwrap_or_default();

    if error_code == "account_not_found" {
        return ChainError::account_not_found(String::new(), message);
    }
    if status == StatusCode::NOT_FOUND {
        return ChainError::not_found(message);
    }
    ChainError::http(status.as_u16(), message)
}

fn attach_address(err: ChainError, address: &str) -> ChainError {
    match err {
        ChainError::AccountNotFound { message, .. } => {
            ChainError::account_not_found(address, message)
        }
        other => other,
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
