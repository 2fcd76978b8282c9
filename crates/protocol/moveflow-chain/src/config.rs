//! Configuration for the Aptos chain client.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use moveflow_types::{
    is_valid_address, normalize_address, ACCOUNT_STREAMS_TIMEOUT_MS, DEFAULT_MAX_RETRIES,
    DEFAULT_PAGE_LIMIT, DEFAULT_RETRY_BASE_DELAY_MS, FALLBACK_FETCH_TIMEOUT_MS,
    FETCH_REQUEST_TIMEOUT_MS, MAINNET_CONTRACT_ADDRESS, MAINNET_NODE_URL, MAX_STREAMS_TO_PROCESS,
    STREAM_INFO_TIMEOUT_MS, TESTNET_CONTRACT_ADDRESS, TESTNET_NODE_URL,
};

use crate::error::{ChainError, ChainResult};

/// Aptos network selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AptosNetwork {
    /// Mainnet
    Mainnet,
    /// Testnet (default for development)
    #[default]
    Testnet,
}

impl AptosNetwork {
    /// Get the network name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mainnet => "mainnet",
            Self::Testnet => "testnet",
        }
    }

    /// Preset full-node URL.
    pub fn node_url(&self) -> &'static str {
        match self {
            Self::Mainnet => MAINNET_NODE_URL,
            Self::Testnet => TESTNET_NODE_URL,
        }
    }

    /// Preset MoveFlow module address.
    pub fn contract_address(&self) -> &'static str {
        match self {
            Self::Mainnet => MAINNET_CONTRACT_ADDRESS,
            Self::Testnet => TESTNET_CONTRACT_ADDRESS,
        }
    }
}

impl std::fmt::Display for AptosNetwork {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for AptosNetwork {
    type Err = ChainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mainnet" => Ok(Self::Mainnet),
            "testnet" => Ok(Self::Testnet),
            other => Err(ChainError::config(format!("unknown network: {}", other))),
        }
    }
}

/// Deadlines per call class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeoutConfig {
    /// Single stream lookup
    #[serde(with = "millis")]
    pub stream_info: Duration,
    /// Whole account aggregation
    #[serde(with = "millis")]
    pub account_streams: Duration,
    /// One HTTP request
    #[serde(with = "millis")]
    pub fetch_request: Duration,
    /// One enrichment lookup
    #[serde(with = "millis")]
    pub fallback_fetch: Duration,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            stream_info: Duration::from_millis(STREAM_INFO_TIMEOUT_MS),
            account_streams: Duration::from_millis(ACCOUNT_STREAMS_TIMEOUT_MS),
            fetch_request: Duration::from_millis(FETCH_REQUEST_TIMEOUT_MS),
            fallback_fetch: Duration::from_millis(FALLBACK_FETCH_TIMEOUT_MS),
        }
    }
}

/// Retry policy configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Base delay; retry `n` waits `base_delay * n`
    #[serde(with = "millis")]
    pub base_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay: Duration::from_millis(DEFAULT_RETRY_BASE_DELAY_MS),
        }
    }
}

/// Configuration for talking to Aptos and the MoveFlow module.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AptosConfig {
    /// Which network to use
    pub network: AptosNetwork,
    /// Full-node URL override
    pub node_url: Option<String>,
    /// MoveFlow module address override
    pub contract_address: Option<String>,
    /// Account address override (otherwise derived from the key)
    pub account_address: Option<String>,
    /// Hex-encoded Ed25519 private key
    #[serde(skip_serializing)]
    pub private_key: Option<String>,
    /// Per-class deadlines
    pub timeouts: TimeoutConfig,
    /// Retry policy
    pub retry: RetryConfig,
    /// Page size for stream listings
    pub page_limit: u32,
    /// Bare stream ids enriched per request
    pub max_streams_to_process: usize,
}

impl AptosConfig {
    /// Create a configuration for testnet.
    pub fn testnet() -> Self {
        Self::default()
    }

    /// Create a configuration for mainnet.
    pub fn mainnet() -> Self {
        Self {
            network: AptosNetwork::Mainnet,
            ..Self::default()
        }
    }

    /// Set the private key.
    pub fn with_private_key(mut self, key: impl Into<String>) -> Self {
        self.private_key = Some(key.into());
        self
    }

    /// Full-node URL in effect, without a trailing slash.
    pub fn node_url(&self) -> String {
        self.node_url
            .as_deref()
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| self.network.node_url())
            .trim_end_matches('/')
            .to_string()
    }

    /// MoveFlow module address in effect.
    pub fn contract_address(&self) -> String {
        self.contract_address
            .as_deref()
            .map(normalize_address)
            .filter(|addr| !addr.is_empty())
            .unwrap_or_else(|| self.network.contract_address().to_string())
    }

    /// Validate the configuration.
    pub fn validate(&self) -> ChainResult<()> {
        let contract = self.contract_address();
        if !is_valid_address(&contract) {
            return Err(ChainError::config(format!(
                "invalid contract address: {}",
                contract
            )));
        }

        if let Some(addr) = &self.account_address {
            if !is_valid_address(addr) {
                return Err(ChainError::config(format!("invalid account address: {}", addr)));
            }
        }

        let url = self.node_url();
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(ChainError::config(format!("invalid node URL: {}", url)));
        }

        if self.page_limit == 0 {
            return Err(ChainError::config("page_limit must be positive"));
        }

        Ok(())
    }
}

impl Default for AptosConfig {
    fn default() -> Self {
        Self {
            network: AptosNetwork::Testnet,
            node_url: None,
            contract_address: None,
            account_address: None,
            private_key: None,
            timeouts: TimeoutConfig::default(),
            retry: RetryConfig::default(),
            page_limit: DEFAULT_PAGE_LIMIT,
            max_streams_to_process: MAX_STREAMS_TO_PROCESS,
        }
    }
}

/// Serde helper for Duration as integer milliseconds.
mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}
