//! CLI configuration.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;

use moveflow_chain::{AptosConfig, AptosNetwork, RetryConfig, TimeoutConfig};
use moveflow_types::{
    ACCOUNT_STREAMS_TIMEOUT_MS, DEFAULT_MAX_RETRIES, DEFAULT_PAGE_LIMIT,
    DEFAULT_RETRY_BASE_DELAY_MS, FALLBACK_FETCH_TIMEOUT_MS, FETCH_REQUEST_TIMEOUT_MS,
    MAX_STREAMS_TO_PROCESS, STREAM_INFO_TIMEOUT_MS,
};

use crate::error::{CliError, CliResult};

fn env_var_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").ok())
        .as_ref()
}

/// Expand environment variables in a string.
/// Supports `${VAR_NAME}` syntax.
fn expand_env_vars(input: &str) -> String {
    let Some(re) = env_var_pattern() else {
        return input.to_string();
    };
    re.replace_all(input, |caps: &regex::Captures| {
        let var_name = &caps[1];
        std::env::var(var_name).unwrap_or_else(|_| caps[0].to_string())
    })
    .to_string()
}

fn expand_opt(value: &mut Option<String>) {
    if let Some(v) = value.as_mut() {
        *v = expand_env_vars(v);
    }
}

/// CLI configuration loaded from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Network and address settings.
    pub aptos: AptosSection,
    /// Deadlines per call class.
    pub timeouts: TimeoutsSection,
    /// Retry policy for reads.
    pub retry: RetrySection,
    /// Account query limits.
    pub query: QuerySection,
}

impl CliConfig {
    /// Load configuration from a file.
    /// Environment variables in `${VAR}` format are expanded in string values.
    pub fn load(path: &Path) -> CliResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&contents)?;

        expand_opt(&mut config.aptos.node_url);
        expand_opt(&mut config.aptos.contract_address);
        expand_opt(&mut config.aptos.account_address);

        Ok(config)
    }

    /// Save configuration to a file.
    pub fn save(&self, path: &Path) -> CliResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_toml()?)?;
        Ok(())
    }

    /// Render as TOML.
    pub fn to_toml(&self) -> CliResult<String> {
        toml::to_string_pretty(self)
            .map_err(|e| CliError::config(format!("Failed to serialize config: {}", e)))
    }

    /// Build the chain configuration. The private key never lives in the
    /// file; it comes from the command line or `APTOS_PRIVATE_KEY`.
    pub fn to_aptos_config(&self, private_key: Option<String>) -> AptosConfig {
        AptosConfig {
            network: self.aptos.network,
            node_url: self.aptos.node_url.clone(),
            contract_address: self.aptos.contract_address.clone(),
            account_address: self.aptos.account_address.clone(),
            private_key: private_key.filter(|k| !k.trim().is_empty()),
            timeouts: self.timeouts.to_timeout_config(),
            retry: RetryConfig {
                max_retries: self.retry.max_retries,
                base_delay: Duration::from_millis(self.retry.base_delay_ms),
            },
            page_limit: self.query.page_limit,
            max_streams_to_process: self.query.max_streams_to_process,
        }
    }
}

/// `[aptos]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AptosSection {
    /// mainnet or testnet.
    pub network: AptosNetwork,
    /// Full-node URL override.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_url: Option<String>,
    /// MoveFlow module address override.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contract_address: Option<String>,
    /// Account used when no address is passed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_address: Option<String>,
}

/// `[timeouts]` section, in milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutsSection {
    pub stream_info_ms: u64,
    pub account_streams_ms: u64,
    pub fetch_request_ms: u64,
    pub fallback_fetch_ms: u64,
}

impl Default for TimeoutsSection {
    fn default() -> Self {
        Self {
            stream_info_ms: STREAM_INFO_TIMEOUT_MS,
            account_streams_ms: ACCOUNT_STREAMS_TIMEOUT_MS,
            fetch_request_ms: FETCH_REQUEST_TIMEOUT_MS,
            fallback_fetch_ms: FALLBACK_FETCH_TIMEOUT_MS,
        }
    }
}

impl TimeoutsSection {
    fn to_timeout_config(&self) -> TimeoutConfig {
        TimeoutConfig {
            stream_info: Duration::from_millis(self.stream_info_ms),
            account_streams: Duration::from_millis(self.account_streams_ms),
            fetch_request: Duration::from_millis(self.fetch_request_ms),
            fallback_fetch: Duration::from_millis(self.fallback_fetch_ms),
        }
    }
}

/// `[retry]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySection {
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Retry `n` waits `base_delay_ms * n`.
    pub base_delay_ms: u64,
}

impl Default for RetrySection {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay_ms: DEFAULT_RETRY_BASE_DELAY_MS,
        }
    }
}

/// `[query]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QuerySection {
    /// Page size for stream listings.
    pub page_limit: u32,
    /// Bare stream ids looked up per account query.
    pub max_streams_to_process: usize,
}

impl Default for QuerySection {
    fn default() -> Self {
        Self {
            page_limit: DEFAULT_PAGE_LIMIT,
            max_streams_to_process: MAX_STREAMS_TO_PROCESS,
        }
    }
}

/// Get the default base directory for moveflow files.
///
/// Priority:
/// 1. `MOVEFLOW_HOME` environment variable (if set)
/// 2. `$HOME/.moveflow`
/// 3. `./.moveflow`
pub fn default_base_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("MOVEFLOW_HOME") {
        return PathBuf::from(dir);
    }

    directories::BaseDirs::new()
        .map(|dirs| dirs.home_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".moveflow")
}

/// Get the default config file path.
pub fn default_config_path() -> PathBuf {
    default_base_dir().join("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CliConfig::default();
        assert_eq!(config.aptos.network, AptosNetwork::Testnet);
        assert_eq!(config.retry.max_retries, DEFAULT_MAX_RETRIES);
        assert_eq!(config.query.max_streams_to_process, MAX_STREAMS_TO_PROCESS);
    }

    #[test]
    fn test_default_config_path() {
        assert!(default_config_path().ends_with("config.toml"));
    }

    #[test]
    fn test_config_save_and_load_roundtrip() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nested").join("config.toml");

        let mut config = CliConfig::default();
        config.aptos.network = AptosNetwork::Mainnet;
        config.query.page_limit = 10;
        config.save(&config_path).unwrap();

        let loaded = CliConfig::load(&config_path).unwrap();
        assert_eq!(loaded.aptos.network, AptosNetwork::Mainnet);
        assert_eq!(loaded.query.page_limit, 10);
        assert!(loaded.aptos.node_url.is_none());
    }

    #[test]
    fn test_config_load_nonexistent_returns_default() {
        let path = Path::new("/tmp/moveflow_nonexistent_12345/config.toml");
        let config = CliConfig::load(path).unwrap();
        assert_eq!(config.aptos.network, AptosNetwork::Testnet);
    }

    #[test]
    fn test_partial_sections() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        std::fs::write(
            &config_path,
            "[aptos]\nnetwork = \"mainnet\"\n\n[timeouts]\nstream_info_ms = 500\n",
        )
        .unwrap();

        let config = CliConfig::load(&config_path).unwrap();
        let aptos = config.to_aptos_config(None);
        assert_eq!(aptos.network, AptosNetwork::Mainnet);
        assert_eq!(aptos.timeouts.stream_info, Duration::from_millis(500));
        assert_eq!(
            aptos.timeouts.account_streams,
            Duration::from_millis(ACCOUNT_STREAMS_TIMEOUT_MS)
        );
    }

    #[test]
    fn test_invalid_toml_is_error() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        std::fs::write(&config_path, "[aptos\nnetwork = ").unwrap();

        let err = CliConfig::load(&config_path).unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn test_blank_private_key_is_dropped() {
        let config = CliConfig::default();
        assert!(config.to_aptos_config(Some("  ".into())).private_key.is_none());
        assert!(config.to_aptos_config(Some("0x11".into())).private_key.is_some());
    }

    #[test]
    fn test_expand_env_vars() {
        std::env::set_var("MOVEFLOW_TEST_NODE", "https://node.example.com/v1");

        assert_eq!(
            expand_env_vars("${MOVEFLOW_TEST_NODE}"),
            "https://node.example.com/v1"
        );

        // Unset variable should remain as-is
        assert_eq!(
            expand_env_vars("${NONEXISTENT_VAR_12345}"),
            "${NONEXISTENT_VAR_12345}"
        );

        assert_eq!(
            expand_env_vars("prefix_${MOVEFLOW_TEST_NODE}_suffix"),
            "prefix_https://node.example.com/v1_suffix"
        );

        std::env::remove_var("MOVEFLOW_TEST_NODE");
    }

    #[test]
    fn test_load_expands_env_vars() {
        std::env::set_var("MOVEFLOW_TEST_CONTRACT", "0xabc");
        let temp_dir = tempfile::TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        std::fs::write(
            &config_path,
            "[aptos]\ncontract_address = \"${MOVEFLOW_TEST_CONTRACT}\"\n",
        )
        .unwrap();

        let config = CliConfig::load(&config_path).unwrap();
        assert_eq!(config.aptos.contract_address.as_deref(), Some("0xabc"));
        std::env::remove_var("MOVEFLOW_TEST_CONTRACT");
    }
}
