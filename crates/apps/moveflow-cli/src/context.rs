//! Shared setup for CLI commands.

use moveflow_chain::AptosConfig;
use moveflow_ops::StreamOperations;
use tracing::debug;

use crate::config::CliConfig;
use crate::error::CliResult;

/// Chain configuration with file, flag and environment settings merged.
pub fn aptos_config(config: &CliConfig, private_key: Option<String>) -> CliResult<AptosConfig> {
    let aptos = config.to_aptos_config(private_key);
    aptos.validate()?;
    Ok(aptos)
}

/// Stream operations backed by the node REST API.
pub fn operations(config: &CliConfig, private_key: Option<String>) -> CliResult<StreamOperations> {
    let aptos = aptos_config(config, private_key)?;
    debug!(
        network = %aptos.network,
        node_url = %aptos.node_url(),
        contract = %aptos.contract_address(),
        "Building stream operations"
    );
    Ok(StreamOperations::from_config(aptos)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_contract_is_config_error() {
        let mut config = CliConfig::default();
        config.aptos.contract_address = Some("not-an-address".into());
        let err = aptos_config(&config, None).unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn test_read_only_operations() {
        let ops = operations(&CliConfig::default(), None).unwrap();
        assert!(ops.current_address().is_none());
    }
}
