//! Error types for the MCP server.

use moveflow_chain::ChainError;
use moveflow_ops::OpsError;
use moveflow_types::{ErrorCode, TypesError};
use serde_json::{json, Map, Value};
use thiserror::Error;

/// Result type for MCP operations.
pub type McpResult<T> = Result<T, McpError>;

/// Error types for MCP server operations.
#[derive(Debug, Error)]
pub enum McpError {
    /// Operations error from moveflow-ops.
    #[error("{0}")]
    Ops(#[from] OpsError),

    /// Tool argument could not be interpreted.
    #[error("invalid input: {0}")]
    InvalidInput(#[from] TypesError),

    /// Server configuration is unusable.
    #[error("configuration error: {0}")]
    Config(String),

    /// JSON serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<ChainError> for McpError {
    fn from(e: ChainError) -> Self {
        Self::Ops(OpsError::Chain(e))
    }
}

impl McpError {
    /// Create a new configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new internal error.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Get the caller-facing error code for this error.
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::Ops(e) => e.error_code(),
            Self::InvalidInput(e) => e.error_code(),
            Self::Config(_) => ErrorCode::InvalidConfig,
            Self::Serialization(_) | Self::Internal(_) => ErrorCode::InternalError,
        }
    }

    /// Get a recovery suggestion.
    pub fn suggestion(&self) -> &'static str {
        match self {
            Self::Ops(e) => e.suggestion(),
            other => other
                .error_code()
                .suggestion()
                .unwrap_or("Please try again."),
        }
    }

    /// Extra fields that help the caller act on the error.
    pub fn details(&self) -> Map<String, Value> {
        let mut details = Map::new();
        match self {
            Self::Ops(OpsError::AccountNotFound {
                address,
                network,
                ledger_version,
            }) => {
                details.insert("address".into(), json!(address));
                details.insert("network".into(), json!(network));
                if let Some(version) = ledger_version {
                    details.insert("ledger_version".into(), json!(version));
                }
            }
            Self::Ops(OpsError::TokenNotFound {
                address,
                token_type,
                available_resources,
            }) => {
                details.insert("address".into(), json!(address));
                details.insert("token_type".into(), json!(token_type));
                details.insert("available_resources".into(), json!(available_resources));
            }
            Self::Ops(OpsError::Malformed {
                raw_data: Some(raw),
                ..
            }) => {
                details.insert("raw_data".into(), raw.clone());
            }
            _ => {}
        }
        details
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            McpError::from(OpsError::EmptyBatch).error_code(),
            ErrorCode::EmptyBatch
        );
        assert_eq!(
            McpError::from(ChainError::network("down")).error_code(),
            ErrorCode::ConnectionFailed
        );
        assert_eq!(
            McpError::from(TypesError::InvalidPermission("owner".into())).error_code(),
            ErrorCode::InvalidPermission
        );
        assert_eq!(McpError::config("x").error_code(), ErrorCode::InvalidConfig);
    }

    #[test]
    fn test_account_not_found_details() {
        let err = McpError::from(OpsError::AccountNotFound {
            address: "0xa".into(),
            network: "testnet".into(),
            ledger_version: Some(7),
        });
        let details = err.details();
        assert_eq!(details["network"], "testnet");
        assert_eq!(details["ledger_version"], 7);
    }

    #[test]
    fn test_plain_errors_have_no_details() {
        assert!(McpError::internal("boom").details().is_empty());
        assert!(!McpError::internal("boom").suggestion().is_empty());
    }
}
