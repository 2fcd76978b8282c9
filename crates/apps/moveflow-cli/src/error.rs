//! CLI error types.

use moveflow_chain::ChainError;
use moveflow_ops::OpsError;
use moveflow_types::ErrorCode;
use thiserror::Error;

/// CLI result type.
pub type CliResult<T> = Result<T, CliError>;

/// CLI error enum wrapping all crate errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Operations error.
    #[error("{0}")]
    Ops(#[from] OpsError),

    /// MCP server error.
    #[error("{0}")]
    Mcp(#[from] moveflow_mcp::McpError),

    /// IO error.
    #[error("{0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing error.
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// User-facing error with actionable message.
    #[error("{0}")]
    User(String),
}

impl From<ChainError> for CliError {
    fn from(e: ChainError) -> Self {
        Self::Ops(OpsError::Chain(e))
    }
}

impl CliError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a user-facing error.
    pub fn user(msg: impl Into<String>) -> Self {
        Self::User(msg.into())
    }

    /// Get the exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            // User errors: 1
            Self::User(_) => 1,
            // Not found: 2
            Self::Ops(e) if e.error_code().is_query_error() => 2,
            // Config errors: 3
            Self::Config(_) | Self::Toml(_) => 3,
            Self::Ops(e) if e.error_code() == ErrorCode::InvalidConfig => 3,
            // Network errors: 5
            Self::Ops(e) if e.error_code() == ErrorCode::ConnectionFailed => 5,
            // Operations errors: 8
            Self::Ops(_) | Self::Mcp(_) => 8,
            // IO errors: 9
            Self::Io(_) => 9,
            // JSON/format errors: 10
            Self::Json(_) => 10,
        }
    }

    /// Get the caller-facing error code for this error.
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::Config(_) | Self::Toml(_) => ErrorCode::InvalidConfig,
            Self::Ops(e) => e.error_code(),
            Self::Mcp(e) => e.error_code(),
            Self::Io(_) | Self::Json(_) | Self::User(_) => ErrorCode::InternalError,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(CliError::user("x").exit_code(), 1);
        assert_eq!(
            CliError::from(OpsError::StreamNotFound("1".into())).exit_code(),
            2
        );
        assert_eq!(CliError::config("x").exit_code(), 3);
        assert_eq!(CliError::from(ChainError::network("down")).exit_code(), 5);
        assert_eq!(CliError::from(OpsError::EmptyBatch).exit_code(), 8);
    }

    #[test]
    fn test_error_code_delegates() {
        assert_eq!(
            CliError::from(OpsError::NoAccount).error_code(),
            OpsError::NoAccount.error_code()
        );
        assert_eq!(CliError::config("x").error_code(), ErrorCode::InvalidConfig);
    }
}
