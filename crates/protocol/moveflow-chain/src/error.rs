//! Error types for the chain module.

use moveflow_types::ErrorCode;
use thiserror::Error;

/// Result type alias for chain operations.
pub type ChainResult<T> = Result<T, ChainError>;

/// Errors that can occur while talking to an Aptos node.
#[derive(Debug, Error)]
pub enum ChainError {
    /// Connection-level failure (retryable).
    #[error("network error: {0}")]
    Network(String),

    /// Request or operation deadline exceeded (retryable).
    #[error("operation timed out: {0}")]
    Timeout(String),

    /// Node answered with a non-success status.
    #[error("node returned HTTP {status}: {message}")]
    Http {
        /// HTTP status code
        status: u16,
        /// Message extracted from the body
        message: String,
    },

    /// Account has no on-chain state.
    #[error("account not found: {address}")]
    AccountNotFound {
        /// Normalized account address
        address: String,
        /// Raw node message (carries the ledger version)
        message: String,
    },

    /// Resource, event handle or stream is absent.
    #[error("not found: {0}")]
    NotFound(String),

    /// Response body did not have the expected shape.
    #[error("malformed response: {0}")]
    Malformed(String),

    /// Transaction was rejected or executed unsuccessfully.
    #[error("transaction failed: {0}")]
    TransactionFailed(String),

    /// Key parsing or signing failure.
    #[error("signing error: {0}")]
    Signing(String),

    /// Caller supplied an unusable argument.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl ChainError {
    /// Create a new Network error.
    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network(msg.into())
    }

    /// Create a new Timeout error.
    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::Timeout(msg.into())
    }

    /// Create a new Http error.
    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self::Http {
            status,
            message: message.into(),
        }
    }

    /// Create a new AccountNotFound error.
    pub fn account_not_found(address: impl Into<String>, message: impl Into<String>) -> Self {
        Self::AccountNotFound {
            address: address.into(),
            message: message.into(),
        }
    }

    /// Create a new NotFound error.
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    /// Create a new Malformed error.
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::Malformed(msg.into())
    }

    /// Create a new TransactionFailed error.
    pub fn transaction_failed(reason: impl Into<String>) -> Self {
        Self::TransactionFailed(reason.into())
    }

    /// Create a new Signing error.
    pub fn signing(msg: impl Into<String>) -> Self {
        Self::Signing(msg.into())
    }

    /// Create a new InvalidInput error.
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a new Config error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Check if this error is retryable.
    ///
    /// Network failures, timeouts, rate limiting (429) and server errors
    /// (5xx) are transient. Everything else fails immediately.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network(_) | Self::Timeout(_) => true,
            Self::Http { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// Map to the caller-facing error code.
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::Network(_) => ErrorCode::ConnectionFailed,
            Self::Timeout(_) => ErrorCode::Timeout,
            Self::Http { status, .. } if *status == 429 || *status >= 500 => {
                ErrorCode::ConnectionFailed
            }
            Self::Http { .. } => ErrorCode::MalformedResponse,
            Self::AccountNotFound { .. } => ErrorCode::AccountNotFound,
            Self::NotFound(_) => ErrorCode::StreamNotFound,
            Self::Malformed(_) => ErrorCode::MalformedResponse,
            Self::TransactionFailed(_) => ErrorCode::TransactionFailed,
            Self::Signing(_) | Self::Config(_) => ErrorCode::InvalidConfig,
            Self::InvalidInput(_) => ErrorCode::InvalidAddress,
        }
    }
}

impl From<reqwest::Error> for ChainError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout(e.to_string())
        } else if e.is_decode() {
            Self::Malformed(e.to_string())
        } else {
            Self::Network(e.to_string())
        }
    }
}
