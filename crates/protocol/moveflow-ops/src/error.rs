//! Error types for the operations layer.
//!
//! This module defines the `OpsError` enum used by all operation
//! functions in this crate.

use moveflow_chain::ChainError;
use moveflow_types::{ErrorCode, TypesError};
use serde_json::Value;
use thiserror::Error;

/// Result type for operations.
pub type OpsResult<T> = std::result::Result<T, OpsError>;

/// Errors that can occur during stream operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum OpsError {
    // =========================================================================
    // Query Errors
    // =========================================================================
    /// Stream not found by any source.
    #[error("stream not found with ID: {0}")]
    StreamNotFound(String),

    /// Account has no on-chain state.
    #[error("account {address} not found on {network}")]
    AccountNotFound {
        /// Queried address
        address: String,
        /// Network name
        network: String,
        /// Ledger version reported by the node
        ledger_version: Option<u64>,
    },

    /// Account holds no store for the token.
    #[error("no balance resource for {token_type} on {address}")]
    TokenNotFound {
        /// Queried address
        address: String,
        /// Requested token type
        token_type: String,
        /// Resource types the account does hold
        available_resources: Vec<String>,
    },

    /// No address given and no current account configured.
    #[error("no address given and no account configured")]
    NoAccount,

    // =========================================================================
    // Validation Errors
    // =========================================================================
    /// Recipient address is malformed.
    #[error("invalid recipient address: {0}")]
    InvalidAddress(String),

    /// Recipient and amount lists differ in length.
    #[error("recipients ({recipients}) and amounts ({amounts}) differ in length")]
    LengthMismatch {
        /// Number of recipients
        recipients: usize,
        /// Number of amounts
        amounts: usize,
    },

    /// Names list does not match recipients.
    #[error("names ({names}) and recipients ({recipients}) differ in length")]
    NamesMismatch {
        /// Number of names
        names: usize,
        /// Number of recipients
        recipients: usize,
    },

    /// Empty recipient list.
    #[error("recipient list is empty")]
    EmptyBatch,

    /// Batch exceeds the per-transaction limit.
    #[error("batch of {size} exceeds the limit of {max}")]
    BatchTooLarge {
        /// Requested size
        size: usize,
        /// Maximum allowed
        max: usize,
    },

    /// Duration must be positive.
    #[error("invalid duration: {0}")]
    InvalidDuration(String),

    // =========================================================================
    // Upstream Errors
    // =========================================================================
    /// Operation exceeded its deadline.
    #[error("{operation} timed out after {millis} ms")]
    Timeout {
        /// Operation name
        operation: String,
        /// Deadline in milliseconds
        millis: u64,
    },

    /// Upstream answered with an unexpected shape.
    #[error("malformed response: {message}")]
    Malformed {
        /// Description
        message: String,
        /// Offending payload
        raw_data: Option<Value>,
    },

    /// Every source failed.
    #[error("all sources failed: {0}")]
    AllSourcesFailed(String),

    // =========================================================================
    // Wrapped Errors
    // =========================================================================
    /// Chain error.
    #[error(transparent)]
    Chain(#[from] ChainError),

    /// Amount, address or permission error.
    #[error(transparent)]
    Types(#[from] TypesError),
}

impl OpsError {
    /// Create a malformed response error.
    pub fn malformed(message: impl Into<String>, raw_data: Option<Value>) -> Self {
        OpsError::Malformed {
            message: message.into(),
            raw_data,
        }
    }

    /// Create a timeout error.
    pub fn timeout(operation: impl Into<String>, millis: u64) -> Self {
        OpsError::Timeout {
            operation: operation.into(),
            millis,
        }
    }

    /// Get the caller-facing error code.
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::StreamNotFound(_) => ErrorCode::StreamNotFound,
            Self::AccountNotFound { .. } => ErrorCode::AccountNotFound,
            Self::TokenNotFound { .. } => ErrorCode::TokenNotFound,
            Self::NoAccount => ErrorCode::InvalidConfig,

            Self::InvalidAddress(_) => ErrorCode::InvalidAddress,
            Self::LengthMismatch { .. } | Self::NamesMismatch { .. } => ErrorCode::LengthMismatch,
            Self::EmptyBatch => ErrorCode::EmptyBatch,
            Self::BatchTooLarge { .. } => ErrorCode::BatchTooLarge,
            Self::InvalidDuration(_) => ErrorCode::InvalidAmount,

            Self::Timeout { .. } => ErrorCode::Timeout,
            Self::Malformed { .. } => ErrorCode::MalformedResponse,
            Self::AllSourcesFailed(_) => ErrorCode::ConnectionFailed,

            Self::Chain(e) => e.error_code(),
            Self::Types(e) => e.error_code(),
        }
    }

    /// Get a user-friendly suggestion for recovering from this error.
    pub fn suggestion(&self) -> &'static str {
        match self {
            Self::AllSourcesFailed(_) => {
                "The indexer may be temporarily unavailable. Try again later or query the node API directly."
            }
            Self::NoAccount => "Pass an address or set APTOS_PRIVATE_KEY.",
            Self::InvalidDuration(_) => "Duration is a positive number of seconds.",
            other => other.error_code().suggestion().unwrap_or("Please try again."),
        }
    }

    /// True for errors raised before any upstream call.
    pub fn is_validation(&self) -> bool {
        self.error_code().is_validation_error()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(OpsError::EmptyBatch.error_code(), ErrorCode::EmptyBatch);
        assert_eq!(
            OpsError::LengthMismatch {
                recipients: 2,
                amounts: 1
            }
            .error_code(),
            ErrorCode::LengthMismatch
        );
        assert_eq!(
            OpsError::from(ChainError::timeout("x")).error_code(),
            ErrorCode::Timeout
        );
        assert_eq!(
            OpsError::from(TypesError::InvalidAmount("x".into())).error_code(),
            ErrorCode::InvalidAmount
        );
    }

    #[test]
    fn test_validation_classification() {
        assert!(OpsError::EmptyBatch.is_validation());
        assert!(OpsError::InvalidAddress("zz".into()).is_validation());
        assert!(!OpsError::timeout("get_stream", 20_000).is_validation());
    }

    #[test]
    fn test_display() {
        let err = OpsError::timeout("get_account_streams", 40_000);
        assert_eq!(err.to_string(), "get_account_streams timed out after 40000 ms");
        assert!(!err.suggestion().is_empty());
    }
}
