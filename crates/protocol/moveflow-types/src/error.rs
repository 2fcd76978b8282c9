//! Error types shared by the MoveFlow crates.
//!
//! [`ErrorCode`] is the stable, caller-facing classification that ends up in
//! every `{success: false, ...}` tool response. [`TypesError`] covers the
//! failures of the pure helpers in this crate.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type for the helpers in this crate.
pub type TypesResult<T> = Result<T, TypesError>;

/// Caller-facing error codes.
///
/// Ranges group the codes by the error taxonomy: validation errors are never
/// retried, upstream errors were retried and degraded before being reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u16)]
#[non_exhaustive]
pub enum ErrorCode {
    // =========================================================================
    // Query Errors (0x0001 - 0x00FF)
    // =========================================================================
    /// Stream not found for the given id
    StreamNotFound = 0x0001,
    /// Account does not exist on chain
    AccountNotFound = 0x0002,
    /// Account exists but holds no store for the requested token
    TokenNotFound = 0x0003,

    // =========================================================================
    // Validation Errors (0x0100 - 0x01FF)
    // =========================================================================
    /// Malformed account address
    InvalidAddress = 0x0100,
    /// Malformed amount string
    InvalidAmount = 0x0101,
    /// Parallel argument lists have different lengths
    LengthMismatch = 0x0102,
    /// Empty recipient list
    EmptyBatch = 0x0103,
    /// Too many streams in one batch
    BatchTooLarge = 0x0104,
    /// Unknown permission value
    InvalidPermission = 0x0105,
    /// Missing or unusable configuration
    InvalidConfig = 0x0106,

    // =========================================================================
    // Upstream Errors (0x0200 - 0x02FF)
    // =========================================================================
    /// Full node or indexer could not be reached
    ConnectionFailed = 0x0200,
    /// Operation exceeded its deadline
    Timeout = 0x0201,
    /// Upstream answered with an unexpected shape
    MalformedResponse = 0x0202,
    /// Transaction was rejected or failed on chain
    TransactionFailed = 0x0203,

    // =========================================================================
    // Internal Errors
    // =========================================================================
    /// Internal server error
    InternalError = 0xFFFF,
}

impl ErrorCode {
    /// Returns true if this is a query-related error (0x0001-0x00FF)
    pub fn is_query_error(&self) -> bool {
        let code = *self as u16;
        (0x0001..=0x00FF).contains(&code)
    }

    /// Returns true if this is a validation error (0x0100-0x01FF)
    pub fn is_validation_error(&self) -> bool {
        let code = *self as u16;
        (0x0100..=0x01FF).contains(&code)
    }

    /// Returns true if this is an upstream error (0x0200-0x02FF)
    pub fn is_upstream_error(&self) -> bool {
        let code = *self as u16;
        (0x0200..=0x02FF).contains(&code)
    }

    /// Get the numeric code value
    pub fn code(&self) -> u16 {
        *self as u16
    }

    /// Get a user-friendly suggestion for recovering from this error.
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            // Query errors
            Self::StreamNotFound => Some("Verify the stream id. Use get_account_streams to list known streams."),
            Self::AccountNotFound => Some("The account has no on-chain state yet. Fund it first or check the network."),
            Self::TokenNotFound => Some("The account holds no store for this token. Check the token type."),

            // Validation errors
            Self::InvalidAddress => Some("Addresses are 0x-prefixed hex strings of up to 64 digits."),
            Self::InvalidAmount => Some("Amounts are decimal strings such as \"1.5\"; non-native tokens take integer base units."),
            Self::LengthMismatch => Some("Provide exactly one amount (and optionally one name) per recipient."),
            Self::EmptyBatch => Some("Provide at least one recipient."),
            Self::BatchTooLarge => Some("Split the batch into chunks of at most 200 streams."),
            Self::InvalidPermission => Some("Use one of: sender, recipient, both, none."),
            Self::InvalidConfig => Some("Check APTOS_PRIVATE_KEY, APTOS_NETWORK and the config file."),

            // Upstream errors
            Self::ConnectionFailed => Some("Check network connectivity or the node URL, then try again."),
            Self::Timeout => Some("Try a smaller query range or try again later."),
            Self::MalformedResponse => Some("The node returned unexpected data. Try again or switch node URL."),
            Self::TransactionFailed => Some("Inspect the transaction on the explorer; check balance and permissions."),

            // Internal error
            Self::InternalError => Some("An internal error occurred. Please report this issue."),
        }
    }

    /// Get the error category name.
    pub fn category(&self) -> &'static str {
        if self.is_query_error() {
            "Query"
        } else if self.is_validation_error() {
            "Validation"
        } else if self.is_upstream_error() {
            "Upstream"
        } else {
            "Internal"
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ErrorCode::StreamNotFound => "STREAM_NOT_FOUND",
            ErrorCode::AccountNotFound => "ACCOUNT_NOT_FOUND",
            ErrorCode::TokenNotFound => "TOKEN_NOT_FOUND",
            ErrorCode::InvalidAddress => "INVALID_ADDRESS",
            ErrorCode::InvalidAmount => "INVALID_AMOUNT",
            ErrorCode::LengthMismatch => "LENGTH_MISMATCH",
            ErrorCode::EmptyBatch => "EMPTY_BATCH",
            ErrorCode::BatchTooLarge => "BATCH_TOO_LARGE",
            ErrorCode::InvalidPermission => "INVALID_PERMISSION",
            ErrorCode::InvalidConfig => "INVALID_CONFIG",
            ErrorCode::ConnectionFailed => "CONNECTION_FAILED",
            ErrorCode::Timeout => "TIMEOUT",
            ErrorCode::MalformedResponse => "MALFORMED_RESPONSE",
            ErrorCode::TransactionFailed => "TRANSACTION_FAILED",
            ErrorCode::InternalError => "INTERNAL_ERROR",
        };
        f.write_str(name)
    }
}

/// Errors raised by the pure helpers in this crate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypesError {
    /// Amount string is not a valid number for the token.
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    /// Address string is not a valid account address.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// Permission string is not one of the known values.
    #[error("invalid permission: {0}")]
    InvalidPermission(String),
}

impl TypesError {
    /// Get the caller-facing error code.
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::InvalidAmount(_) => ErrorCode::InvalidAmount,
            Self::InvalidAddress(_) => ErrorCode::InvalidAddress,
            Self::InvalidPermission(_) => ErrorCode::InvalidPermission,
        }
    }
}
