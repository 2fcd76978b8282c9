//! Data structures for MoveFlow payment streams on Aptos.
//!
//! This crate holds the data model shared by the chain client, the
//! aggregation pipeline and the applications. It contains no I/O.
//!
//! # Module Organization
//!
//! - [`address`] - Account address normalization
//! - [`amount`] - Exact base-unit formatting and parsing
//! - [`constants`] - Network presets, timeouts, creation defaults
//! - [`error`] - Error codes and the crate error type
//! - [`record`] - Raw upstream records
//! - [`stream`] - Normalized stream summaries
//! - [`token`] - Token registry
//!
//! # Example
//!
//! ```
//! use moveflow_types::{format_amount, normalize_address, normalize_token_type};
//!
//! assert_eq!(normalize_address(" 0xABC "), "0xabc");
//!
//! let apt = normalize_token_type("APT");
//! assert_eq!(format_amount("150000000", &apt).unwrap(), "1.50000000 APT");
//! ```

/// Crate version (from Cargo.toml).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod address;
pub mod amount;
pub mod constants;
pub mod error;
pub mod record;
pub mod stream;
pub mod token;

pub use address::{addresses_match, is_valid_address, normalize_address};
pub use amount::{format_amount, format_base_units, parse_base_units, parse_display_amount, to_u64_amount};
pub use constants::*;
pub use error::{ErrorCode, TypesError, TypesResult};
pub use record::{RawRecord, RecordOrigin};
pub use stream::{
    NormalizedStream, Permission, Permissions, RecordSource, StreamAmounts, StreamDirection,
    StreamStatus, StreamTimes,
};
pub use token::{is_native, normalize_token_type, token_short_name, TokenInfo};

pub use num_bigint::BigUint;
