//! Stream operations for MoveFlow.
//!
//! This crate turns the raw, inconsistent data the chain layer returns into
//! one normalized list of stream summaries per request, and wraps stream
//! creation and cancellation with validation.
//!
//! # Module Organization
//!
//! - [`error`] - Operation error types
//! - [`resolver`] - Versioned field spellings and typed lookups
//! - [`status`] - Status and progress derivation
//! - [`normalize`] - Raw record to normalized stream
//! - [`dedup`] - Collapse records sharing a stream id
//! - [`collector`] - Concurrent multi-source collection
//! - [`stream_ops`] - `StreamOperations` struct
//! - [`query`] - `get_stream`, `get_account_streams`
//! - [`create`] - Batch creation and cancellation
//! - [`wallet`] - Wallet balance
//! - [`diagnostics`] - Raw endpoint scan
//! - [`clock`] - Injectable time source
//!
//! # Pipeline
//!
//! ```text
//! retry/deadline ─► collector ─► dedup ─► resolver + status + amounts ─► Vec<NormalizedStream>
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use moveflow_chain::AptosConfig;
//! use moveflow_ops::StreamOperations;
//!
//! # async fn example() -> moveflow_ops::OpsResult<()> {
//! let ops = StreamOperations::from_config(AptosConfig::testnet())?;
//! let result = ops.get_account_streams(Some("0x1")).await?;
//! for stream in &result.streams {
//!     println!("{} {:?}", stream.stream_id, stream.status);
//! }
//! # Ok(())
//! # }
//! ```

pub mod clock;
pub mod collector;
pub mod create;
pub mod dedup;
pub mod diagnostics;
pub mod error;
pub mod normalize;
pub mod query;
pub mod resolver;
pub mod status;
pub mod stream_ops;
pub mod wallet;

pub use clock::{Clock, FixedClock, SystemClock};
pub use collector::{Collection, CollectorSettings, EventCollector, SourceKind, SourceReport};
pub use create::{
    prepare_batch, BatchCreateRequest, BatchCreateResult, CancelResult, PreparedBatch,
    TimeSettings,
};
pub use dedup::dedup_records;
pub use diagnostics::StreamScan;
pub use error::{OpsError, OpsResult};
pub use normalize::{display_amount, format_timestamp, normalize_record};
pub use query::{AccountStreams, QueryMode};
pub use resolver::{FieldSpec, SCHEMA_VERSION};
pub use status::{derive_progress, derive_status, TimeWindow};
pub use stream_ops::StreamOperations;
pub use wallet::WalletBalance;
