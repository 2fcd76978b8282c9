//! Aptos chain access for MoveFlow.
//!
//! This crate connects the stream aggregation pipeline to an Aptos full
//! node and to the MoveFlow stream module deployed on it.
//!
//! # Architecture
//!
//! ```text
//! moveflow-ops                moveflow-chain
//! ┌─────────────────┐        ┌─────────────────────────────┐
//! │ query / collect │ ─────► │ StreamSdk (trait)           │
//! │ create / cancel │        │   └─ AptosStreamClient      │
//! │ wallet balance  │ ─────► │ NodeApi (trait)             │
//! └─────────────────┘        │   └─ NodeClient (reqwest)   │
//!                            └──────────────┬──────────────┘
//!                                           ▼
//!                            ┌─────────────────────────────┐
//!                            │ Aptos full node REST API    │
//!                            └─────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use moveflow_chain::{AptosConfig, AptosStreamClient, StreamSdk};
//!
//! # async fn example() -> moveflow_chain::ChainResult<()> {
//! let config = AptosConfig::testnet();
//! let client = AptosStreamClient::from_config(&config)?;
//! let stream = client.fetch_stream("42").await?;
//! println!("{:?}", stream);
//! # Ok(())
//! # }
//! ```

pub mod aptos;
pub mod config;
pub mod error;
pub mod node;
pub mod retry;
pub mod sdk;
pub mod signer;
pub mod transaction;

pub use aptos::{event_handle, event_stream_id, AptosStreamClient};
pub use config::{AptosConfig, AptosNetwork, RetryConfig, TimeoutConfig};
pub use error::{ChainError, ChainResult};
pub use node::{NodeApi, NodeClient};
pub use retry::RetryPolicy;
pub use sdk::{
    BatchCreateParams, CreateStreamParams, PageRequest, StreamSdk, StreamTerms, TxnOutcome,
};
pub use signer::{derive_address, LocalSigner};
pub use transaction::{submit_entry_function, EntryFunction};
