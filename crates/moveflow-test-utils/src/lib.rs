//! Shared test utilities for MoveFlow.
//!
//! In-memory implementations of the chain seams plus JSON fixtures shaped
//! like real node responses.

pub mod helpers;
pub mod mock_node;
pub mod mock_sdk;

pub use helpers::*;
pub use mock_node::{MockNodeApi, NodeEndpoint};
pub use mock_sdk::MockStreamSdk;
