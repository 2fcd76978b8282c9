//! Command implementations.

pub mod balance;
pub mod config;
pub mod mcp_server;
pub mod query_streams;

pub use balance::balance;
pub use config::{config_init, config_show};
pub use mcp_server::mcp_server;
pub use query_streams::query_streams;
