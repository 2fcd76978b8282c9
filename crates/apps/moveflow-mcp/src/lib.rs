//! MCP server for MoveFlow payment streams.
//!
//! Exposes stream creation, lookup, account aggregation, cancellation and
//! wallet balance as MCP tools over stdio.
//!
//! # Claude Desktop
//!
//! ```json
//! {
//!   "mcpServers": {
//!     "moveflow": {
//!       "command": "moveflow",
//!       "args": ["mcp-server"],
//!       "env": {
//!         "APTOS_PRIVATE_KEY": "0x...",
//!         "APTOS_NETWORK": "testnet"
//!       }
//!     }
//!   }
//! }
//! ```
//!
//! # Tools
//!
//! - `batch_create_stream` - open one stream per recipient in one transaction
//! - `get_stream` / `get_stream_info` - one stream by id
//! - `get_account_streams` - every stream an account sends or receives
//! - `cancel_stream` - close a stream
//! - `get_wallet_balance` - token balance of an account
//! - `status` - network and account in use

pub mod error;
pub mod server;
pub mod tools;

pub use error::{McpError, McpResult};
pub use server::{run_server, McpServerConfig, MoveflowMcpServer};
