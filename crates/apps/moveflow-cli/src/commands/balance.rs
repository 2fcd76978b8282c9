//! Show balance command.

use moveflow_ops::StreamOperations;

use crate::error::CliResult;
use crate::output::{OutputFormat, Render};

/// Execute the balance command.
pub async fn balance(
    ops: &StreamOperations,
    address: Option<&str>,
    token: Option<&str>,
    format: OutputFormat,
) -> CliResult<String> {
    let balance = ops.get_wallet_balance(address, token).await?;
    Ok(balance.render(format))
}
