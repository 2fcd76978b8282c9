//! Wallet balance lookup.
//!
//! Balances come straight from the account's resources. The coin store is
//! matched by exact type, then by `0x1::coin::CoinStore<T>`, then by short
//! name, then by any coin store at all.

use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use moveflow_chain::ChainError;
use moveflow_types::{
    normalize_token_type, parse_base_units, token_short_name, TokenInfo, MAX_LISTED_RESOURCES,
};

use crate::error::{OpsError, OpsResult};
use crate::normalize::display_amount;
use crate::stream_ops::StreamOperations;

const COIN_STORE_PREFIX: &str = "0x1::coin::CoinStore<";

/// Balance of one token on one account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WalletBalance {
    /// Formatted balance with token suffix
    pub balance: String,
    /// Balance in base units
    pub raw_balance: String,
    pub address: String,
    /// Token type of the matched resource
    pub token_type: String,
    /// Matched resource type
    pub resource_type: String,
}

fn resource_type(resource: &Value) -> &str {
    resource.get("type").and_then(Value::as_str).unwrap_or_default()
}

/// Pick the resource holding `token_type`.
pub fn find_coin_resource<'a>(resources: &'a [Value], token_type: &str) -> Option<&'a Value> {
    let wrapped = format!("{}{}>", COIN_STORE_PREFIX, token_type);
    let by_short_name = Regex::new(&format!(
        "CoinStore<.*{}.*>$",
        regex::escape(token_short_name(token_type))
    ))
    .ok();

    resources
        .iter()
        .find(|r| resource_type(r) == token_type)
        .or_else(|| resources.iter().find(|r| resource_type(r) == wrapped))
        .or_else(|| {
            by_short_name
                .as_ref()
                .and_then(|re| resources.iter().find(|r| re.is_match(resource_type(r))))
        })
        .or_else(|| {
            resources
                .iter()
                .find(|r| resource_type(r).contains("::coin::CoinStore<"))
        })
}

/// Token type inside a resource's generic brackets.
pub fn inner_type(resource_type: &str) -> Option<&str> {
    let start = resource_type.find('<')?;
    let end = resource_type.rfind('>')?;
    (end > start + 1).then(|| &resource_type[start + 1..end])
}

/// Ledger version embedded in a node's account-not-found message.
pub fn parse_ledger_version(message: &str) -> Option<u64> {
    let re = Regex::new(r"Ledger version\((\d+)\)").ok()?;
    re.captures(message)?.get(1)?.as_str().parse().ok()
}

impl StreamOperations {
    /// Balance of `token_type` (default APT) held by `address` (default the
    /// current account).
    pub async fn get_wallet_balance(
        &self,
        address: Option<&str>,
        token_type: Option<&str>,
    ) -> OpsResult<WalletBalance> {
        let address = self.resolve_address(address)?;
        let requested = normalize_token_type(token_type.unwrap_or_default());

        debug!(address = %address, token = %requested, "Fetching account resources");
        let node = self.node.as_ref();
        let addr = address.as_str();
        let data = match self
            .retry
            .execute(move || node.get_account_resources(addr))
            .await
        {
            Ok(data) => data,
            Err(ChainError::AccountNotFound { message, .. }) => {
                return Err(OpsError::AccountNotFound {
                    ledger_version: parse_ledger_version(&message),
                    network: self.config.network.to_string(),
                    address,
                });
            }
            Err(e) => return Err(e.into()),
        };

        let Some(resources) = data.as_array() else {
            return Err(OpsError::malformed(
                "account resources are not an array",
                Some(data),
            ));
        };

        let Some(resource) = find_coin_resource(resources, &requested) else {
            return Err(OpsError::TokenNotFound {
                address,
                token_type: requested,
                available_resources: resources
                    .iter()
                    .take(MAX_LISTED_RESOURCES)
                    .map(|r| resource_type(r).to_string())
                    .collect(),
            });
        };

        let matched_type = resource_type(resource).to_string();
        let actual = inner_type(&matched_type)
            .map(str::to_string)
            .unwrap_or_else(|| requested.clone());

        let raw_balance = match resource.pointer("/data/coin/value") {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => "0".to_string(),
        };
        let value = parse_base_units(&raw_balance)?;
        let balance = display_amount(&value, &TokenInfo::from_type(actual.clone()));

        info!(address = %address, token = %actual, balance = %balance, "Wallet balance");

        Ok(WalletBalance {
            balance,
            raw_balance,
            address,
            token_type: actual,
            resource_type: matched_type,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use moveflow_types::{APT_COIN_TYPE, USDC_COIN_TYPE};
    use serde_json::json;

    fn resources() -> Vec<Value> {
        vec![
            json!({"type": "0x1::account::Account", "data": {}}),
            json!({"type": "0x1::coin::CoinStore<0x1::aptos_coin::AptosCoin>", "data": {"coin": {"value": "1"}}}),
            json!({"type": "0x1::coin::CoinStore<0x9::wrapped::USDC>", "data": {"coin": {"value": "2"}}}),
        ]
    }

    #[test]
    fn test_wrapped_match() {
        let res = resources();
        let found = find_coin_resource(&res, APT_COIN_TYPE).unwrap();
        assert_eq!(found["data"]["coin"]["value"], "1");
    }

    #[test]
    fn test_short_name_match() {
        let res = resources();
        let found = find_coin_resource(&res, USDC_COIN_TYPE).unwrap();
        assert_eq!(found["data"]["coin"]["value"], "2");
    }

    #[test]
    fn test_any_coin_store_fallback() {
        let res = resources();
        let found = find_coin_resource(&res, "0x3::other::TOKEN").unwrap();
        assert_eq!(found["data"]["coin"]["value"], "1");

        let none = find_coin_resource(&res[..1], "0x3::other::TOKEN");
        assert!(none.is_none());
    }

    #[test]
    fn test_inner_type() {
        assert_eq!(
            inner_type("0x1::coin::CoinStore<0x1::aptos_coin::AptosCoin>"),
            Some("0x1::aptos_coin::AptosCoin")
        );
        assert_eq!(inner_type("0x1::account::Account"), None);
    }

    #[test]
    fn test_parse_ledger_version() {
        let message = "Account not found by Address(0xabc) and Ledger version(123456)";
        assert_eq!(parse_ledger_version(message), Some(123_456));
        assert_eq!(parse_ledger_version("no version here"), None);
    }
}
