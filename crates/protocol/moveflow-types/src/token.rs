//! Token registry.
//!
//! Users name tokens by shorthand (`APT`, `USDC`), upstream sources always use
//! the full Move type path.

use serde::{Deserialize, Serialize};

use crate::constants::{APT_COIN_TYPE, USDC_COIN_TYPE, USDT_COIN_TYPE};

/// Token reference carried in a normalized stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenInfo {
    /// Full Move type path
    #[serde(rename = "type")]
    pub token_type: String,
    /// Short display name (last `::` segment)
    pub name: String,
}

impl TokenInfo {
    /// Build from a type path, deriving the display name.
    pub fn from_type(token_type: impl Into<String>) -> Self {
        let token_type = token_type.into();
        let name = token_short_name(&token_type).to_string();
        Self { token_type, name }
    }
}

/// Resolve a shorthand or full type path to a full type path.
///
/// Empty input means the native coin.
pub fn normalize_token_type(raw: &str) -> String {
    let trimmed = raw.trim();
    match trimmed.to_ascii_uppercase().as_str() {
        "" | "APT" => APT_COIN_TYPE.to_string(),
        "USDT" => USDT_COIN_TYPE.to_string(),
        "USDC" => USDC_COIN_TYPE.to_string(),
        _ => trimmed.to_string(),
    }
}

/// Last `::` segment of a type path, without generic arguments.
pub fn token_short_name(token_type: &str) -> &str {
    let base = token_type.split('<').next().unwrap_or(token_type);
    base.rsplit("::").next().unwrap_or(base)
}

/// Whether the type is the native coin.
pub fn is_native(token_type: &str) -> bool {
    token_type.trim() == APT_COIN_TYPE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shorthands() {
        assert_eq!(normalize_token_type("apt"), APT_COIN_TYPE);
        assert_eq!(normalize_token_type(""), APT_COIN_TYPE);
        assert_eq!(normalize_token_type("USDC"), USDC_COIN_TYPE);
        assert_eq!(normalize_token_type(" usdt "), USDT_COIN_TYPE);
    }

    #[test]
    fn test_full_type_passes_through() {
        let custom = "0xabc::my_coin::MyCoin";
        assert_eq!(normalize_token_type(custom), custom);
    }

    #[test]
    fn test_short_name() {
        assert_eq!(token_short_name(APT_COIN_TYPE), "AptosCoin");
        assert_eq!(token_short_name("0x1::coin::CoinStore<0x1::aptos_coin::AptosCoin>"), "CoinStore");
        assert_eq!(token_short_name("plain"), "plain");
    }

    #[test]
    fn test_token_info_serializes_type_key() {
        let info = TokenInfo::from_type(APT_COIN_TYPE);
        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["type"], APT_COIN_TYPE);
        assert_eq!(json["name"], "AptosCoin");
    }
}
