//! Amount formatting and parsing.
//!
//! All arithmetic runs on [`BigUint`]; amounts never pass through floating
//! point, so formatting is exact for any on-chain value.

use num_bigint::BigUint;
use num_traits::{ToPrimitive, Zero};

use crate::constants::APT_DECIMALS;
use crate::error::{TypesError, TypesResult};
use crate::token::is_native;

fn native_scale() -> BigUint {
    BigUint::from(10u32).pow(APT_DECIMALS)
}

/// Parse a non-empty string of ASCII digits.
pub fn parse_base_units(raw: &str) -> TypesResult<BigUint> {
    let digits = raw.trim();
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(TypesError::InvalidAmount(raw.to_string()));
    }
    BigUint::parse_bytes(digits.as_bytes(), 10).ok_or_else(|| TypesError::InvalidAmount(raw.to_string()))
}

/// Format a base-unit digit string for display.
///
/// The native coin renders with 8 decimals and an ` APT` suffix; other tokens
/// render as a comma-grouped integer.
pub fn format_amount(base_units: &str, token_type: &str) -> TypesResult<String> {
    let value = parse_base_units(base_units)?;
    Ok(format_base_units(&value, token_type))
}

/// Format an already resolved base-unit value.
pub fn format_base_units(value: &BigUint, token_type: &str) -> String {
    if is_native(token_type) {
        let scale = native_scale();
        let whole = value / &scale;
        let frac = value % &scale;
        format!(
            "{}.{:0>width$} APT",
            whole,
            frac.to_string(),
            width = APT_DECIMALS as usize
        )
    } else {
        group_thousands(&value.to_string())
    }
}

fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Convert a user-entered amount to base units.
///
/// Native amounts accept up to 8 fractional digits; further digits are
/// truncated. Other tokens take integer base units only.
pub fn parse_display_amount(display: &str, token_type: &str) -> TypesResult<BigUint> {
    let trimmed = display.trim();
    let invalid = || TypesError::InvalidAmount(display.to_string());

    if !is_native(token_type) {
        return parse_base_units(trimmed).map_err(|_| invalid());
    }

    let (whole, frac) = match trimmed.split_once('.') {
        Some((w, f)) => (w, f),
        None => (trimmed, ""),
    };
    if whole.is_empty() && frac.is_empty() {
        return Err(invalid());
    }
    let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if !all_digits(whole) || !all_digits(frac) {
        return Err(invalid());
    }

    let decimals = APT_DECIMALS as usize;
    let mut frac_digits: String = frac.chars().take(decimals).collect();
    while frac_digits.len() < decimals {
        frac_digits.push('0');
    }

    let whole_value = if whole.is_empty() {
        BigUint::zero()
    } else {
        BigUint::parse_bytes(whole.as_bytes(), 10).ok_or_else(invalid)?
    };
    let frac_value = BigUint::parse_bytes(frac_digits.as_bytes(), 10).ok_or_else(invalid)?;

    Ok(whole_value * native_scale() + frac_value)
}

/// Narrow a base-unit value to `u64`, the width of Move coin amounts.
pub fn to_u64_amount(value: &BigUint) -> TypesResult<u64> {
    value
        .to_u64()
        .ok_or_else(|| TypesError::InvalidAmount(format!("{} exceeds u64", value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{APT_COIN_TYPE, USDC_COIN_TYPE};

    #[test]
    fn test_native_formatting() {
        assert_eq!(format_amount("100000000", APT_COIN_TYPE).unwrap(), "1.00000000 APT");
        assert_eq!(format_amount("1", APT_COIN_TYPE).unwrap(), "0.00000001 APT");
        assert_eq!(format_amount("0", APT_COIN_TYPE).unwrap(), "0.00000000 APT");
        assert_eq!(format_amount("123456789012", APT_COIN_TYPE).unwrap(), "1234.56789012 APT");
    }

    #[test]
    fn test_native_formatting_beyond_u64() {
        // 2^64 + 1 octas
        let formatted = format_amount("18446744073709551617", APT_COIN_TYPE).unwrap();
        assert_eq!(formatted, "184467440737.09551617 APT");
    }

    #[test]
    fn test_other_token_grouping() {
        assert_eq!(format_amount("1234567", USDC_COIN_TYPE).unwrap(), "1,234,567");
        assert_eq!(format_amount("999", USDC_COIN_TYPE).unwrap(), "999");
        assert_eq!(format_amount("1000", USDC_COIN_TYPE).unwrap(), "1,000");
    }

    #[test]
    fn test_invalid_amounts() {
        for bad in ["", "abc", "-5", "1.5", "1e9", " "] {
            let err = format_amount(bad, APT_COIN_TYPE).unwrap_err();
            assert!(matches!(err, TypesError::InvalidAmount(_)), "{:?}", bad);
        }
    }

    #[test]
    fn test_formatting_preserves_digits() {
        let raw = "98765432109876543210123";
        let grouped = format_amount(raw, USDC_COIN_TYPE).unwrap();
        assert_eq!(grouped.replace(',', ""), raw);

        let native = format_amount(raw, APT_COIN_TYPE).unwrap();
        let digits: String = native.trim_end_matches(" APT").replace('.', "");
        assert_eq!(digits, raw);
    }

    #[test]
    fn test_parse_display_native() {
        assert_eq!(parse_display_amount("1", APT_COIN_TYPE).unwrap(), BigUint::from(100_000_000u64));
        assert_eq!(parse_display_amount("1.5", APT_COIN_TYPE).unwrap(), BigUint::from(150_000_000u64));
        assert_eq!(parse_display_amount(".25", APT_COIN_TYPE).unwrap(), BigUint::from(25_000_000u64));
        // Digits past the 8th decimal are truncated
        assert_eq!(parse_display_amount("0.000000019", APT_COIN_TYPE).unwrap(), BigUint::from(1u32));
    }

    #[test]
    fn test_parse_display_rejects_garbage() {
        assert!(parse_display_amount("", APT_COIN_TYPE).is_err());
        assert!(parse_display_amount(".", APT_COIN_TYPE).is_err());
        assert!(parse_display_amount("1.2.3", APT_COIN_TYPE).is_err());
        assert!(parse_display_amount("-1", APT_COIN_TYPE).is_err());
        assert!(parse_display_amount("1.5", USDC_COIN_TYPE).is_err());
        assert_eq!(parse_display_amount("250", USDC_COIN_TYPE).unwrap(), BigUint::from(250u32));
    }

    #[test]
    fn test_to_u64_amount() {
        assert_eq!(to_u64_amount(&BigUint::from(42u32)).unwrap(), 42);
        let huge = parse_base_units("18446744073709551616").unwrap();
        assert!(to_u64_amount(&huge).is_err());
    }
}
