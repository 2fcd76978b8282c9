//! Account address normalization.
//!
//! Upstream sources disagree on address casing and on whether the `0x`
//! prefix is present, so every comparison goes through [`normalize_address`].

/// Canonicalize an account address: trim, lowercase, ensure a `0x` prefix.
///
/// Empty input maps to an empty string; callers read that as "use the
/// current account".
pub fn normalize_address(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    let lower = trimmed.to_lowercase();
    if lower.starts_with("0x") {
        lower
    } else {
        format!("0x{}", lower)
    }
}

/// Check that a string normalizes to `0x` followed by 1 to 64 hex digits.
pub fn is_valid_address(raw: &str) -> bool {
    let normalized = normalize_address(raw);
    let Some(body) = normalized.strip_prefix("0x") else {
        return false;
    };
    !body.is_empty() && body.len() <= 64 && body.chars().all(|c| c.is_ascii_hexdigit())
}

/// Compare two addresses, treating the short and long forms as equal.
///
/// Aptos prints special addresses short (`0x1`) and user accounts long,
/// with or without leading zeros depending on the source.
pub fn addresses_match(a: &str, b: &str) -> bool {
    let a = normalize_address(a);
    let b = normalize_address(b);
    if a.is_empty() || b.is_empty() {
        return false;
    }
    strip_leading_zeros(&a) == strip_leading_zeros(&b)
}

fn strip_leading_zeros(normalized: &str) -> &str {
    let body = normalized.trim_start_matches("0x").trim_start_matches('0');
    if body.is_empty() {
        "0"
    } else {
        body
    }
}
