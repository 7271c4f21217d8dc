//! Conversion between smallest ledger units and decimal display strings
//!
//! All arithmetic is integer-only. Balances are never routed through
//! floating point, neither when parsed from a source nor when rendered.

/// Largest number of fractional digits supported by the conversions
pub const MAX_DECIMALS: u32 = 18;

fn scale(decimals: u32) -> u128 {
    10u128.pow(decimals.min(MAX_DECIMALS))
}

/// Render an amount of smallest units as a decimal string
///
/// Always prints exactly `decimals` fractional digits, so
/// `format_units(50_000_000, 8)` is `"0.50000000"`.
pub fn format_units(amount: u64, decimals: u32) -> String {
    format_magnitude(amount as u128, decimals)
}

/// Render a signed delta with an explicit sign
///
/// Zero renders with a `+` sign.
pub fn format_signed_units(delta: i128, decimals: u32) -> String {
    let sign = if delta < 0 { '-' } else { '+' };
    format!("{}{}", sign, format_magnitude(delta.unsigned_abs(), decimals))
}

fn format_magnitude(amount: u128, decimals: u32) -> String {
    let decimals = decimals.min(MAX_DECIMALS);
    if decimals == 0 {
        return amount.to_string();
    }
    let scale = scale(decimals);
    format!(
        "{}.{:0width$}",
        amount / scale,
        amount % scale,
        width = decimals as usize
    )
}

/// Parse a decimal string into smallest units
///
/// Accepts an optional fractional part separated by `.`; digits beyond
/// `decimals` are truncated. Thousands separators must already be stripped.
/// Returns `None` for empty, negative, non-numeric or overflowing input.
pub fn parse_units(text: &str, decimals: u32) -> Option<u64> {
    let decimals = decimals.min(MAX_DECIMALS);
    let text = text.trim();
    let (whole, frac) = match text.split_once('.') {
        Some((whole, frac)) => (whole, frac),
        None => (text, ""),
    };

    if whole.is_empty() && frac.is_empty() {
        return None;
    }
    if !whole.chars().all(|c| c.is_ascii_digit()) || !frac.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }

    let whole: u128 = if whole.is_empty() { 0 } else { whole.parse().ok()? };

    let mut frac_value: u128 = 0;
    for (i, c) in frac.chars().take(decimals as usize).enumerate() {
        let digit = c.to_digit(10)? as u128;
        frac_value += digit * 10u128.pow(decimals - 1 - i as u32);
    }

    let total = whole.checked_mul(scale(decimals))?.checked_add(frac_value)?;
    u64::try_from(total).ok()
}
