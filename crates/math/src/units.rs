use alloy::primitives::{
    utils::{format_units, parse_units},
    U256,
};
use chzswap_common::DexError;

/// Parse a user-typed decimal amount into raw token units.
///
/// This is the input validation boundary: anything malformed is rejected
/// here, before a chain call is ever attempted.
pub fn parse_amount(text: &str, decimals: u8) -> Result<U256, DexError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(DexError::InvalidAmount(text.to_string()));
    }
    let parsed =
        parse_units(trimmed, decimals).map_err(|_| DexError::InvalidAmount(text.to_string()))?;
    if parsed.is_negative() {
        return Err(DexError::InvalidAmount(text.to_string()));
    }
    Ok(parsed.get_absolute())
}

/// Render raw token units as a decimal string for display.
pub fn format_amount(value: U256, decimals: u8) -> String {
    format_units(value, decimals).unwrap_or_else(|_| value.to_string())
}

/// Lossy decimal-adjusted f64 view of a raw amount, for prices only.
pub fn to_decimal(value: U256, decimals: u8) -> f64 {
    format_amount(value, decimals).parse().unwrap_or(0.0)
}
