use alloy::primitives::U256;
use chzswap_common::{DexError, Reserves};

/// Pair swap fee, in thousandths (0.3%).
pub const FEE_PER_MILLE: u64 = 3;

const BASE: u64 = 1000;

/// Fee-adjusted constant-product output for an exact input.
///
/// dy = (dx * 997 * y) / (x * 1000 + dx * 997), the same value the pair
/// contract's own getAmountOut enforces on-chain.
pub fn amount_out(amount_in: U256, reserves: &Reserves) -> Result<U256, DexError> {
    let Reserves(reserve_in, reserve_out) = *reserves;
    if reserve_in.is_zero() || reserve_out.is_zero() {
        return Err(DexError::NoLiquidity);
    }
    if amount_in.is_zero() {
        return Err(DexError::InvalidAmount("zero input".into()));
    }

    let amount_in_with_fee = amount_in
        .checked_mul(U256::from(BASE - FEE_PER_MILLE))
        .ok_or_else(|| DexError::InvalidAmount("input too large".into()))?;
    let numerator = amount_in_with_fee
        .checked_mul(reserve_out)
        .ok_or_else(|| DexError::InvalidAmount("input too large".into()))?;
    let denominator = reserve_in
        .checked_mul(U256::from(BASE))
        .and_then(|scaled| scaled.checked_add(amount_in_with_fee))
        .ok_or_else(|| DexError::InvalidAmount("input too large".into()))?;

    Ok(numerator / denominator)
}

/// Pre-trade midpoint price: output units per input unit, decimal-adjusted.
pub fn mid_price(reserves: &Reserves, decimals_in: u8, decimals_out: u8) -> f64 {
    let r_in = crate::units::to_decimal(reserves.0, decimals_in);
    let r_out = crate::units::to_decimal(reserves.1, decimals_out);
    if r_in == 0.0 {
        return 0.0;
    }
    r_out / r_in
}

/// Realized price of a concrete trade: amount_out / amount_in, decimal-adjusted.
pub fn execution_price(
    amount_in: U256,
    amount_out: U256,
    decimals_in: u8,
    decimals_out: u8,
) -> f64 {
    let a_in = crate::units::to_decimal(amount_in, decimals_in);
    let a_out = crate::units::to_decimal(amount_out, decimals_out);
    if a_in == 0.0 {
        return 0.0;
    }
    a_out / a_in
}

/// Percentage the execution price falls short of the pre-trade midpoint.
pub fn price_impact_pct(mid: f64, execution: f64) -> f64 {
    if mid <= 0.0 {
        return 0.0;
    }
    ((mid - execution) / mid * 100.0).max(0.0)
}
