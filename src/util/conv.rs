//! Conversion utilities.

use {
    alloy::primitives::U256,
    bigdecimal::BigDecimal,
    num::{BigUint, Zero},
};

/// The largest power of ten that fits a `U256` is `10^77`.
const MAX_U256_DIGITS: u32 = 78;

pub fn biguint_to_u256(i: &BigUint) -> Option<U256> {
    let bytes = i.to_bytes_be();
    if bytes.len() > 32 {
        return None;
    }
    Some(U256::from_be_slice(&bytes))
}

pub fn u256_to_biguint(i: &U256) -> BigUint {
    BigUint::from_bytes_be(&i.to_be_bytes::<32>())
}

/// Scales a decimal token amount into integer base units of a token with the
/// specified number of decimals. Returns `None` if the amount is negative,
/// has more fractional digits than the token supports, or does not fit a
/// `U256`.
pub fn decimal_to_units(d: &BigDecimal, decimals: u8) -> Option<U256> {
    let (int, scale) = d.normalized().as_bigint_and_exponent();
    let uint = int.to_biguint()?;
    if uint.is_zero() {
        return Some(U256::ZERO);
    }

    let shift = u32::try_from(i64::from(decimals).checked_sub(scale)?).ok()?;
    if shift > MAX_U256_DIGITS {
        return None;
    }
    biguint_to_u256(&(uint * BigUint::from(10_u8).pow(shift)))
}

/// Converts integer base units of a token with the specified number of
/// decimals into a `BigDecimal` token amount.
pub fn units_to_decimal(units: &U256, decimals: u8) -> BigDecimal {
    BigDecimal::new(u256_to_biguint(units).into(), i64::from(decimals))
}
