//! Conversion of user-entered token amounts into integer base units.
//!
//! Every amount that crosses the approval or submission boundary must have
//! been normalized with the decimals of the exact token contract being
//! targeted. The same asset can use 6 decimals on one network and 18 on
//! another, so the decimals always come from an [`asset::Deployment`] and are
//! never assumed.

use {
    crate::{
        domain::{asset, eth},
        util::conv,
    },
    bigdecimal::BigDecimal,
    std::str::FromStr,
};

/// Normalizes a decimal string into integer base units for the specified
/// token deployment.
pub fn normalize(
    amount: &str,
    deployment: &asset::Deployment,
) -> Result<eth::U256, InvalidAmount> {
    to_units(amount, deployment.decimals)
}

/// Normalizes a decimal string into integer base units of a token with the
/// specified number of decimals.
///
/// Fails instead of rounding when the input has more fractional digits than
/// the token supports.
pub fn to_units(amount: &str, decimals: u8) -> Result<eth::U256, InvalidAmount> {
    let trimmed = amount.trim();
    let digits = trimmed.strip_prefix('+').unwrap_or(trimmed);
    if !is_plain_decimal(digits) {
        return Err(InvalidAmount::Malformed(amount.to_owned()));
    }

    let decimal =
        BigDecimal::from_str(digits).map_err(|_| InvalidAmount::Malformed(amount.to_owned()))?;

    let (_, scale) = decimal.normalized().as_bigint_and_exponent();
    if scale > i64::from(decimals) {
        return Err(InvalidAmount::TooPrecise {
            amount: amount.to_owned(),
            decimals,
        });
    }

    conv::decimal_to_units(&decimal, decimals)
        .ok_or_else(|| InvalidAmount::Overflow(amount.to_owned()))
}

/// Only `digits[.digits]` is accepted. Exponent notation is rejected so the
/// scale of the parsed number stays bounded by the length of the input.
fn is_plain_decimal(digits: &str) -> bool {
    let (integer, fraction) = digits.split_once('.').unwrap_or((digits, ""));
    !(integer.is_empty() && fraction.is_empty())
        && integer.bytes().all(|b| b.is_ascii_digit())
        && fraction.bytes().all(|b| b.is_ascii_digit())
}

/// Formats integer base units as a human readable decimal amount.
pub fn format(units: eth::U256, decimals: u8) -> String {
    conv::units_to_decimal(&units, decimals)
        .normalized()
        .to_string()
}

#[derive(Debug, thiserror::Error, Eq, PartialEq)]
pub enum InvalidAmount {
    #[error("{0:?} is not a non-negative decimal number")]
    Malformed(String),
    #[error("{amount:?} has more fractional digits than the {decimals} supported by the token")]
    TooPrecise { amount: String, decimals: u8 },
    #[error("{0:?} is too large")]
    Overflow(String),
    #[error("amount must be greater than zero")]
    Zero,
}
