//! # Amount Parsing & Fixed-Point Conversion
//!
//! All human-facing token amounts in Drawbridge are [`rust_decimal::Decimal`]
//! values; all on-chain balances are `u128` smallest units. This module is
//! the only place the two representations meet. Conversion is exact and
//! checked — an amount that cannot be represented faithfully is an error,
//! never a silently wrong number.
//!
//! The request syntax accepts two shapes:
//!
//! - a plain decimal literal (`"10.5"`) — an absolute amount, and
//! - a decimal literal with a `%` suffix (`"75%"`) — a share of the total
//!   balance across every variant of the symbol.
//!
//! A percentage above 100 parses fine. It is a user error, but one that
//! surfaces downstream as an insufficient-funds clamp rather than a parse
//! failure — the parser has no idea what the balance is.

use rust_decimal::Decimal;
use std::str::FromStr;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors from amount parsing and smallest-unit conversion.
#[derive(Debug, Error)]
pub enum AmountError {
    /// The input was not a valid decimal literal (with or without `%`).
    #[error("\"{0}\" is not a valid amount")]
    Parse(String),

    /// Negative amounts have no meaning for withdrawals.
    #[error("amount {0} is negative")]
    Negative(Decimal),

    /// The amount does not fit in `u128` smallest units at this scale.
    #[error("amount {amount} at {decimals} decimals overflows the smallest-unit range")]
    ScaleOverflow { amount: Decimal, decimals: u32 },

    /// A raw on-chain balance exceeds what the decimal type can represent.
    #[error("raw balance {raw} at {decimals} decimals exceeds decimal precision")]
    RawOutOfRange { raw: u128, decimals: u32 },
}

// ---------------------------------------------------------------------------
// AmountSpec
// ---------------------------------------------------------------------------

/// A parsed withdrawal amount, before resolution against balances.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AmountSpec {
    /// An absolute amount in human units.
    Exact(Decimal),
    /// A percentage of the total balance across all variants of the symbol.
    /// May exceed 100 — the overdraw is resolved later, not here.
    Percent(Decimal),
}

impl FromStr for AmountSpec {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        match trimmed.strip_suffix('%') {
            Some(prefix) => Ok(AmountSpec::Percent(parse_decimal(prefix.trim())?)),
            None => Ok(AmountSpec::Exact(parse_decimal(trimmed)?)),
        }
    }
}

/// Parses a non-negative decimal literal.
fn parse_decimal(s: &str) -> Result<Decimal, AmountError> {
    let value = Decimal::from_str(s).map_err(|_| AmountError::Parse(s.to_string()))?;
    if value.is_sign_negative() && !value.is_zero() {
        return Err(AmountError::Negative(value));
    }
    Ok(value)
}

// ---------------------------------------------------------------------------
// Smallest-Unit Conversion
// ---------------------------------------------------------------------------

/// Converts a human-unit amount to `u128` smallest units at the given scale.
///
/// The conversion is exact for every digit at or above the smallest unit;
/// digits *below* the smallest unit are truncated toward zero. Truncation
/// (rather than rounding up) is deliberate for withdrawals: overstating an
/// amount by even one smallest unit can push the request past the available
/// balance, while discarding sub-unit dust costs the user less than the
/// chain's own representation could ever pay out.
///
/// # Errors
///
/// [`AmountError::Negative`] for negative inputs and
/// [`AmountError::ScaleOverflow`] when the scaled value exceeds `u128`.
pub fn to_atomic(amount: Decimal, decimals: u32) -> Result<u128, AmountError> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(AmountError::Negative(amount));
    }

    let mantissa = amount.mantissa().unsigned_abs();
    let scale = amount.scale();

    if scale <= decimals {
        let exp = decimals - scale;
        10u128
            .checked_pow(exp)
            .and_then(|factor| mantissa.checked_mul(factor))
            .ok_or(AmountError::ScaleOverflow { amount, decimals })
    } else {
        // More fractional digits than the token carries: truncate the excess.
        let exp = scale - decimals;
        match 10u128.checked_pow(exp) {
            Some(divisor) => Ok(mantissa / divisor),
            // The divisor alone overflows u128, so the quotient is zero.
            None => Ok(0),
        }
    }
}

/// Converts a raw smallest-unit balance back to a human-unit decimal.
///
/// Exact, or [`AmountError::RawOutOfRange`] when the raw value exceeds the
/// 96-bit decimal mantissa (possible for very large balances of tokens with
/// many decimals; such a balance cannot participate in decimal arithmetic
/// without losing digits, so we refuse rather than approximate).
pub fn from_atomic(raw: u128, decimals: u32) -> Result<Decimal, AmountError> {
    let signed = i128::try_from(raw).map_err(|_| AmountError::RawOutOfRange { raw, decimals })?;
    Decimal::try_from_i128_with_scale(signed, decimals)
        .map(|d| d.normalize())
        .map_err(|_| AmountError::RawOutOfRange { raw, decimals })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
