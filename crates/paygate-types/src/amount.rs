//! Amount model.
//!
//! Amounts are whole-token decimals at a fixed precision of
//! [`AMOUNT_DECIMALS`](crate::constants::AMOUNT_DECIMALS) fractional digits.
//! Venue outputs are rounded down and required inputs rounded up, so a
//! quoted input always covers the output it was solved for.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::{PaygateError, Result, constants::AMOUNT_DECIMALS};

/// Token amount in whole units.
pub type Amount = Decimal;

/// Smallest representable amount (one unit of precision).
#[must_use]
pub fn amount_unit() -> Amount {
    Decimal::new(1, AMOUNT_DECIMALS)
}

/// Round toward zero to the amount precision.
#[must_use]
pub fn round_down(amount: Decimal) -> Amount {
    amount.round_dp_with_strategy(AMOUNT_DECIMALS, RoundingStrategy::ToZero)
}

/// Round away from zero to the amount precision.
#[must_use]
pub fn round_up(amount: Decimal) -> Amount {
    amount.round_dp_with_strategy(AMOUNT_DECIMALS, RoundingStrategy::AwayFromZero)
}

/// Validate a requested transfer amount.
///
/// # Errors
/// - `ZeroAmount` if `amount` is zero
/// - `InvalidAmount` if it is negative or finer than the amount precision
pub fn validate_amount(amount: Amount) -> Result<()> {
    if amount.is_zero() {
        return Err(PaygateError::ZeroAmount);
    }
    if amount.is_sign_negative() {
        return Err(PaygateError::InvalidAmount {
            reason: format!("{amount} is negative"),
        });
    }
    if amount.normalize().scale() > AMOUNT_DECIMALS {
        return Err(PaygateError::InvalidAmount {
            reason: format!("{amount} has more than {AMOUNT_DECIMALS} decimal places"),
        });
    }
    Ok(())
}

/// `a * b`, or `ArithmeticOverflow`.
pub fn checked_mul(a: Decimal, b: Decimal) -> Result<Decimal> {
    a.checked_mul(b)
        .ok_or_else(|| PaygateError::ArithmeticOverflow(format!("{a} * {b}")))
}

/// `a / b`, or `ArithmeticOverflow` (also returned for a zero divisor).
pub fn checked_div(a: Decimal, b: Decimal) -> Result<Decimal> {
    a.checked_div(b)
        .ok_or_else(|| PaygateError::ArithmeticOverflow(format!("{a} / {b}")))
}

/// `a + b`, or `ArithmeticOverflow`.
pub fn checked_add(a: Decimal, b: Decimal) -> Result<Decimal> {
    a.checked_add(b)
        .ok_or_else(|| PaygateError::ArithmeticOverflow(format!("{a} + {b}")))
}
