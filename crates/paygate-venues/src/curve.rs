//! Pricing curves.
//!
//! Every venue dialect prices a swap with one of three curves. Forward
//! quotes round down to the amount precision; inverse quotes round up and
//! are then checked against the forward quote, so that
//! `amount_out(amount_in(x)) >= x` always holds.

use paygate_types::{
    Amount, PaygateError, Result, amount_unit, checked_add, checked_div, checked_mul, constants,
    round_down, round_up,
};
use rust_decimal::Decimal;

/// Attempts to nudge an inverse quote upward before giving up.
const MAX_INVERSE_ADJUSTMENTS: usize = 4;

/// Pool balances seen by one swap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reserves {
    /// Pool balance of the input asset.
    pub reserve_in: Amount,
    /// Pool balance of the output (settlement) asset.
    pub reserve_out: Amount,
}

/// The price function a pool applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Curve {
    /// `out = in × rate`, paid from the pool's output reserve.
    Fixed { rate: Decimal },
    /// `x · y = k` on the input after the fee.
    ConstantProduct { fee_bps: u32 },
    /// `out = in × (1 − fee) × peg`, paid from the pool's output reserve.
    Pegged { peg: Decimal, fee_bps: u32 },
}

impl Curve {
    /// Output for `amount_in`, rounded down.
    ///
    /// # Errors
    /// `SwapFailed` if the pool is empty or cannot pay the output.
    pub fn amount_out(&self, reserves: Reserves, amount_in: Amount) -> Result<Amount> {
        let out = match self {
            Self::Fixed { rate } => round_down(checked_mul(amount_in, *rate)?),
            Self::ConstantProduct { fee_bps } => {
                if reserves.reserve_in.is_zero() || reserves.reserve_out.is_zero() {
                    return Err(swap_failed("pool has no liquidity"));
                }
                let in_eff = after_fee(amount_in, *fee_bps)?;
                let numerator = checked_mul(reserves.reserve_out, in_eff)?;
                let denominator = checked_add(reserves.reserve_in, in_eff)?;
                round_down(checked_div(numerator, denominator)?)
            }
            Self::Pegged { peg, fee_bps } => {
                round_down(checked_mul(after_fee(amount_in, *fee_bps)?, *peg)?)
            }
        };
        if out > reserves.reserve_out {
            return Err(swap_failed(format!(
                "insufficient liquidity: output {out} exceeds reserve {}",
                reserves.reserve_out
            )));
        }
        Ok(out)
    }

    /// Smallest input whose output is at least `amount_out`, rounded up.
    ///
    /// # Errors
    /// `SwapFailed` if the pool cannot produce `amount_out` at all.
    pub fn amount_in(&self, reserves: Reserves, amount_out: Amount) -> Result<Amount> {
        if amount_out.is_zero() {
            return Ok(Decimal::ZERO);
        }
        let mut amount_in = match self {
            Self::Fixed { rate } => round_up(checked_div(amount_out, *rate)?),
            Self::ConstantProduct { fee_bps } => {
                if amount_out >= reserves.reserve_out {
                    return Err(swap_failed(format!(
                        "insufficient liquidity: cannot take {amount_out} from reserve {}",
                        reserves.reserve_out
                    )));
                }
                let in_eff = checked_div(
                    checked_mul(reserves.reserve_in, amount_out)?,
                    reserves.reserve_out - amount_out,
                )?;
                round_up(before_fee(in_eff, *fee_bps)?)
            }
            Self::Pegged { peg, fee_bps } => {
                round_up(before_fee(checked_div(amount_out, *peg)?, *fee_bps)?)
            }
        };

        for _ in 0..MAX_INVERSE_ADJUSTMENTS {
            if self.amount_out(reserves, amount_in)? >= amount_out {
                return Ok(amount_in);
            }
            amount_in += amount_unit();
        }
        Err(swap_failed(format!(
            "could not solve input for output {amount_out}"
        )))
    }
}

fn fee_fraction(fee_bps: u32) -> Decimal {
    Decimal::from(constants::BPS_DENOMINATOR - fee_bps) / Decimal::from(constants::BPS_DENOMINATOR)
}

fn after_fee(amount: Amount, fee_bps: u32) -> Result<Decimal> {
    checked_mul(amount, fee_fraction(fee_bps))
}

fn before_fee(amount: Amount, fee_bps: u32) -> Result<Decimal> {
    checked_div(amount, fee_fraction(fee_bps))
}

pub(crate) fn swap_failed(reason: impl Into<String>) -> PaygateError {
    PaygateError::SwapFailed {
        reason: reason.into(),
    }
}
