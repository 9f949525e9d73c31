//! Swap parameter types shared by the registry and the venue adapters.
//!
//! Each venue dialect threads a different parameter into its pool lookup:
//!
//! | dialect | params |
//! |---|---|
//! | constant rate | none |
//! | concentrated liquidity | fee tier (bps) |
//! | stable / volatile | stable flag |
//! | universal router | fee tier (bps) |

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Amount, AssetId, PaygateError, Result, constants};

/// Per-asset parameters selecting the pool a fallback asset swaps through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum SwapParams {
    /// No parameters (constant-rate venue).
    None,
    /// Pool fee tier in basis points.
    FeeTier(u32),
    /// `true` selects the stable pool, `false` the volatile pool.
    Stable(bool),
}

impl SwapParams {
    #[must_use]
    pub fn kind(&self) -> SwapParamsKind {
        match self {
            Self::None => SwapParamsKind::None,
            Self::FeeTier(_) => SwapParamsKind::FeeTier,
            Self::Stable(_) => SwapParamsKind::Stable,
        }
    }

    /// Check the parameter values themselves (not their fit to a venue).
    ///
    /// # Errors
    /// Returns `InvalidSwapParams` for a fee tier outside `1..MAX_FEE_BPS`.
    pub fn validate(&self) -> Result<()> {
        if let Self::FeeTier(fee) = self {
            if *fee == 0 || *fee >= constants::MAX_FEE_BPS {
                return Err(PaygateError::InvalidSwapParams {
                    reason: format!(
                        "fee tier {fee} bps outside 1..{}",
                        constants::MAX_FEE_BPS
                    ),
                });
            }
        }
        Ok(())
    }
}

impl fmt::Display for SwapParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::FeeTier(fee) => write!(f, "fee:{fee}bps"),
            Self::Stable(true) => write!(f, "stable"),
            Self::Stable(false) => write!(f, "volatile"),
        }
    }
}

/// The shape of [`SwapParams`] a venue dialect expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SwapParamsKind {
    None,
    FeeTier,
    Stable,
}

impl fmt::Display for SwapParamsKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "NONE"),
            Self::FeeTier => write!(f, "FEE_TIER"),
            Self::Stable => write!(f, "STABLE"),
        }
    }
}

/// The swap venue dialect a gateway was built with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VenueDialect {
    /// Fixed exchange rate (used for deterministic testing).
    ConstantRate,
    /// Fee-tiered constant-product pools.
    ConcentratedLiquidity,
    /// Stable-peg and volatile constant-product pools.
    StableVolatile,
    /// Command-encoded router over fee-tiered pools.
    UniversalRouter,
}

impl VenueDialect {
    /// The params kind every registered asset must carry for this dialect.
    #[must_use]
    pub fn params_kind(self) -> SwapParamsKind {
        match self {
            Self::ConstantRate => SwapParamsKind::None,
            Self::ConcentratedLiquidity | Self::UniversalRouter => SwapParamsKind::FeeTier,
            Self::StableVolatile => SwapParamsKind::Stable,
        }
    }

    /// Check that `params` is well-formed and fits this dialect.
    ///
    /// # Errors
    /// Returns `InvalidSwapParams` on a kind mismatch or a bad value.
    pub fn check_params(self, params: &SwapParams) -> Result<()> {
        let expected = self.params_kind();
        if params.kind() != expected {
            return Err(PaygateError::InvalidSwapParams {
                reason: format!("{self} venue expects {expected} params, got {params}"),
            });
        }
        params.validate()
    }
}

impl fmt::Display for VenueDialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConstantRate => write!(f, "CONSTANT_RATE"),
            Self::ConcentratedLiquidity => write!(f, "CONCENTRATED_LIQUIDITY"),
            Self::StableVolatile => write!(f, "STABLE_VOLATILE"),
            Self::UniversalRouter => write!(f, "UNIVERSAL_ROUTER"),
        }
    }
}

/// A fallback asset registered for swap-based settlement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FallbackAssetEntry {
    pub asset: AssetId,
    pub params: SwapParams,
}

impl FallbackAssetEntry {
    #[must_use]
    pub fn new(asset: AssetId, params: SwapParams) -> Self {
        Self { asset, params }
    }
}

/// One fallback swap performed during a settlement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapLeg {
    /// The fallback asset consumed.
    pub asset: AssetId,
    /// Amount of the fallback asset pulled from the sender.
    pub amount_in: Amount,
    /// Settlement-asset output produced by the venue.
    pub amount_out: Amount,
}
