//! Configuration types for a Paygate gateway and its swap venue.
//!
//! A [`GatewayConfig`] is usually loaded from JSON:
//!
//! ```json
//! {
//!   "gateway": "0x…",
//!   "admin": "0x…",
//!   "settlement_asset": "0x…",
//!   "venue": { "dialect": "constant_rate", "router": "0x…", "rate": "100" },
//!   "supported_tokens": [ { "asset": "0x…", "params": { "kind": "none" } } ]
//! }
//! ```

use std::collections::HashSet;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{AccountId, AssetId, FallbackAssetEntry, PaygateError, Result, SwapParams, VenueDialect};

/// Configuration for one gateway instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// The gateway's own account (the spender senders approve).
    pub gateway: AccountId,
    /// The single administrator allowed to mutate the registry.
    pub admin: AccountId,
    /// The asset recipients are always paid in.
    pub settlement_asset: AssetId,
    /// The swap venue, fixed for the gateway's lifetime.
    pub venue: VenueConfig,
    /// Initial fallback assets, in priority order.
    #[serde(default)]
    pub supported_tokens: Vec<FallbackAssetEntry>,
}

/// Venue selection and its pool tables.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "dialect", rename_all = "snake_case")]
pub enum VenueConfig {
    ConstantRate {
        router: AccountId,
        /// Settlement-asset units per unit of input.
        rate: Decimal,
    },
    ConcentratedLiquidity {
        router: AccountId,
        pools: Vec<FeeTierPoolConfig>,
    },
    StableVolatile {
        router: AccountId,
        pools: Vec<StableVolatilePoolConfig>,
    },
    UniversalRouter {
        router: AccountId,
        pools: Vec<FeeTierPoolConfig>,
    },
}

/// A fee-tiered pool pairing `asset` with the settlement asset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeeTierPoolConfig {
    pub asset: AssetId,
    pub fee_bps: u32,
    /// Account holding the pool's reserves.
    pub pool: AccountId,
}

/// A stable or volatile pool pairing `asset` with the settlement asset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StableVolatilePoolConfig {
    pub asset: AssetId,
    pub stable: bool,
    /// Account holding the pool's reserves.
    pub pool: AccountId,
    /// Settlement-asset units per input unit; required for stable pools.
    #[serde(default)]
    pub peg: Option<Decimal>,
}

impl VenueConfig {
    #[must_use]
    pub fn dialect(&self) -> VenueDialect {
        match self {
            Self::ConstantRate { .. } => VenueDialect::ConstantRate,
            Self::ConcentratedLiquidity { .. } => VenueDialect::ConcentratedLiquidity,
            Self::StableVolatile { .. } => VenueDialect::StableVolatile,
            Self::UniversalRouter { .. } => VenueDialect::UniversalRouter,
        }
    }

    #[must_use]
    pub fn router(&self) -> AccountId {
        match self {
            Self::ConstantRate { router, .. }
            | Self::ConcentratedLiquidity { router, .. }
            | Self::StableVolatile { router, .. }
            | Self::UniversalRouter { router, .. } => *router,
        }
    }

    fn validate(&self) -> Result<()> {
        require_non_zero("venue router", self.router())?;
        match self {
            Self::ConstantRate { rate, .. } => {
                if *rate <= Decimal::ZERO {
                    return Err(PaygateError::Configuration(format!(
                        "constant rate must be positive, got {rate}"
                    )));
                }
            }
            Self::ConcentratedLiquidity { pools, .. } | Self::UniversalRouter { pools, .. } => {
                for pool in pools {
                    require_non_zero("pool", pool.pool)?;
                    SwapParams::FeeTier(pool.fee_bps)
                        .validate()
                        .map_err(|e| PaygateError::Configuration(e.to_string()))?;
                }
            }
            Self::StableVolatile { pools, .. } => {
                for pool in pools {
                    require_non_zero("pool", pool.pool)?;
                    match (pool.stable, pool.peg) {
                        (true, None) => {
                            return Err(PaygateError::Configuration(format!(
                                "stable pool for {} needs a peg",
                                pool.asset
                            )));
                        }
                        (_, Some(peg)) if peg <= Decimal::ZERO => {
                            return Err(PaygateError::Configuration(format!(
                                "peg for {} must be positive, got {peg}",
                                pool.asset
                            )));
                        }
                        _ => {}
                    }
                }
            }
        }
        Ok(())
    }
}

impl GatewayConfig {
    /// Parse and validate a JSON config.
    ///
    /// # Errors
    /// Returns `Configuration` if the JSON is malformed or fails validation.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| PaygateError::Configuration(format!("invalid gateway config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check addresses, the venue table, and every initial registry entry.
    ///
    /// # Errors
    /// Returns `Configuration` describing the first problem found.
    pub fn validate(&self) -> Result<()> {
        require_non_zero("gateway", self.gateway)?;
        require_non_zero("admin", self.admin)?;
        require_non_zero("settlement asset", self.settlement_asset)?;
        self.venue.validate()?;

        let dialect = self.venue.dialect();
        let mut seen = HashSet::new();
        for entry in &self.supported_tokens {
            if entry.asset == self.settlement_asset {
                return Err(PaygateError::Configuration(format!(
                    "settlement asset {} listed as a supported token",
                    entry.asset
                )));
            }
            if !seen.insert(entry.asset) {
                return Err(PaygateError::Configuration(format!(
                    "supported token {} listed twice",
                    entry.asset
                )));
            }
            dialect
                .check_params(&entry.params)
                .map_err(|e| PaygateError::Configuration(e.to_string()))?;
        }
        Ok(())
    }
}

fn require_non_zero(what: &str, address: AccountId) -> Result<()> {
    if address.is_zero() {
        return Err(PaygateError::Configuration(format!(
            "{what} address must not be zero"
        )));
    }
    Ok(())
}
