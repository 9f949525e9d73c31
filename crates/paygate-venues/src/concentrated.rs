//! Fee-tiered concentrated-liquidity venue.
//!
//! Each fallback asset may have several pools against the settlement asset,
//! one per fee tier. The registered [`SwapParams::FeeTier`] picks the pool;
//! pricing is constant-product on the pool's ledger balances after the tier
//! fee.

use std::collections::HashMap;

use paygate_ledger::TokenLedger;
use paygate_types::{
    AccountId, Amount, AssetId, FeeTierPoolConfig, Result, SwapParams, VenueDialect,
};

use crate::{
    curve::{Curve, swap_failed},
    venue::{ResolvedPool, SwapRequest, SwapVenue},
};

/// Pool accounts keyed by `(input asset, fee tier)`.
#[derive(Debug, Clone, Default)]
pub struct FeeTierPools {
    pools: HashMap<(AssetId, u32), AccountId>,
}

impl FeeTierPools {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_configs(configs: &[FeeTierPoolConfig]) -> Self {
        let mut pools = Self::new();
        for config in configs {
            pools.insert(config.asset, config.fee_bps, config.pool);
        }
        pools
    }

    /// Register (or replace) the pool for `(asset, fee_bps)`.
    pub fn insert(&mut self, asset: AssetId, fee_bps: u32, pool: AccountId) {
        self.pools.insert((asset, fee_bps), pool);
    }

    #[must_use]
    pub fn get(&self, asset: AssetId, fee_bps: u32) -> Option<AccountId> {
        self.pools.get(&(asset, fee_bps)).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pools.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pools.is_empty()
    }

    pub(crate) fn resolve(&self, asset: AssetId, fee_bps: u32) -> Result<ResolvedPool> {
        let account = self.get(asset, fee_bps).ok_or_else(|| {
            swap_failed(format!("no pool for {asset} at fee tier {fee_bps} bps"))
        })?;
        Ok(ResolvedPool {
            account,
            curve: Curve::ConstantProduct { fee_bps },
        })
    }
}

#[derive(Debug, Clone)]
pub struct ConcentratedLiquidityVenue {
    router: AccountId,
    output_asset: AssetId,
    pools: FeeTierPools,
}

impl ConcentratedLiquidityVenue {
    #[must_use]
    pub fn new(router: AccountId, output_asset: AssetId, pools: FeeTierPools) -> Self {
        Self {
            router,
            output_asset,
            pools,
        }
    }

    #[must_use]
    pub fn pools(&self) -> &FeeTierPools {
        &self.pools
    }

    fn pool(&self, asset_in: AssetId, params: &SwapParams) -> Result<ResolvedPool> {
        let SwapParams::FeeTier(fee_bps) = *params else {
            return Err(swap_failed(format!(
                "concentrated-liquidity venue expects a fee tier, got {params}"
            )));
        };
        self.pools.resolve(asset_in, fee_bps)
    }
}

impl SwapVenue for ConcentratedLiquidityVenue {
    fn dialect(&self) -> VenueDialect {
        VenueDialect::ConcentratedLiquidity
    }

    fn address(&self) -> AccountId {
        self.router
    }

    fn output_asset(&self) -> AssetId {
        self.output_asset
    }

    fn quote_exact_input(
        &self,
        ledger: &TokenLedger,
        asset_in: AssetId,
        params: &SwapParams,
        amount_in: Amount,
    ) -> Result<Amount> {
        self.pool(asset_in, params)?
            .quote_exact_input(ledger, asset_in, self.output_asset, amount_in)
    }

    fn quote_exact_output(
        &self,
        ledger: &TokenLedger,
        asset_in: AssetId,
        params: &SwapParams,
        amount_out: Amount,
    ) -> Result<Amount> {
        self.pool(asset_in, params)?
            .quote_exact_output(ledger, asset_in, self.output_asset, amount_out)
    }

    fn swap_exact_input(&self, ledger: &mut TokenLedger, request: &SwapRequest) -> Result<Amount> {
        self.pool(request.asset_in, &request.params)?
            .execute(ledger, self.router, self.output_asset, request)
    }
}
