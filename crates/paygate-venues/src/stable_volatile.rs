//! Stable/volatile venue.
//!
//! Each fallback asset may have a stable pool, a volatile pool, or both.
//! Stable pools swap at a configured peg with a small fee; volatile pools use
//! the constant-product curve. Either way the output is bounded by what the
//! pool account actually holds.

use std::collections::HashMap;

use paygate_ledger::TokenLedger;
use paygate_types::{
    AccountId, Amount, AssetId, Result, StableVolatilePoolConfig, SwapParams, VenueDialect,
    constants,
};
use rust_decimal::Decimal;

use crate::{
    curve::{Curve, swap_failed},
    venue::{ResolvedPool, SwapRequest, SwapVenue},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct StableVolatilePool {
    account: AccountId,
    /// Settlement-asset units per input unit. Only stable pools carry one.
    peg: Option<Decimal>,
}

#[derive(Debug, Clone)]
pub struct StableVolatileVenue {
    router: AccountId,
    output_asset: AssetId,
    pools: HashMap<(AssetId, bool), StableVolatilePool>,
}

impl StableVolatileVenue {
    #[must_use]
    pub fn new(router: AccountId, output_asset: AssetId) -> Self {
        Self {
            router,
            output_asset,
            pools: HashMap::new(),
        }
    }

    #[must_use]
    pub fn from_configs(
        router: AccountId,
        output_asset: AssetId,
        configs: &[StableVolatilePoolConfig],
    ) -> Self {
        let mut venue = Self::new(router, output_asset);
        for config in configs {
            venue.pools.insert(
                (config.asset, config.stable),
                StableVolatilePool {
                    account: config.pool,
                    peg: config.peg.filter(|_| config.stable),
                },
            );
        }
        venue
    }

    pub fn add_stable_pool(&mut self, asset: AssetId, pool: AccountId, peg: Decimal) {
        self.pools.insert(
            (asset, true),
            StableVolatilePool {
                account: pool,
                peg: Some(peg),
            },
        );
    }

    pub fn add_volatile_pool(&mut self, asset: AssetId, pool: AccountId) {
        self.pools.insert(
            (asset, false),
            StableVolatilePool {
                account: pool,
                peg: None,
            },
        );
    }

    fn pool(&self, asset_in: AssetId, params: &SwapParams) -> Result<ResolvedPool> {
        let SwapParams::Stable(stable) = *params else {
            return Err(swap_failed(format!(
                "stable/volatile venue expects a stable flag, got {params}"
            )));
        };
        let pool = self.pools.get(&(asset_in, stable)).ok_or_else(|| {
            swap_failed(format!("no {params} pool for {asset_in}"))
        })?;
        let curve = match pool.peg {
            Some(peg) if stable => Curve::Pegged {
                peg,
                fee_bps: constants::STABLE_FEE_BPS,
            },
            _ => Curve::ConstantProduct {
                fee_bps: constants::VOLATILE_FEE_BPS,
            },
        };
        Ok(ResolvedPool {
            account: pool.account,
            curve,
        })
    }
}

impl SwapVenue for StableVolatileVenue {
    fn dialect(&self) -> VenueDialect {
        VenueDialect::StableVolatile
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

#[cfg(test)]
mod tests {
    use paygate_types::PaygateError;

    use super::*;

    fn addr(n: u64) -> AccountId {
        AccountId::from_low_u64(n)
    }

    const ROUTER: u64 = 0xa0;
    const IDRX: u64 = 0x1d;
    const USDT: u64 = 0x57;
    const STABLE_POOL: u64 = 0xc1;
    const VOLATILE_POOL: u64 = 0xc2;

    fn setup() -> (StableVolatileVenue, TokenLedger) {
        let mut venue = StableVolatileVenue::new(addr(ROUTER), addr(IDRX));
        venue.add_stable_pool(addr(USDT), addr(STABLE_POOL), Decimal::new(100, 0));
        venue.add_volatile_pool(addr(USDT), addr(VOLATILE_POOL));

        let mut ledger = TokenLedger::new();
        ledger
            .mint(addr(IDRX), addr(STABLE_POOL), Decimal::new(1_000_000, 0))
            .unwrap();
        ledger
            .mint(addr(USDT), addr(VOLATILE_POOL), Decimal::new(10_000, 0))
            .unwrap();
        ledger
            .mint(addr(IDRX), addr(VOLATILE_POOL), Decimal::new(1_000_000, 0))
            .unwrap();
        (venue, ledger)
    }

    #[test]
    fn stable_pool_swaps_at_peg_less_fee() {
        let (venue, ledger) = setup();
        let out = venue
            .quote_exact_input(&ledger, addr(USDT), &SwapParams::Stable(true), Decimal::new(10, 0))
            .unwrap();
        // 10 × (1 − 0.0005) × 100
        assert_eq!(out, Decimal::new(9995, 1));
    }

    #[test]
    fn volatile_pool_uses_constant_product() {
        let (venue, ledger) = setup();
        let out = venue
            .quote_exact_input(&ledger, addr(USDT), &SwapParams::Stable(false), Decimal::new(10, 0))
            .unwrap();
        let expected = Curve::ConstantProduct {
            fee_bps: constants::VOLATILE_FEE_BPS,
        }
        .amount_out(
            crate::curve::Reserves {
                reserve_in: Decimal::new(10_000, 0),
                reserve_out: Decimal::new(1_000_000, 0),
            },
            Decimal::new(10, 0),
        )
        .unwrap();
        assert_eq!(out, expected);
        assert!(out < Decimal::new(1000, 0));
    }

    #[test]
    fn stable_swap_executes() {
        let (venue, mut ledger) = setup();
        ledger.mint(addr(USDT), addr(1), Decimal::new(20, 0)).unwrap();
        ledger
            .approve(addr(USDT), addr(1), addr(ROUTER), Decimal::new(20, 0))
            .unwrap();
        let needed = venue
            .quote_exact_output(&ledger, addr(USDT), &SwapParams::Stable(true), Decimal::new(1000, 0))
            .unwrap();
        let out = venue
            .swap_exact_input(
                &mut ledger,
                &SwapRequest {
                    asset_in: addr(USDT),
                    params: SwapParams::Stable(true),
                    amount_in: needed,
                    min_amount_out: Decimal::new(1000, 0),
                    payer: addr(1),
                    recipient: addr(2),
                },
            )
            .unwrap();
        assert!(out >= Decimal::new(1000, 0));
        assert_eq!(ledger.balance_of(addr(USDT), addr(STABLE_POOL)), needed);
        ledger.verify_all_supply().unwrap();
    }

    #[test]
    fn missing_pool_is_swap_failure() {
        let (venue, ledger) = setup();
        let err = venue
            .quote_exact_input(&ledger, addr(0x99), &SwapParams::Stable(true), Decimal::ONE)
            .unwrap_err();
        assert!(matches!(err, PaygateError::SwapFailed { .. }));
    }

    #[test]
    fn from_configs_without_peg_builds_volatile() {
        let venue = StableVolatileVenue::from_configs(
            addr(ROUTER),
            addr(IDRX),
            &[StableVolatilePoolConfig {
                asset: addr(USDT),
                stable: false,
                pool: addr(VOLATILE_POOL),
                peg: None,
            }],
        );
        let (_, ledger) = setup();
        assert!(
            venue
                .quote_exact_input(&ledger, addr(USDT), &SwapParams::Stable(false), Decimal::ONE)
                .is_ok()
        );
        assert!(
            venue
                .quote_exact_input(&ledger, addr(USDT), &SwapParams::Stable(true), Decimal::ONE)
                .is_err()
        );
    }
}
