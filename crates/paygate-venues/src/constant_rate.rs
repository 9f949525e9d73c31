//! Constant-rate venue.
//!
//! Every fallback asset converts at one fixed rate into the settlement
//! asset. The router account itself holds the output liquidity, which makes
//! this the venue of choice for deterministic tests.

use paygate_ledger::TokenLedger;
use paygate_types::{AccountId, Amount, AssetId, Result, SwapParams, VenueDialect};
use rust_decimal::Decimal;

use crate::{
    curve::{Curve, swap_failed},
    venue::{ResolvedPool, SwapRequest, SwapVenue},
};

#[derive(Debug, Clone)]
pub struct ConstantRateVenue {
    router: AccountId,
    output_asset: AssetId,
    rate: Decimal,
}

impl ConstantRateVenue {
    #[must_use]
    pub fn new(router: AccountId, output_asset: AssetId, rate: Decimal) -> Self {
        Self {
            router,
            output_asset,
            rate,
        }
    }

    #[must_use]
    pub fn rate(&self) -> Decimal {
        self.rate
    }

    fn pool(&self, asset_in: AssetId, params: &SwapParams) -> Result<ResolvedPool> {
        if *params != SwapParams::None {
            return Err(swap_failed(format!(
                "constant-rate venue takes no params, got {params}"
            )));
        }
        if asset_in == self.output_asset {
            return Err(swap_failed("cannot swap the settlement asset into itself"));
        }
        Ok(ResolvedPool {
            account: self.router,
            curve: Curve::Fixed { rate: self.rate },
        })
    }
}

impl SwapVenue for ConstantRateVenue {
    fn dialect(&self) -> VenueDialect {
        VenueDialect::ConstantRate
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

    fn setup() -> (ConstantRateVenue, TokenLedger) {
        let venue = ConstantRateVenue::new(addr(ROUTER), addr(IDRX), Decimal::new(100, 0));
        let mut ledger = TokenLedger::new();
        ledger
            .mint(addr(IDRX), addr(ROUTER), Decimal::new(1_000_000, 0))
            .unwrap();
        ledger.mint(addr(USDT), addr(1), Decimal::new(50, 0)).unwrap();
        (venue, ledger)
    }

    fn request(amount_in: i64) -> SwapRequest {
        SwapRequest {
            asset_in: addr(USDT),
            params: SwapParams::None,
            amount_in: Decimal::new(amount_in, 0),
            min_amount_out: Decimal::ZERO,
            payer: addr(1),
            recipient: addr(2),
        }
    }

    #[test]
    fn quotes_at_fixed_rate() {
        let (venue, ledger) = setup();
        let out = venue
            .quote_exact_input(&ledger, addr(USDT), &SwapParams::None, Decimal::new(5, 0))
            .unwrap();
        assert_eq!(out, Decimal::new(500, 0));
        let needed = venue
            .quote_exact_output(&ledger, addr(USDT), &SwapParams::None, Decimal::new(500, 0))
            .unwrap();
        assert_eq!(needed, Decimal::new(5, 0));
    }

    #[test]
    fn swap_moves_input_to_router_and_pays_recipient() {
        let (venue, mut ledger) = setup();
        ledger
            .approve(addr(USDT), addr(1), addr(ROUTER), Decimal::new(10, 0))
            .unwrap();
        let out = venue.swap_exact_input(&mut ledger, &request(10)).unwrap();
        assert_eq!(out, Decimal::new(1000, 0));
        assert_eq!(ledger.balance_of(addr(IDRX), addr(2)), Decimal::new(1000, 0));
        assert_eq!(ledger.balance_of(addr(USDT), addr(ROUTER)), Decimal::new(10, 0));
        assert_eq!(ledger.balance_of(addr(USDT), addr(1)), Decimal::new(40, 0));
        ledger.verify_all_supply().unwrap();
    }

    #[test]
    fn swap_without_approval_bubbles_allowance_error() {
        let (venue, mut ledger) = setup();
        let err = venue.swap_exact_input(&mut ledger, &request(10)).unwrap_err();
        assert!(matches!(err, PaygateError::InsufficientAllowance { .. }));
    }

    #[test]
    fn min_amount_out_enforced() {
        let (venue, mut ledger) = setup();
        ledger
            .approve(addr(USDT), addr(1), addr(ROUTER), Decimal::new(10, 0))
            .unwrap();
        let mut req = request(10);
        req.min_amount_out = Decimal::new(1001, 0);
        let err = venue.swap_exact_input(&mut ledger, &req).unwrap_err();
        assert!(matches!(err, PaygateError::SwapFailed { .. }));
        assert_eq!(ledger.balance_of(addr(USDT), addr(1)), Decimal::new(50, 0));
    }

    #[test]
    fn router_liquidity_bounds_output() {
        let venue = ConstantRateVenue::new(addr(ROUTER), addr(IDRX), Decimal::new(100, 0));
        let ledger = TokenLedger::new();
        let err = venue
            .quote_exact_input(&ledger, addr(USDT), &SwapParams::None, Decimal::ONE)
            .unwrap_err();
        assert!(err.to_string().contains("insufficient liquidity"));
    }

    #[test]
    fn wrong_params_rejected() {
        let (venue, ledger) = setup();
        let err = venue
            .quote_exact_input(&ledger, addr(USDT), &SwapParams::FeeTier(30), Decimal::ONE)
            .unwrap_err();
        assert!(matches!(err, PaygateError::SwapFailed { .. }));
    }
}
