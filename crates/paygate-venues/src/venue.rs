//! The swap venue abstraction.
//!
//! A [`SwapVenue`] hides how a venue finds a pool and prices a swap. The
//! settlement engine only ever sees amounts and success or failure; it never
//! inspects how a rate was derived.

use paygate_ledger::TokenLedger;
use paygate_types::{AccountId, Amount, AssetId, Result, SwapParams, VenueDialect};

use crate::curve::{Curve, Reserves, swap_failed};

/// One exact-input swap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapRequest {
    pub asset_in: AssetId,
    pub params: SwapParams,
    pub amount_in: Amount,
    /// The swap fails if it would produce less than this.
    pub min_amount_out: Amount,
    /// Account the input is pulled from; must have approved the venue.
    pub payer: AccountId,
    /// Account the settlement-asset output is paid to.
    pub recipient: AccountId,
}

/// A venue converting fallback assets into the settlement asset.
///
/// Implementations are fixed for the lifetime of the gateway that owns them.
pub trait SwapVenue: Send + Sync {
    /// Which dialect this venue speaks.
    fn dialect(&self) -> VenueDialect;

    /// The account the payer must approve as spender.
    fn address(&self) -> AccountId;

    /// The asset every swap produces.
    fn output_asset(&self) -> AssetId;

    /// Output `amount_in` of `asset_in` would produce right now.
    fn quote_exact_input(
        &self,
        ledger: &TokenLedger,
        asset_in: AssetId,
        params: &SwapParams,
        amount_in: Amount,
    ) -> Result<Amount>;

    /// Smallest input of `asset_in` producing at least `amount_out`.
    fn quote_exact_output(
        &self,
        ledger: &TokenLedger,
        asset_in: AssetId,
        params: &SwapParams,
        amount_out: Amount,
    ) -> Result<Amount>;

    /// Pull `request.amount_in` from the payer and pay the output to the
    /// recipient. Returns the output amount.
    fn swap_exact_input(&self, ledger: &mut TokenLedger, request: &SwapRequest) -> Result<Amount>;
}

/// A pool resolved for one swap: where its reserves live and how it prices.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ResolvedPool {
    pub account: AccountId,
    pub curve: Curve,
}

impl ResolvedPool {
    pub fn reserves(&self, ledger: &TokenLedger, asset_in: AssetId, asset_out: AssetId) -> Reserves {
        Reserves {
            reserve_in: ledger.balance_of(asset_in, self.account),
            reserve_out: ledger.balance_of(asset_out, self.account),
        }
    }

    pub fn quote_exact_input(
        &self,
        ledger: &TokenLedger,
        asset_in: AssetId,
        asset_out: AssetId,
        amount_in: Amount,
    ) -> Result<Amount> {
        self.curve
            .amount_out(self.reserves(ledger, asset_in, asset_out), amount_in)
    }

    pub fn quote_exact_output(
        &self,
        ledger: &TokenLedger,
        asset_in: AssetId,
        asset_out: AssetId,
        amount_out: Amount,
    ) -> Result<Amount> {
        self.curve
            .amount_in(self.reserves(ledger, asset_in, asset_out), amount_out)
    }

    /// Price, pull input into the pool, pay output from the pool.
    ///
    /// Allowance and balance failures on the input pull bubble unchanged;
    /// everything the pool itself rejects is `SwapFailed`.
    pub fn execute(
        &self,
        ledger: &mut TokenLedger,
        spender: AccountId,
        asset_out: AssetId,
        request: &SwapRequest,
    ) -> Result<Amount> {
        let amount_out =
            self.quote_exact_input(ledger, request.asset_in, asset_out, request.amount_in)?;
        if amount_out.is_zero() {
            return Err(swap_failed(format!(
                "input {} of {} produces no output",
                request.amount_in, request.asset_in
            )));
        }
        if amount_out < request.min_amount_out {
            return Err(swap_failed(format!(
                "output {amount_out} below minimum {}",
                request.min_amount_out
            )));
        }

        ledger.transfer_from(
            request.asset_in,
            spender,
            request.payer,
            self.account,
            request.amount_in,
        )?;
        ledger
            .transfer(asset_out, self.account, request.recipient, amount_out)
            .map_err(|e| swap_failed(format!("pool {} cannot pay out: {e}", self.account)))?;

        tracing::debug!(
            pool = %self.account,
            asset_in = %request.asset_in,
            amount_in = %request.amount_in,
            amount_out = %amount_out,
            "Pool swap executed"
        );
        Ok(amount_out)
    }
}
