//! The settlement gateway.
//!
//! Settles a payment to a recipient in the settlement asset, whatever the
//! sender actually holds:
//! 1. Reject zero and malformed amounts
//! 2. Snapshot the fallback registry
//! 3. Run every pull, swap and delivery against a working copy of the ledger
//! 4. Verify supply conservation for every asset the settlement touched
//! 5. Commit the working copy and append one `PaymentProcessed` event
//!
//! Any failure before step 5 leaves the ledger, the registry and the event
//! log exactly as they were.

use std::sync::{Mutex, MutexGuard, PoisonError};

use paygate_ledger::{SharedLedger, TokenLedger};
use paygate_types::{
    AccountId, Amount, AssetId, FallbackAssetEntry, GatewayConfig, GatewayEvent, PaygateError,
    PaymentSource, Result, SettlementId, SettlementOutcome, SettlementRecord, SettlementRequest,
    SwapLeg, SwapParams, VenueDialect, constants, validate_amount,
};
use paygate_venues::{SwapRequest, SwapVenue, build_venue};
use rust_decimal::Decimal;

use crate::{
    auth::AuthorizationGuard,
    guard::ReentrancyGuard,
    registry::AssetRegistry,
};

/// Mutable gateway state other than balances.
#[derive(Debug)]
struct GatewayState {
    registry: AssetRegistry,
    auth: AuthorizationGuard,
    events: Vec<GatewayEvent>,
}

/// One fallback swap and where its output went.
struct CoveredLeg {
    leg: SwapLeg,
    /// Output delivered to the recipient.
    forwarded: Amount,
    /// Output refunded to the sender.
    surplus: Amount,
}

/// A payment gateway settling in one asset with ordered swap fallbacks.
///
/// The gateway's own account is the spender senders approve. It pulls
/// fallback assets into itself, approves the venue, and swaps with itself
/// as the output recipient before forwarding to the payee.
pub struct SettlementGateway {
    address: AccountId,
    settlement_asset: AssetId,
    venue: Box<dyn SwapVenue>,
    ledger: SharedLedger,
    state: Mutex<GatewayState>,
    guard: ReentrancyGuard,
}

impl std::fmt::Debug for SettlementGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SettlementGateway")
            .field("address", &self.address)
            .field("settlement_asset", &self.settlement_asset)
            .field("venue", &self.venue.dialect())
            .finish_non_exhaustive()
    }
}

impl SettlementGateway {
    /// Create a gateway with an empty fallback registry.
    ///
    /// # Errors
    /// - `Configuration` for a zero gateway or settlement asset address, or a
    ///   venue that does not produce the settlement asset
    /// - `InvalidAdmin` for a zero administrator
    pub fn new(
        address: AccountId,
        admin: AccountId,
        settlement_asset: AssetId,
        venue: Box<dyn SwapVenue>,
        ledger: SharedLedger,
    ) -> Result<Self> {
        if address.is_zero() {
            return Err(PaygateError::Configuration(
                "gateway address must not be zero".into(),
            ));
        }
        if settlement_asset.is_zero() {
            return Err(PaygateError::Configuration(
                "settlement asset must not be zero".into(),
            ));
        }
        if admin.is_zero() {
            return Err(PaygateError::InvalidAdmin(admin));
        }
        if venue.output_asset() != settlement_asset {
            return Err(PaygateError::Configuration(format!(
                "venue produces {} but the settlement asset is {settlement_asset}",
                venue.output_asset()
            )));
        }

        let registry = AssetRegistry::new(venue.dialect(), settlement_asset);
        Ok(Self {
            address,
            settlement_asset,
            venue,
            ledger,
            state: Mutex::new(GatewayState {
                registry,
                auth: AuthorizationGuard::new(admin),
                events: Vec::new(),
            }),
            guard: ReentrancyGuard::new(),
        })
    }

    /// Replace the fallback registry with `entries`, in priority order.
    ///
    /// No events are emitted for the initial registry.
    pub fn with_supported_tokens(self, entries: &[FallbackAssetEntry]) -> Result<Self> {
        let registry =
            AssetRegistry::with_entries(self.venue.dialect(), self.settlement_asset, entries)?;
        self.lock_state()?.registry = registry;
        Ok(self)
    }

    /// Build the gateway, its venue and its initial registry from config.
    pub fn from_config(config: &GatewayConfig, ledger: SharedLedger) -> Result<Self> {
        config.validate()?;
        let venue = build_venue(&config.venue, config.settlement_asset);
        let gateway = Self::new(
            config.gateway,
            config.admin,
            config.settlement_asset,
            venue,
            ledger,
        )?
        .with_supported_tokens(&config.supported_tokens)?;
        tracing::info!(
            engine = constants::ENGINE_NAME,
            version = constants::VERSION,
            gateway = %gateway.address,
            settlement_asset = %gateway.settlement_asset,
            dialect = %gateway.venue.dialect(),
            supported_tokens = config.supported_tokens.len(),
            "Gateway initialized"
        );
        Ok(gateway)
    }

    // -----------------------------------------------------------------
    // Settlement
    // -----------------------------------------------------------------

    /// Settle a request, dispatching on its payment source.
    pub fn settle(&self, request: &SettlementRequest) -> Result<SettlementOutcome> {
        match request.source {
            PaymentSource::Asset(asset) => {
                self.transfer(request.sender, asset, request.recipient, request.amount)
            }
            PaymentSource::Fallback => {
                self.transfer_with_fallback(request.sender, request.recipient, request.amount)
            }
        }
    }

    /// Pay `amount` of `asset` from `caller` to `recipient`.
    ///
    /// The settlement asset moves directly. A registered fallback asset is
    /// swapped in full and the whole output delivered.
    ///
    /// # Errors
    /// - `ZeroAmount` / `InvalidAmount` for a bad amount
    /// - `UnsupportedAsset` if `asset` is neither settled nor registered
    /// - `InsufficientAllowance` / `InsufficientBalance` from the ledger
    /// - `SwapFailed` from the venue
    /// - `Reentrancy` while another settlement is in flight
    pub fn transfer(
        &self,
        caller: AccountId,
        asset: AssetId,
        recipient: AccountId,
        amount: Amount,
    ) -> Result<SettlementOutcome> {
        let _entered = self.guard.enter()?;
        let result = self.transfer_asset(caller, asset, recipient, amount);
        log_rejection(&result, caller, amount);
        result
    }

    /// Pay `amount` of the settlement asset from `caller` to `recipient`,
    /// swapping registered fallback assets in priority order to cover any
    /// shortfall in the caller's settlement balance.
    ///
    /// # Errors
    /// - `ZeroAmount` / `InvalidAmount` for a bad amount
    /// - `InsufficientFunds` if direct balance and every fallback asset
    ///   together cannot cover `amount`
    /// - `InsufficientAllowance` / `InsufficientBalance` from the ledger
    /// - `SwapFailed` from the venue
    /// - `Reentrancy` while another settlement is in flight
    pub fn transfer_with_fallback(
        &self,
        caller: AccountId,
        recipient: AccountId,
        amount: Amount,
    ) -> Result<SettlementOutcome> {
        let _entered = self.guard.enter()?;
        let result = self.transfer_fallback(caller, recipient, amount);
        log_rejection(&result, caller, amount);
        result
    }

    fn transfer_asset(
        &self,
        sender: AccountId,
        asset: AssetId,
        recipient: AccountId,
        amount: Amount,
    ) -> Result<SettlementOutcome> {
        validate_amount(amount)?;
        let params = if asset == self.settlement_asset {
            None
        } else {
            let params = self.lock_state()?.registry.params(&asset);
            Some(params.ok_or(PaygateError::UnsupportedAsset(asset))?)
        };

        self.run_atomically(sender, recipient, (asset, amount), |ledger, outcome| {
            match params {
                None => {
                    ledger.transfer_from(asset, self.address, sender, recipient, amount)?;
                    outcome.direct_amount = amount;
                    outcome.delivered = amount;
                }
                Some(params) => {
                    let amount_out =
                        self.pull_and_swap(ledger, sender, asset, params, amount, recipient)?;
                    outcome.legs.push(SwapLeg {
                        asset,
                        amount_in: amount,
                        amount_out,
                    });
                    outcome.delivered = amount_out;
                }
            }
            Ok(())
        })
    }

    fn transfer_fallback(
        &self,
        sender: AccountId,
        recipient: AccountId,
        amount: Amount,
    ) -> Result<SettlementOutcome> {
        validate_amount(amount)?;
        let fallbacks = self.lock_state()?.registry.entries();
        let settlement = self.settlement_asset;

        self.run_atomically(sender, recipient, (settlement, amount), |ledger, outcome| {
            let direct = ledger.balance_of(settlement, sender).min(amount);
            if !direct.is_zero() {
                ledger.transfer_from(settlement, self.address, sender, recipient, direct)?;
                outcome.direct_amount = direct;
                outcome.delivered = direct;
            }

            let mut shortfall = amount - direct;
            for entry in &fallbacks {
                if shortfall.is_zero() {
                    break;
                }
                let Some(covered) =
                    self.cover_shortfall(ledger, sender, recipient, entry, shortfall)?
                else {
                    continue;
                };
                shortfall -= covered.forwarded;
                outcome.delivered += covered.forwarded;
                outcome.surplus_refunded += covered.surplus;
                outcome.legs.push(covered.leg);
            }

            if !shortfall.is_zero() {
                return Err(PaygateError::InsufficientFunds {
                    requested: amount,
                    shortfall,
                });
            }
            Ok(())
        })
    }

    /// Swap as much of one fallback asset as the shortfall needs, forward up
    /// to `shortfall` to the recipient and refund any excess to the sender.
    ///
    /// Returns `None` when the sender has nothing usable of this asset.
    fn cover_shortfall(
        &self,
        ledger: &mut TokenLedger,
        sender: AccountId,
        recipient: AccountId,
        entry: &FallbackAssetEntry,
        shortfall: Amount,
    ) -> Result<Option<CoveredLeg>> {
        let asset = entry.asset;
        let available = ledger.spendable(asset, sender, self.address);
        if available.is_zero() {
            tracing::debug!(asset = %asset, sender = %sender, "Fallback asset skipped: nothing spendable");
            return Ok(None);
        }

        // Solve for the shortfall only when the whole spendable amount would
        // overshoot it; a shallow pool may still take everything available.
        let full_out = self
            .venue
            .quote_exact_input(ledger, asset, &entry.params, available)?;
        if full_out.is_zero() {
            tracing::debug!(
                asset = %asset,
                available = %available,
                "Fallback asset skipped: spendable amount swaps to nothing"
            );
            return Ok(None);
        }
        let amount_in = if full_out <= shortfall {
            available
        } else {
            self.venue
                .quote_exact_output(ledger, asset, &entry.params, shortfall)?
                .min(available)
        };

        let amount_out =
            self.pull_and_swap(ledger, sender, asset, entry.params, amount_in, self.address)?;
        let forwarded = amount_out.min(shortfall);
        ledger.transfer(self.settlement_asset, self.address, recipient, forwarded)?;
        let surplus = amount_out - forwarded;
        if !surplus.is_zero() {
            ledger.transfer(self.settlement_asset, self.address, sender, surplus)?;
        }

        tracing::debug!(
            asset = %asset,
            amount_in = %amount_in,
            amount_out = %amount_out,
            forwarded = %forwarded,
            surplus = %surplus,
            "Fallback leg swapped"
        );
        Ok(Some(CoveredLeg {
            leg: SwapLeg {
                asset,
                amount_in,
                amount_out,
            },
            forwarded,
            surplus,
        }))
    }

    /// Pull `amount` of `asset` from `sender` into the gateway, approve the
    /// venue and swap it, paying the output to `output_to`.
    fn pull_and_swap(
        &self,
        ledger: &mut TokenLedger,
        sender: AccountId,
        asset: AssetId,
        params: SwapParams,
        amount: Amount,
        output_to: AccountId,
    ) -> Result<Amount> {
        ledger.transfer_from(asset, self.address, sender, self.address, amount)?;
        ledger.approve(asset, self.address, self.venue.address(), amount)?;
        let amount_out = self.venue.swap_exact_input(
            ledger,
            &SwapRequest {
                asset_in: asset,
                params,
                amount_in: amount,
                min_amount_out: Decimal::ZERO,
                payer: self.address,
                recipient: output_to,
            },
        )?;
        if amount_out.is_zero() {
            return Err(PaygateError::SwapFailed {
                reason: format!("venue returned no output for {amount} of {asset}"),
            });
        }
        // The venue may not have drawn the whole approval.
        ledger.approve(asset, self.address, self.venue.address(), Decimal::ZERO)?;
        Ok(amount_out)
    }

    /// Run `body` on a working copy of the ledger and commit it, with the
    /// settlement record, only if every step and the supply check pass.
    fn run_atomically<F>(
        &self,
        sender: AccountId,
        recipient: AccountId,
        requested: (AssetId, Amount),
        body: F,
    ) -> Result<SettlementOutcome>
    where
        F: FnOnce(&mut TokenLedger, &mut SettlementOutcome) -> Result<()>,
    {
        let mut ledger = self.lock_ledger()?;
        let mut working = ledger.clone();
        let mut outcome = SettlementOutcome {
            settlement_id: SettlementId::new(),
            sender,
            recipient,
            direct_amount: Decimal::ZERO,
            legs: Vec::new(),
            delivered: Decimal::ZERO,
            surplus_refunded: Decimal::ZERO,
        };
        body(&mut working, &mut outcome)?;

        working.verify_supply(self.settlement_asset)?;
        for leg in &outcome.legs {
            working.verify_supply(leg.asset)?;
        }

        let (input_asset, input_amount) = record_input(&outcome, requested);
        let record = SettlementRecord::from_outcome(&outcome, input_asset, input_amount);
        let mut state = self.lock_state()?;
        *ledger = working;
        drop(ledger);

        tracing::info!(
            settlement_id = %outcome.settlement_id,
            sender = %sender,
            recipient = %recipient,
            input_asset = %record.input_asset,
            input_amount = %record.input_amount,
            delivered = %outcome.delivered,
            legs = outcome.legs.len(),
            "Payment processed"
        );
        state.events.push(GatewayEvent::PaymentProcessed(record));
        Ok(outcome)
    }

    // -----------------------------------------------------------------
    // Administration
    // -----------------------------------------------------------------

    /// Append `asset` to the fallback registry at the lowest priority.
    ///
    /// # Errors
    /// `Unauthorized` for a non-admin caller, then any registry error.
    pub fn add_supported_token(
        &self,
        caller: AccountId,
        asset: AssetId,
        params: SwapParams,
    ) -> Result<()> {
        let _entered = self.guard.enter()?;
        let mut state = self.lock_state()?;
        authorize(&state.auth, caller)?;
        state.registry.add(asset, params)?;
        state
            .events
            .push(GatewayEvent::SupportedTokenAdded { asset, params });
        tracing::info!(asset = %asset, params = %params, "Supported token added");
        Ok(())
    }

    /// Remove `asset` from the fallback registry.
    ///
    /// # Errors
    /// `Unauthorized` for a non-admin caller, `NotSupported` if absent.
    pub fn remove_supported_token(&self, caller: AccountId, asset: AssetId) -> Result<()> {
        let _entered = self.guard.enter()?;
        let mut state = self.lock_state()?;
        authorize(&state.auth, caller)?;
        state.registry.remove(asset)?;
        state
            .events
            .push(GatewayEvent::SupportedTokenRemoved { asset });
        tracing::info!(asset = %asset, "Supported token removed");
        Ok(())
    }

    /// Hand administration to `new_admin`.
    pub fn transfer_admin(&self, caller: AccountId, new_admin: AccountId) -> Result<()> {
        let _entered = self.guard.enter()?;
        let mut state = self.lock_state()?;
        authorize(&state.auth, caller)?;
        let previous = state.auth.transfer_admin(caller, new_admin)?;
        state.events.push(GatewayEvent::AdminTransferred {
            previous: Some(previous),
            new: Some(new_admin),
        });
        tracing::info!(previous = %previous, new = %new_admin, "Admin transferred");
        Ok(())
    }

    /// Give up administration. The registry is frozen afterwards.
    pub fn renounce_admin(&self, caller: AccountId) -> Result<()> {
        let _entered = self.guard.enter()?;
        let mut state = self.lock_state()?;
        authorize(&state.auth, caller)?;
        let previous = state.auth.renounce(caller)?;
        state.events.push(GatewayEvent::AdminTransferred {
            previous: Some(previous),
            new: None,
        });
        tracing::info!(previous = %previous, "Admin renounced");
        Ok(())
    }

    // -----------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------

    #[must_use]
    pub fn is_supported_token(&self, asset: &AssetId) -> bool {
        self.read_state().registry.contains(asset)
    }

    #[must_use]
    pub fn supported_tokens_len(&self) -> usize {
        self.read_state().registry.len()
    }

    /// Registered fallback assets in priority order.
    #[must_use]
    pub fn supported_tokens(&self) -> Vec<FallbackAssetEntry> {
        self.read_state().registry.entries()
    }

    #[must_use]
    pub fn settlement_asset(&self) -> AssetId {
        self.settlement_asset
    }

    /// The gateway's own account: the spender senders approve.
    #[must_use]
    pub fn address(&self) -> AccountId {
        self.address
    }

    #[must_use]
    pub fn admin(&self) -> Option<AccountId> {
        self.read_state().auth.admin()
    }

    #[must_use]
    pub fn venue_dialect(&self) -> VenueDialect {
        self.venue.dialect()
    }

    #[must_use]
    pub fn venue_address(&self) -> AccountId {
        self.venue.address()
    }

    #[must_use]
    pub fn ledger(&self) -> SharedLedger {
        SharedLedger::clone(&self.ledger)
    }

    /// Every event emitted so far, oldest first.
    #[must_use]
    pub fn events(&self) -> Vec<GatewayEvent> {
        self.read_state().events.clone()
    }

    /// Take and clear the event log.
    ///
    /// # Errors
    /// `Internal` if the gateway state lock is poisoned.
    pub fn drain_events(&self) -> Result<Vec<GatewayEvent>> {
        Ok(std::mem::take(&mut self.lock_state()?.events))
    }

    fn lock_ledger(&self) -> Result<MutexGuard<'_, TokenLedger>> {
        self.ledger
            .lock()
            .map_err(|_| PaygateError::Internal("ledger lock poisoned".into()))
    }

    fn lock_state(&self) -> Result<MutexGuard<'_, GatewayState>> {
        self.state
            .lock()
            .map_err(|_| PaygateError::Internal("gateway state lock poisoned".into()))
    }

    /// State for reads. A poisoned lock still holds consistent state: every
    /// mutation validates before it writes.
    fn read_state(&self) -> MutexGuard<'_, GatewayState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn authorize(auth: &AuthorizationGuard, caller: AccountId) -> Result<()> {
    auth.ensure_admin(caller).inspect_err(|_| {
        tracing::warn!(caller = %caller, "Rejected administrator call");
    })
}

/// The input a record reports: the single asset the sender paid with, or
/// the requested asset and amount when payment was split or direct.
fn record_input(outcome: &SettlementOutcome, requested: (AssetId, Amount)) -> (AssetId, Amount) {
    match outcome.legs.as_slice() {
        [leg] if outcome.direct_amount.is_zero() => (leg.asset, leg.amount_in),
        _ => requested,
    }
}

fn log_rejection(result: &Result<SettlementOutcome>, caller: AccountId, amount: Amount) {
    if let Err(e) = result {
        tracing::warn!(sender = %caller, amount = %amount, error = %e, "Settlement rejected");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use paygate_venues::ConstantRateVenue;

    fn gateway() -> SettlementGateway {
        let settlement = AssetId::from_low_u64(0x1d);
        let router = AccountId::from_low_u64(0xa0);
        let venue = ConstantRateVenue::new(router, settlement, Decimal::new(100, 0));
        SettlementGateway::new(
            AccountId::from_low_u64(0x6a),
            AccountId::from_low_u64(1),
            settlement,
            Box::new(venue),
            TokenLedger::new().shared(),
        )
        .unwrap()
    }

    fn poison_state(gateway: &SettlementGateway) {
        std::thread::scope(|s| {
            let held = s.spawn(|| {
                let _state = gateway.state.lock().unwrap();
                panic!("poison the state lock");
            });
            assert!(held.join().is_err());
        });
    }

    fn outcome(direct: i64, legs: &[(u64, i64)]) -> SettlementOutcome {
        SettlementOutcome {
            settlement_id: SettlementId::new(),
            sender: AccountId::from_low_u64(1),
            recipient: AccountId::from_low_u64(2),
            direct_amount: Decimal::new(direct, 0),
            legs: legs
                .iter()
                .map(|&(asset, amount_in)| SwapLeg {
                    asset: AssetId::from_low_u64(asset),
                    amount_in: Decimal::new(amount_in, 0),
                    amount_out: Decimal::new(amount_in * 100, 0),
                })
                .collect(),
            delivered: Decimal::ZERO,
            surplus_refunded: Decimal::ZERO,
        }
    }

    #[test]
    fn record_reports_single_paying_asset() {
        let requested = (AssetId::from_low_u64(0x1d), Decimal::new(1000, 0));
        assert_eq!(
            record_input(&outcome(0, &[(0x57, 10)]), requested),
            (AssetId::from_low_u64(0x57), Decimal::new(10, 0))
        );
    }

    #[test]
    fn record_reports_request_when_split() {
        let requested = (AssetId::from_low_u64(0x1d), Decimal::new(1000, 0));
        assert_eq!(record_input(&outcome(200, &[(0x5c, 8)]), requested), requested);
        assert_eq!(
            record_input(&outcome(0, &[(0x57, 3), (0x5c, 7)]), requested),
            requested
        );
        assert_eq!(record_input(&outcome(1000, &[]), requested), requested);
    }

    #[test]
    fn initial_registry_validated_like_add() {
        let entries = [
            FallbackAssetEntry::new(AssetId::from_low_u64(0x57), SwapParams::None),
            FallbackAssetEntry::new(AssetId::from_low_u64(0x1d), SwapParams::None),
        ];
        let err = gateway().with_supported_tokens(&entries).unwrap_err();
        assert!(matches!(err, PaygateError::SettlementAssetNotAllowed(_)));

        let gateway = gateway().with_supported_tokens(&entries[..1]).unwrap();
        assert_eq!(gateway.supported_tokens(), entries[..1].to_vec());
        assert!(gateway.events().is_empty());
    }

    #[test]
    fn drain_events_refuses_poisoned_state() {
        let gateway = gateway();
        gateway
            .add_supported_token(
                AccountId::from_low_u64(1),
                AssetId::from_low_u64(0x57),
                SwapParams::None,
            )
            .unwrap();
        poison_state(&gateway);

        let err = gateway.drain_events().unwrap_err();
        assert!(matches!(err, PaygateError::Internal(_)));
        // Reads still see the log, which was left in place.
        assert_eq!(gateway.events().len(), 1);
    }
}
