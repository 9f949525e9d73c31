//! Fungible-asset ledger.
//!
//! Tracks per-(asset, owner) balances and per-(asset, owner, spender)
//! allowances with standard token semantics: `balance_of`, `allowance`,
//! `approve`, `transfer`, `transfer_from`. All mutations are atomic: either
//! the full operation succeeds or the ledger is unchanged.
//!
//! `transfer_from` checks the allowance before the balance, so a sender who
//! holds the funds but never approved the spender sees
//! `InsufficientAllowance`.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use paygate_types::{AccountId, Amount, AssetId, PaygateError, Result};
use rust_decimal::Decimal;

use crate::supply::SupplyConservation;

/// A ledger shared between the gateway and whoever funds accounts.
pub type SharedLedger = Arc<Mutex<TokenLedger>>;

/// Source of truth for every asset balance the gateway touches.
///
/// Cloning a ledger produces an independent working copy; the settlement
/// engine runs each operation against a copy and commits it only on success.
#[derive(Debug, Clone, Default)]
pub struct TokenLedger {
    /// Per-(asset, owner) balances.
    balances: HashMap<(AssetId, AccountId), Amount>,
    /// Per-(asset, owner, spender) allowances.
    allowances: HashMap<(AssetId, AccountId, AccountId), Amount>,
    /// Issuance totals for the conservation check.
    supply: SupplyConservation,
}

impl TokenLedger {
    /// Create a new empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap this ledger for sharing.
    #[must_use]
    pub fn shared(self) -> SharedLedger {
        Arc::new(Mutex::new(self))
    }

    /// Issue new units of `asset` to `to`.
    pub fn mint(&mut self, asset: AssetId, to: AccountId, amount: Amount) -> Result<()> {
        ensure_non_negative(amount)?;
        *self.balances.entry((asset, to)).or_default() += amount;
        self.supply.record_mint(asset, amount);
        Ok(())
    }

    /// Destroy units of `asset` held by `from`.
    ///
    /// # Errors
    /// Returns `InsufficientBalance` if `from` holds less than `amount`.
    pub fn burn(&mut self, asset: AssetId, from: AccountId, amount: Amount) -> Result<()> {
        ensure_non_negative(amount)?;
        self.debit(asset, from, amount)?;
        self.supply.record_burn(asset, amount);
        Ok(())
    }

    /// Balance of `owner` in `asset` (zero if never funded).
    #[must_use]
    pub fn balance_of(&self, asset: AssetId, owner: AccountId) -> Amount {
        self.balances
            .get(&(asset, owner))
            .copied()
            .unwrap_or_default()
    }

    /// How much of `owner`'s `asset` the `spender` may move.
    #[must_use]
    pub fn allowance(&self, asset: AssetId, owner: AccountId, spender: AccountId) -> Amount {
        self.allowances
            .get(&(asset, owner, spender))
            .copied()
            .unwrap_or_default()
    }

    /// What `spender` can actually pull from `owner`: bounded by both
    /// balance and allowance.
    #[must_use]
    pub fn spendable(&self, asset: AssetId, owner: AccountId, spender: AccountId) -> Amount {
        self.balance_of(asset, owner)
            .min(self.allowance(asset, owner, spender))
    }

    /// Set `spender`'s allowance over `owner`'s `asset` (overwrites).
    pub fn approve(
        &mut self,
        asset: AssetId,
        owner: AccountId,
        spender: AccountId,
        amount: Amount,
    ) -> Result<()> {
        ensure_non_negative(amount)?;
        if amount.is_zero() {
            self.allowances.remove(&(asset, owner, spender));
        } else {
            self.allowances.insert((asset, owner, spender), amount);
        }
        Ok(())
    }

    /// Move `amount` of `asset` from `from` to `to`.
    ///
    /// # Errors
    /// Returns `InsufficientBalance` if `from` holds less than `amount`.
    pub fn transfer(
        &mut self,
        asset: AssetId,
        from: AccountId,
        to: AccountId,
        amount: Amount,
    ) -> Result<()> {
        ensure_non_negative(amount)?;
        self.debit(asset, from, amount)?;
        *self.balances.entry((asset, to)).or_default() += amount;
        Ok(())
    }

    /// Move `amount` of `asset` from `from` to `to` on behalf of `spender`,
    /// consuming allowance.
    ///
    /// # Errors
    /// - `InsufficientAllowance` if `spender` is approved for less than `amount`
    /// - `InsufficientBalance` if `from` holds less than `amount`
    pub fn transfer_from(
        &mut self,
        asset: AssetId,
        spender: AccountId,
        from: AccountId,
        to: AccountId,
        amount: Amount,
    ) -> Result<()> {
        ensure_non_negative(amount)?;
        let allowance = self.allowance(asset, from, spender);
        if allowance < amount {
            return Err(PaygateError::InsufficientAllowance {
                asset,
                spender,
                needed: amount,
                allowance,
            });
        }
        self.transfer(asset, from, to, amount)?;
        self.approve(asset, from, spender, allowance - amount)
    }

    /// Sum of every account's balance of `asset`.
    #[must_use]
    pub fn total_supply(&self, asset: AssetId) -> Amount {
        self.balances
            .iter()
            .filter(|((a, _), _)| *a == asset)
            .map(|(_, amount)| *amount)
            .sum()
    }

    /// Verify supply conservation for `asset`.
    ///
    /// # Errors
    /// Returns `SupplyInvariantViolation` if balances don't sum to issuance.
    pub fn verify_supply(&self, asset: AssetId) -> Result<()> {
        self.supply.verify(&asset, self.total_supply(asset))
    }

    /// Verify supply conservation for every asset ever issued.
    pub fn verify_all_supply(&self) -> Result<()> {
        self.supply
            .tracked_assets()
            .into_iter()
            .try_for_each(|asset| self.verify_supply(asset))
    }

    fn debit(&mut self, asset: AssetId, from: AccountId, amount: Amount) -> Result<()> {
        let available = self.balance_of(asset, from);
        if available < amount {
            return Err(PaygateError::InsufficientBalance {
                asset,
                owner: from,
                needed: amount,
                available,
            });
        }
        if amount.is_zero() {
            return Ok(());
        }
        let remaining = available - amount;
        if remaining.is_zero() {
            self.balances.remove(&(asset, from));
        } else {
            self.balances.insert((asset, from), remaining);
        }
        Ok(())
    }
}

fn ensure_non_negative(amount: Amount) -> Result<()> {
    if amount < Decimal::ZERO {
        return Err(PaygateError::InvalidAmount {
            reason: format!("{amount} is negative"),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(n: u64) -> AccountId {
        AccountId::from_low_u64(n)
    }

    fn usdt() -> AssetId {
        AssetId::from_low_u64(0xdead)
    }

    fn idrx() -> AssetId {
        AssetId::from_low_u64(0x1d)
    }

    #[test]
    fn mint_increases_balance() {
        let mut ledger = TokenLedger::new();
        ledger.mint(usdt(), user(1), Decimal::new(1000, 0)).unwrap();
        assert_eq!(ledger.balance_of(usdt(), user(1)), Decimal::new(1000, 0));
        assert_eq!(ledger.total_supply(usdt()), Decimal::new(1000, 0));
    }

    #[test]
    fn transfer_moves_funds() {
        let mut ledger = TokenLedger::new();
        ledger.mint(usdt(), user(1), Decimal::new(1000, 0)).unwrap();
        ledger
            .transfer(usdt(), user(1), user(2), Decimal::new(400, 0))
            .unwrap();
        assert_eq!(ledger.balance_of(usdt(), user(1)), Decimal::new(600, 0));
        assert_eq!(ledger.balance_of(usdt(), user(2)), Decimal::new(400, 0));
        ledger.verify_supply(usdt()).unwrap();
    }

    #[test]
    fn transfer_insufficient_fails_unchanged() {
        let mut ledger = TokenLedger::new();
        ledger.mint(usdt(), user(1), Decimal::new(100, 0)).unwrap();
        let err = ledger
            .transfer(usdt(), user(1), user(2), Decimal::new(200, 0))
            .unwrap_err();
        assert!(matches!(err, PaygateError::InsufficientBalance { .. }));
        assert_eq!(ledger.balance_of(usdt(), user(1)), Decimal::new(100, 0));
        assert_eq!(ledger.balance_of(usdt(), user(2)), Decimal::ZERO);
    }

    #[test]
    fn transfer_from_consumes_allowance() {
        let mut ledger = TokenLedger::new();
        let spender = user(9);
        ledger.mint(usdt(), user(1), Decimal::new(1000, 0)).unwrap();
        ledger
            .approve(usdt(), user(1), spender, Decimal::new(500, 0))
            .unwrap();
        ledger
            .transfer_from(usdt(), spender, user(1), user(2), Decimal::new(300, 0))
            .unwrap();
        assert_eq!(ledger.allowance(usdt(), user(1), spender), Decimal::new(200, 0));
        assert_eq!(ledger.balance_of(usdt(), user(2)), Decimal::new(300, 0));
    }

    #[test]
    fn transfer_from_checks_allowance_before_balance() {
        let mut ledger = TokenLedger::new();
        // Funds present, approval missing.
        ledger.mint(idrx(), user(1), Decimal::new(100, 0)).unwrap();
        let err = ledger
            .transfer_from(idrx(), user(9), user(1), user(2), Decimal::new(100, 0))
            .unwrap_err();
        assert!(matches!(err, PaygateError::InsufficientAllowance { .. }));

        // Approval present, funds missing.
        ledger
            .approve(idrx(), user(3), user(9), Decimal::new(100, 0))
            .unwrap();
        let err = ledger
            .transfer_from(idrx(), user(9), user(3), user(2), Decimal::new(100, 0))
            .unwrap_err();
        assert!(matches!(err, PaygateError::InsufficientBalance { .. }));
        // Allowance untouched by the failed pull.
        assert_eq!(ledger.allowance(idrx(), user(3), user(9)), Decimal::new(100, 0));
    }

    #[test]
    fn spendable_is_min_of_balance_and_allowance() {
        let mut ledger = TokenLedger::new();
        let spender = user(9);
        ledger.mint(usdt(), user(1), Decimal::new(50, 0)).unwrap();
        ledger
            .approve(usdt(), user(1), spender, Decimal::new(80, 0))
            .unwrap();
        assert_eq!(ledger.spendable(usdt(), user(1), spender), Decimal::new(50, 0));
        ledger
            .approve(usdt(), user(1), spender, Decimal::new(20, 0))
            .unwrap();
        assert_eq!(ledger.spendable(usdt(), user(1), spender), Decimal::new(20, 0));
    }

    #[test]
    fn burn_reduces_supply() {
        let mut ledger = TokenLedger::new();
        ledger.mint(usdt(), user(1), Decimal::new(10, 0)).unwrap();
        ledger.burn(usdt(), user(1), Decimal::new(4, 0)).unwrap();
        assert_eq!(ledger.total_supply(usdt()), Decimal::new(6, 0));
        ledger.verify_all_supply().unwrap();
    }

    #[test]
    fn negative_amounts_rejected() {
        let mut ledger = TokenLedger::new();
        let err = ledger
            .mint(usdt(), user(1), Decimal::new(-1, 0))
            .unwrap_err();
        assert!(matches!(err, PaygateError::InvalidAmount { .. }));
    }

    #[test]
    fn working_copy_is_independent() {
        let mut ledger = TokenLedger::new();
        ledger.mint(usdt(), user(1), Decimal::new(10, 0)).unwrap();
        let mut copy = ledger.clone();
        copy.transfer(usdt(), user(1), user(2), Decimal::new(10, 0))
            .unwrap();
        assert_eq!(ledger.balance_of(usdt(), user(1)), Decimal::new(10, 0));
        assert_eq!(copy.balance_of(usdt(), user(1)), Decimal::ZERO);
    }

    #[test]
    fn nonexistent_balance_is_zero() {
        let ledger = TokenLedger::new();
        assert!(ledger.balance_of(usdt(), user(1)).is_zero());
        assert!(ledger.allowance(usdt(), user(1), user(2)).is_zero());
    }
}
