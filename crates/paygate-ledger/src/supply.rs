//! Supply conservation invariant checker.
//!
//! Invariant enforced before a settlement commits:
//! ```text
//! ∀ asset: Σ(balances) == Σ(mints) - Σ(burns)
//! ```
//!
//! Settlement and swaps only move balances between accounts, so any drift
//! means the ledger was corrupted mid-operation.

use std::collections::{HashMap, HashSet};

use paygate_types::{Amount, AssetId, PaygateError, Result};
use rust_decimal::Decimal;

/// Tracks per-asset issuance totals.
#[derive(Debug, Clone, Default)]
pub struct SupplyConservation {
    minted: HashMap<AssetId, Amount>,
    burned: HashMap<AssetId, Amount>,
}

impl SupplyConservation {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_mint(&mut self, asset: AssetId, amount: Amount) {
        *self.minted.entry(asset).or_insert(Decimal::ZERO) += amount;
    }

    pub fn record_burn(&mut self, asset: AssetId, amount: Amount) {
        *self.burned.entry(asset).or_insert(Decimal::ZERO) += amount;
    }

    /// Expected total supply for an asset: mints - burns.
    #[must_use]
    pub fn expected_supply(&self, asset: &AssetId) -> Amount {
        self.total_minted(asset) - self.total_burned(asset)
    }

    #[must_use]
    pub fn total_minted(&self, asset: &AssetId) -> Amount {
        self.minted.get(asset).copied().unwrap_or(Decimal::ZERO)
    }

    #[must_use]
    pub fn total_burned(&self, asset: &AssetId) -> Amount {
        self.burned.get(asset).copied().unwrap_or(Decimal::ZERO)
    }

    /// Verify that the actual supply matches issuance for `asset`.
    ///
    /// # Errors
    /// Returns [`PaygateError::SupplyInvariantViolation`] if actual ≠ expected.
    pub fn verify(&self, asset: &AssetId, actual_supply: Amount) -> Result<()> {
        let expected = self.expected_supply(asset);
        if actual_supply != expected {
            return Err(PaygateError::SupplyInvariantViolation {
                reason: format!(
                    "Asset {asset}: actual supply {actual_supply} != expected {expected} \
                     (minted={}, burned={})",
                    self.total_minted(asset),
                    self.total_burned(asset),
                ),
            });
        }
        Ok(())
    }

    /// Every asset that was ever minted or burned.
    #[must_use]
    pub fn tracked_assets(&self) -> Vec<AssetId> {
        let mut assets: HashSet<AssetId> = self.minted.keys().copied().collect();
        assets.extend(self.burned.keys().copied());
        let mut assets: Vec<AssetId> = assets.into_iter().collect();
        assets.sort();
        assets
    }
}
