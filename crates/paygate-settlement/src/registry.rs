//! Ordered registry of fallback assets.
//!
//! Insertion order is priority order: the fallback path walks the registry
//! front to back. Removing an asset keeps the relative order of the rest.
//!
//! Every mutation validates first, so a rejected add or remove leaves the
//! registry exactly as it was.

use indexmap::IndexMap;
use paygate_types::{
    AssetId, FallbackAssetEntry, PaygateError, Result, SwapParams, VenueDialect, constants,
};

#[derive(Debug, Clone)]
pub struct AssetRegistry {
    dialect: VenueDialect,
    settlement_asset: AssetId,
    entries: IndexMap<AssetId, SwapParams>,
}

impl AssetRegistry {
    #[must_use]
    pub fn new(dialect: VenueDialect, settlement_asset: AssetId) -> Self {
        Self {
            dialect,
            settlement_asset,
            entries: IndexMap::new(),
        }
    }

    /// Build a registry from an initial list, in order.
    ///
    /// # Errors
    /// The first error [`AssetRegistry::add`] would return for any entry.
    pub fn with_entries(
        dialect: VenueDialect,
        settlement_asset: AssetId,
        entries: &[FallbackAssetEntry],
    ) -> Result<Self> {
        let mut registry = Self::new(dialect, settlement_asset);
        for entry in entries {
            registry.add(entry.asset, entry.params)?;
        }
        Ok(registry)
    }

    /// Append `asset` at the lowest priority.
    ///
    /// # Errors
    /// - `SettlementAssetNotAllowed` for the settlement asset
    /// - `AlreadySupported` if `asset` is registered
    /// - `InvalidSwapParams` if `params` don't fit the venue dialect
    /// - `RegistryFull` at `MAX_SUPPORTED_TOKENS` entries
    pub fn add(&mut self, asset: AssetId, params: SwapParams) -> Result<()> {
        if asset == self.settlement_asset {
            return Err(PaygateError::SettlementAssetNotAllowed(asset));
        }
        if self.entries.contains_key(&asset) {
            return Err(PaygateError::AlreadySupported(asset));
        }
        self.dialect.check_params(&params)?;
        if self.entries.len() >= constants::MAX_SUPPORTED_TOKENS {
            return Err(PaygateError::RegistryFull {
                max: constants::MAX_SUPPORTED_TOKENS,
            });
        }
        self.entries.insert(asset, params);
        Ok(())
    }

    /// Remove `asset`, returning its params.
    ///
    /// # Errors
    /// `NotSupported` if `asset` is not registered.
    pub fn remove(&mut self, asset: AssetId) -> Result<SwapParams> {
        self.entries
            .shift_remove(&asset)
            .ok_or(PaygateError::NotSupported(asset))
    }

    #[must_use]
    pub fn contains(&self, asset: &AssetId) -> bool {
        self.entries.contains_key(asset)
    }

    #[must_use]
    pub fn params(&self, asset: &AssetId) -> Option<SwapParams> {
        self.entries.get(asset).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in priority order.
    pub fn iter(&self) -> impl Iterator<Item = FallbackAssetEntry> + '_ {
        self.entries
            .iter()
            .map(|(asset, params)| FallbackAssetEntry::new(*asset, *params))
    }

    #[must_use]
    pub fn entries(&self) -> Vec<FallbackAssetEntry> {
        self.iter().collect()
    }

    #[must_use]
    pub fn dialect(&self) -> VenueDialect {
        self.dialect
    }
}
