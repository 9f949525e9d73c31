//! Identifiers used throughout Paygate.
//!
//! Accounts and assets share one 20-byte address space, the same way they
//! do on the host chain. Settlement records use UUIDv7 for time-ordered
//! sorting.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

use crate::PaygateError;

// ---------------------------------------------------------------------------
// Address
// ---------------------------------------------------------------------------

/// A 20-byte account or asset handle, displayed as `0x`-prefixed hex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Default)]
pub struct Address(pub [u8; 20]);

/// Handle of a fungible asset.
pub type AssetId = Address;

/// Handle of an account (sender, recipient, gateway, venue, pool).
pub type AccountId = Address;

impl Address {
    /// The null address.
    pub const ZERO: Self = Self([0u8; 20]);

    #[must_use]
    pub fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Deterministic address whose low 8 bytes hold `n` (big-endian).
    #[must_use]
    pub fn from_low_u64(n: u64) -> Self {
        let mut bytes = [0u8; 20];
        bytes[12..].copy_from_slice(&n.to_be_bytes());
        Self(bytes)
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl FromStr for Address {
    type Err = PaygateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.strip_prefix("0x").unwrap_or(s);
        let raw = hex::decode(digits)
            .map_err(|e| PaygateError::Serialization(format!("invalid address {s}: {e}")))?;
        let bytes: [u8; 20] = raw.try_into().map_err(|raw: Vec<u8>| {
            PaygateError::Serialization(format!(
                "invalid address {s}: expected 20 bytes, got {}",
                raw.len()
            ))
        })?;
        Ok(Self(bytes))
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Test helpers.
#[cfg(any(test, feature = "test-helpers"))]
impl Address {
    /// A random non-zero address.
    #[must_use]
    pub fn random() -> Self {
        use rand::RngCore;
        let mut bytes = [0u8; 20];
        loop {
            rand::thread_rng().fill_bytes(&mut bytes);
            if bytes != [0u8; 20] {
                return Self(bytes);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// SettlementId
// ---------------------------------------------------------------------------

/// Unique identifier of one successful settlement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct SettlementId(pub Uuid);

impl SettlementId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for SettlementId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SettlementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "stl:{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_prefixed_hex() {
        let addr = Address::from_low_u64(0xabcd);
        assert_eq!(
            addr.to_string(),
            "0x000000000000000000000000000000000000abcd"
        );
    }

    #[test]
    fn parse_accepts_with_and_without_prefix() {
        let addr = Address::from_low_u64(42);
        let with: Address = addr.to_string().parse().unwrap();
        let without: Address = addr.to_string()[2..].parse().unwrap();
        assert_eq!(with, addr);
        assert_eq!(without, addr);
    }

    #[test]
    fn parse_rejects_wrong_length() {
        let err = "0xdeadbeef".parse::<Address>().unwrap_err();
        assert!(matches!(err, PaygateError::Serialization(_)));
        assert!(err.to_string().contains("expected 20 bytes"));
    }

    #[test]
    fn parse_rejects_non_hex() {
        assert!("0xzz".parse::<Address>().is_err());
    }

    #[test]
    fn zero_address() {
        assert!(Address::ZERO.is_zero());
        assert!(!Address::from_low_u64(1).is_zero());
        assert_eq!(Address::default(), Address::ZERO);
    }

    #[test]
    fn random_addresses_differ() {
        let a = Address::random();
        let b = Address::random();
        assert_ne!(a, b);
        assert!(!a.is_zero());
    }

    #[test]
    fn serde_uses_hex_string() {
        let addr = Address::from_low_u64(7);
        let json = serde_json::to_string(&addr).unwrap();
        assert_eq!(json, format!("\"{addr}\""));
        let back: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(back, addr);
    }

    #[test]
    fn settlement_ids_are_time_ordered() {
        let a = SettlementId::new();
        let b = SettlementId::new();
        assert_ne!(a, b);
        assert!(a < b);
    }
}
