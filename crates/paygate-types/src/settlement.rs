//! Settlement request, outcome, and the emitted record.
//!
//! A [`SettlementRequest`] and its [`SettlementOutcome`] live for one call.
//! The [`SettlementRecord`] is what survives: it is appended to the
//! gateway's event log exactly once per successful settlement.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::{AccountId, Amount, AssetId, SettlementId, SwapLeg, SwapParams};

/// Where the sender's funds come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentSource {
    /// Pay in the named asset: the settlement asset directly, or one
    /// registered fallback asset swapped in full.
    Asset(AssetId),
    /// Pay the requested settlement-asset amount from the sender's
    /// settlement balance first, then from registered fallback assets in
    /// priority order.
    Fallback,
}

/// A request to settle `amount` from `sender` to `recipient`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementRequest {
    pub sender: AccountId,
    pub recipient: AccountId,
    /// For [`PaymentSource::Asset`] this is denominated in that asset;
    /// for [`PaymentSource::Fallback`] it is the settlement-asset amount owed.
    pub amount: Amount,
    pub source: PaymentSource,
}

impl SettlementRequest {
    #[must_use]
    pub fn asset(sender: AccountId, asset: AssetId, recipient: AccountId, amount: Amount) -> Self {
        Self {
            sender,
            recipient,
            amount,
            source: PaymentSource::Asset(asset),
        }
    }

    #[must_use]
    pub fn fallback(sender: AccountId, recipient: AccountId, amount: Amount) -> Self {
        Self {
            sender,
            recipient,
            amount,
            source: PaymentSource::Fallback,
        }
    }
}

/// What one successful settlement did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementOutcome {
    pub settlement_id: SettlementId,
    pub sender: AccountId,
    pub recipient: AccountId,
    /// Settlement asset moved straight from sender to recipient.
    pub direct_amount: Amount,
    /// Fallback swaps in the order they were performed.
    pub legs: Vec<SwapLeg>,
    /// Total settlement asset the recipient received.
    pub delivered: Amount,
    /// Swap output above the shortfall, returned to the sender.
    pub surplus_refunded: Amount,
}

impl SettlementOutcome {
    #[must_use]
    pub fn used_swap(&self) -> bool {
        !self.legs.is_empty()
    }

    /// Amount of `asset` pulled from the sender across all legs.
    #[must_use]
    pub fn consumed(&self, asset: &AssetId) -> Amount {
        self.legs
            .iter()
            .filter(|leg| leg.asset == *asset)
            .map(|leg| leg.amount_in)
            .sum()
    }
}

/// The settlement record emitted for every successful transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementRecord {
    pub id: SettlementId,
    pub sender: AccountId,
    pub recipient: AccountId,
    /// The asset the request was denominated in.
    pub input_asset: AssetId,
    pub input_amount: Amount,
    /// Settlement asset delivered to the recipient.
    pub output_amount: Amount,
    pub used_swap: bool,
    /// First fallback asset consumed, if any.
    pub swap_asset: Option<AssetId>,
    /// Amount of `swap_asset` consumed.
    pub swap_amount: Option<Amount>,
    /// Every swap leg, in order.
    pub legs: Vec<SwapLeg>,
    pub settled_at: DateTime<Utc>,
}

impl SettlementRecord {
    /// Build the record for an outcome.
    #[must_use]
    pub fn from_outcome(
        outcome: &SettlementOutcome,
        input_asset: AssetId,
        input_amount: Amount,
    ) -> Self {
        let first = outcome.legs.first();
        Self {
            id: outcome.settlement_id,
            sender: outcome.sender,
            recipient: outcome.recipient,
            input_asset,
            input_amount,
            output_amount: outcome.delivered,
            used_swap: outcome.used_swap(),
            swap_asset: first.map(|leg| leg.asset),
            swap_amount: first.map(|leg| leg.amount_in),
            legs: outcome.legs.clone(),
            settled_at: Utc::now(),
        }
    }

    /// SHA-256 over the economically relevant fields, for audit trails.
    ///
    /// The timestamp is excluded so that two nodes replaying the same
    /// settlement agree on the digest.
    #[must_use]
    pub fn digest(&self) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(b"paygate:settlement:v1:");
        hasher.update(self.id.0.as_bytes());
        hasher.update(self.sender.as_bytes());
        hasher.update(self.recipient.as_bytes());
        hasher.update(self.input_asset.as_bytes());
        hasher.update(self.input_amount.normalize().to_string().as_bytes());
        hasher.update(self.output_amount.normalize().to_string().as_bytes());
        hasher.update([u8::from(self.used_swap)]);
        hasher.update((self.legs.len() as u64).to_le_bytes());
        for leg in &self.legs {
            hasher.update(leg.asset.as_bytes());
            hasher.update(leg.amount_in.normalize().to_string().as_bytes());
            hasher.update(leg.amount_out.normalize().to_string().as_bytes());
        }
        let mut out = [0u8; 32];
        out.copy_from_slice(&hasher.finalize());
        out
    }
}

/// Everything the gateway emits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GatewayEvent {
    PaymentProcessed(SettlementRecord),
    SupportedTokenAdded { asset: AssetId, params: SwapParams },
    SupportedTokenRemoved { asset: AssetId },
    AdminTransferred {
        previous: Option<AccountId>,
        new: Option<AccountId>,
    },
}

impl GatewayEvent {
    /// The settlement record, for `PaymentProcessed` events.
    #[must_use]
    pub fn as_payment(&self) -> Option<&SettlementRecord> {
        match self {
            Self::PaymentProcessed(record) => Some(record),
            _ => None,
        }
    }
}

impl std::fmt::Display for GatewayEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PaymentProcessed(_) => write!(f, "PAYMENT_PROCESSED"),
            Self::SupportedTokenAdded { .. } => write!(f, "SUPPORTED_TOKEN_ADDED"),
            Self::SupportedTokenRemoved { .. } => write!(f, "SUPPORTED_TOKEN_REMOVED"),
            Self::AdminTransferred { .. } => write!(f, "ADMIN_TRANSFERRED"),
        }
    }
}
