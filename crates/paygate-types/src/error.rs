//! Error types for the Paygate settlement gateway.
//!
//! All errors use the `PG_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by subsystem:
//! - 1xx: Request errors
//! - 2xx: Ledger errors (bubbled unchanged from the asset primitives)
//! - 3xx: Registry errors
//! - 4xx: Settlement errors
//! - 5xx: Swap venue errors
//! - 8xx: Authorization errors
//! - 9xx: General / internal errors

use rust_decimal::Decimal;
use thiserror::Error;

use crate::{AccountId, AssetId};

/// Central error enum for all Paygate operations.
#[derive(Debug, Error)]
pub enum PaygateError {
    // =================================================================
    // Request Errors (1xx)
    // =================================================================
    /// The requested amount was zero.
    #[error("PG_ERR_100: Transfer amount must be greater than zero")]
    ZeroAmount,

    /// The requested amount is negative or finer than the amount precision.
    #[error("PG_ERR_101: Invalid amount: {reason}")]
    InvalidAmount { reason: String },

    // =================================================================
    // Ledger Errors (2xx)
    // =================================================================
    /// The owner does not hold enough of the asset.
    #[error(
        "PG_ERR_200: Insufficient balance of {asset} for {owner}: need {needed}, have {available}"
    )]
    InsufficientBalance {
        asset: AssetId,
        owner: AccountId,
        needed: Decimal,
        available: Decimal,
    },

    /// The spender has not been approved for enough of the asset.
    #[error(
        "PG_ERR_201: Insufficient allowance of {asset} for spender {spender}: need {needed}, have {allowance}"
    )]
    InsufficientAllowance {
        asset: AssetId,
        spender: AccountId,
        needed: Decimal,
        allowance: Decimal,
    },

    /// Supply conservation invariant violated. This is a critical safety alert.
    #[error("PG_ERR_202: Supply invariant violation: {reason}")]
    SupplyInvariantViolation { reason: String },

    // =================================================================
    // Registry Errors (3xx)
    // =================================================================
    /// The asset is already registered as a fallback asset.
    #[error("PG_ERR_300: Token already supported: {0}")]
    AlreadySupported(AssetId),

    /// Registry removal of an asset that is not registered.
    #[error("PG_ERR_301: Token not supported: {0}")]
    NotSupported(AssetId),

    /// Transfer in an asset that is neither the settlement asset nor registered.
    #[error("PG_ERR_302: Token not supported: {0}")]
    UnsupportedAsset(AssetId),

    /// The settlement asset can never be a fallback asset.
    #[error("PG_ERR_303: Settlement asset cannot be registered as a fallback: {0}")]
    SettlementAssetNotAllowed(AssetId),

    /// Swap params don't fit the venue dialect or carry a bad value.
    #[error("PG_ERR_304: Invalid swap params: {reason}")]
    InvalidSwapParams { reason: String },

    /// The registry holds `MAX_SUPPORTED_TOKENS` entries already.
    #[error("PG_ERR_305: Supported token registry full ({max} entries)")]
    RegistryFull { max: usize },

    // =================================================================
    // Settlement Errors (4xx)
    // =================================================================
    /// Direct balance plus every fallback asset cannot cover the amount.
    #[error(
        "PG_ERR_400: Insufficient balance in fallback assets or approval not set: \
         requested {requested}, shortfall {shortfall}"
    )]
    InsufficientFunds { requested: Decimal, shortfall: Decimal },

    /// A gateway call was made while a settlement was in flight.
    #[error("PG_ERR_401: Reentrant call rejected")]
    Reentrancy,

    // =================================================================
    // Swap Venue Errors (5xx)
    // =================================================================
    /// The venue call failed or returned unusable output.
    #[error("PG_ERR_500: Swap failed: {reason}")]
    SwapFailed { reason: String },

    // =================================================================
    // Authorization Errors (8xx)
    // =================================================================
    /// A gated call came from someone other than the administrator.
    #[error("PG_ERR_800: Unauthorized account: {caller}")]
    Unauthorized { caller: AccountId },

    /// The proposed administrator is not a valid account.
    #[error("PG_ERR_801: Invalid administrator: {0}")]
    InvalidAdmin(AccountId),

    // =================================================================
    // General / Internal (9xx)
    // =================================================================
    /// Unrecoverable internal error.
    #[error("PG_ERR_900: Internal error: {0}")]
    Internal(String),

    /// Serialization / deserialization error.
    #[error("PG_ERR_901: Serialization error: {0}")]
    Serialization(String),

    /// Configuration error (invalid config, missing fields, etc.).
    #[error("PG_ERR_902: Configuration error: {0}")]
    Configuration(String),

    /// Decimal arithmetic overflowed.
    #[error("PG_ERR_903: Arithmetic overflow: {0}")]
    ArithmeticOverflow(String),
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, PaygateError>;

impl From<serde_json::Error> for PaygateError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_amount_message() {
        let msg = PaygateError::ZeroAmount.to_string();
        assert!(msg.starts_with("PG_ERR_100"), "Got: {msg}");
        assert!(msg.contains("Transfer amount must be greater than zero"));
    }

    #[test]
    fn registry_messages() {
        let asset = AssetId::from_low_u64(5);
        assert!(
            PaygateError::AlreadySupported(asset)
                .to_string()
                .contains("Token already supported")
        );
        assert!(
            PaygateError::NotSupported(asset)
                .to_string()
                .contains("Token not supported")
        );
        assert!(
            PaygateError::UnsupportedAsset(asset)
                .to_string()
                .contains("Token not supported")
        );
    }

    #[test]
    fn insufficient_allowance_display() {
        let err = PaygateError::InsufficientAllowance {
            asset: AssetId::from_low_u64(1),
            spender: AccountId::from_low_u64(2),
            needed: Decimal::new(100, 0),
            allowance: Decimal::new(50, 0),
        };
        let msg = err.to_string();
        assert!(msg.contains("PG_ERR_201"));
        assert!(msg.contains("100"));
        assert!(msg.contains("50"));
    }

    #[test]
    fn all_errors_have_pg_err_prefix() {
        let errors: Vec<Box<dyn std::error::Error>> = vec![
            Box::new(PaygateError::Reentrancy),
            Box::new(PaygateError::RegistryFull { max: 32 }),
            Box::new(PaygateError::InsufficientFunds {
                requested: Decimal::ONE,
                shortfall: Decimal::ONE,
            }),
            Box::new(PaygateError::Unauthorized {
                caller: AccountId::ZERO,
            }),
            Box::new(PaygateError::Internal("test".into())),
        ];
        for err in errors {
            let msg = format!("{err}");
            assert!(
                msg.starts_with("PG_ERR_"),
                "Error missing PG_ERR_ prefix: {msg}"
            );
        }
    }

    #[test]
    fn serde_errors_convert() {
        let err: PaygateError = serde_json::from_str::<u32>("nope").unwrap_err().into();
        assert!(matches!(err, PaygateError::Serialization(_)));
    }
}
