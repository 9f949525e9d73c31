//! # paygate-ledger
//!
//! The fungible-asset side of the gateway: balances, allowances and the
//! `transfer_from` primitive the settlement engine and the swap venues pull
//! funds through.
//!
//! ## Architecture
//!
//! 1. **TokenLedger**: per-(asset, owner) balances and per-(asset, owner,
//!    spender) allowances with standard token failure modes
//! 2. **SupplyConservation**: issuance totals, checked before a settlement
//!    commits
//!
//! ```text
//! sender ──approve──▶ gateway ──transfer_from──▶ gateway / recipient
//!                       └──approve──▶ venue ──transfer_from──▶ pool
//! ```

pub mod ledger;
pub mod supply;

pub use ledger::{SharedLedger, TokenLedger};
pub use supply::SupplyConservation;
