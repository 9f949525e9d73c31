//! # paygate-types
//!
//! Shared types, errors, and configuration for the **Paygate** settlement
//! gateway.
//!
//! This crate is the leaf dependency of the workspace. Every other crate
//! depends on it. It defines:
//!
//! - **Identifiers**: [`Address`] (aliased as [`AssetId`] / [`AccountId`]), [`SettlementId`]
//! - **Amounts**: [`Amount`] and the rounding helpers
//! - **Swap model**: [`SwapParams`], [`VenueDialect`], [`FallbackAssetEntry`], [`SwapLeg`]
//! - **Settlement model**: [`SettlementRequest`], [`SettlementOutcome`], [`SettlementRecord`], [`GatewayEvent`]
//! - **Configuration**: [`GatewayConfig`], [`VenueConfig`]
//! - **Errors**: [`PaygateError`] with `PG_ERR_` prefix codes
//! - **Constants**: system-wide limits and defaults

pub mod amount;
pub mod config;
pub mod constants;
pub mod error;
pub mod ids;
pub mod settlement;
pub mod swap;

// Re-export all primary types at crate root for ergonomic imports:
//   use paygate_types::{Address, SwapParams, SettlementRecord, ...};

pub use amount::*;
pub use config::*;
pub use error::*;
pub use ids::*;
pub use settlement::*;
pub use swap::*;

// Constants are accessed via `paygate_types::constants::FOO`
// (not re-exported to avoid name collisions).
