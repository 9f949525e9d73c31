//! # paygate-venues
//!
//! **Swap venue adapters for Paygate.**
//!
//! A venue turns a registered fallback asset into the settlement asset. The
//! settlement engine talks to exactly one venue through the [`SwapVenue`]
//! trait and never looks at how it prices:
//!
//! - **ConstantRate**: one fixed rate, liquidity held by the router
//! - **ConcentratedLiquidity**: constant-product pools per `(asset, fee tier)`
//! - **StableVolatile**: pegged stable pools and constant-product volatile pools
//! - **UniversalRouter**: command-encoded swaps over fee-tiered pools
//!
//! Pools are plain ledger accounts; their balances are their reserves.

pub mod concentrated;
pub mod constant_rate;
pub mod curve;
pub mod factory;
pub mod stable_volatile;
pub mod universal_router;
pub mod venue;

pub use concentrated::{ConcentratedLiquidityVenue, FeeTierPools};
pub use constant_rate::ConstantRateVenue;
pub use curve::{Curve, Reserves};
pub use factory::build_venue;
pub use stable_volatile::StableVolatileVenue;
pub use universal_router::{SwapPath, UniversalRouterVenue, V3_SWAP_EXACT_IN, V3SwapExactIn};
pub use venue::{SwapRequest, SwapVenue};
