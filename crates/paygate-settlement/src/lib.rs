//! # paygate-settlement
//!
//! **Settlement engine**: pays a recipient in the settlement asset from
//! whatever the sender holds, rolling back everything on any failure.
//!
//! ## Architecture
//!
//! [`SettlementGateway`] owns:
//! 1. An [`AssetRegistry`] of fallback assets in priority order
//! 2. An [`AuthorizationGuard`] gating registry and admin changes
//! 3. A [`ReentrancyGuard`] held for the whole of every mutation
//! 4. One swap venue, fixed at construction
//!
//! ## Payment paths
//!
//! - **Asset**: settlement asset moves directly; a registered fallback is
//!   swapped in full
//! - **Fallback**: settlement balance first, then registered assets in
//!   order until the shortfall is closed

pub mod auth;
pub mod gateway;
pub mod guard;
pub mod registry;

pub use auth::AuthorizationGuard;
pub use gateway::SettlementGateway;
pub use guard::ReentrancyGuard;
pub use registry::AssetRegistry;
