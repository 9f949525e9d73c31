//! System-wide constants for the Paygate settlement gateway.

/// Fractional digits carried by every amount.
pub const AMOUNT_DECIMALS: u32 = 8;

/// Basis points in one whole (100%).
pub const BPS_DENOMINATOR: u32 = 10_000;

/// Fee tiers must be strictly below this many basis points.
pub const MAX_FEE_BPS: u32 = BPS_DENOMINATOR;

/// Fee charged by volatile (constant-product) pools, in basis points.
pub const VOLATILE_FEE_BPS: u32 = 30;

/// Fee charged by stable (pegged) pools, in basis points.
pub const STABLE_FEE_BPS: u32 = 5;

/// Maximum number of fallback assets a registry will hold.
///
/// Bounds the work a single fallback settlement can do.
pub const MAX_SUPPORTED_TOKENS: usize = 32;

/// Version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Engine name.
pub const ENGINE_NAME: &str = "Paygate";
