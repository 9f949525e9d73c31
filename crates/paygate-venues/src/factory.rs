//! Build a venue from configuration.

use paygate_types::{AssetId, VenueConfig};

use crate::{
    ConcentratedLiquidityVenue, ConstantRateVenue, FeeTierPools, StableVolatileVenue, SwapVenue,
    UniversalRouterVenue,
};

/// Instantiate the venue described by `config`, producing `settlement_asset`.
#[must_use]
pub fn build_venue(config: &VenueConfig, settlement_asset: AssetId) -> Box<dyn SwapVenue> {
    let venue: Box<dyn SwapVenue> = match config {
        VenueConfig::ConstantRate { router, rate } => {
            Box::new(ConstantRateVenue::new(*router, settlement_asset, *rate))
        }
        VenueConfig::ConcentratedLiquidity { router, pools } => Box::new(
            ConcentratedLiquidityVenue::new(*router, settlement_asset, FeeTierPools::from_configs(pools)),
        ),
        VenueConfig::StableVolatile { router, pools } => Box::new(
            StableVolatileVenue::from_configs(*router, settlement_asset, pools),
        ),
        VenueConfig::UniversalRouter { router, pools } => Box::new(UniversalRouterVenue::new(
            *router,
            settlement_asset,
            FeeTierPools::from_configs(pools),
        )),
    };
    tracing::info!(
        dialect = %venue.dialect(),
        router = %venue.address(),
        settlement_asset = %settlement_asset,
        "Swap venue configured"
    );
    venue
}
