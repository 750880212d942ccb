use std::path::Path;

use tracing::info;

use gk_core::{GeoPoint, KitchenId};
use gk_setup::SimulationSetup;

use crate::{
    GreatCircleRouter, HexIndex, Neighbor, RoadRouter, Route, Router, SpatialResult,
    load_road_network,
};

/// The engine's single spatial handle: nearest-kitchen lookup through the
/// hex index, distances through the router.
pub struct SpatialIndex {
    hex:    HexIndex,
    router: Box<dyn Router>,
}

impl SpatialIndex {
    /// Index the setup's kitchens.  If `routing_location` holds a road graph
    /// it backs `distance`; otherwise distances are great-circle.
    pub fn build(setup: &SimulationSetup, routing_location: Option<&Path>) -> SpatialResult<Self> {
        let hex = HexIndex::build(setup, setup.params.hex_resolution, setup.params.max_ring)?;
        let router: Box<dyn Router> = match routing_location.map(load_road_network).transpose()? {
            Some(Some(network)) if !network.is_empty() => Box::new(RoadRouter::new(network)),
            _ => Box::new(GreatCircleRouter),
        };
        info!(
            resolution = hex.resolution(),
            cells = hex.cell_count(),
            router = router.name(),
            "spatial index built"
        );
        Ok(Self { hex, router })
    }

    pub fn with_router(hex: HexIndex, router: Box<dyn Router>) -> Self {
        Self { hex, router }
    }

    pub fn hex(&self) -> &HexIndex {
        &self.hex
    }

    pub fn router_name(&self) -> &'static str {
        self.router.name()
    }

    pub fn nearest_kitchens(&self, p: GeoPoint, k: usize) -> SpatialResult<Vec<Neighbor>> {
        self.hex.nearest_kitchens(p, k)
    }

    pub fn nearest_kitchens_where<F>(&self, p: GeoPoint, k: usize, eligible: F) -> SpatialResult<Vec<Neighbor>>
    where
        F: Fn(KitchenId) -> bool,
    {
        self.hex.nearest_kitchens_where(p, k, eligible)
    }

    /// Travel distance in metres.
    pub fn distance(&self, a: GeoPoint, b: GeoPoint) -> SpatialResult<f64> {
        self.router.route(a, b).map(|r| r.distance_m)
    }

    pub fn route(&self, a: GeoPoint, b: GeoPoint) -> SpatialResult<Route> {
        self.router.route(a, b)
    }
}
