//! Delivery time estimation.

use rand_distr::Normal;
use tracing::debug;

use gk_core::{AgentRng, GeoPoint, OrderId};
use gk_setup::EngineParams;
use gk_spatial::SpatialIndex;

use crate::{RoutingError, RoutingResult};

/// The routing slice of `EngineParams`, with the traffic distribution built
/// once up front.
#[derive(Debug, Clone, Copy)]
pub struct EtaParams {
    pub base_ticks:     u64,
    pub ticks_per_km:   f64,
    pub weather_impact: f64,
    traffic:            Normal<f64>,
}

impl EtaParams {
    pub fn new(params: &EngineParams) -> RoutingResult<Self> {
        let variation = params.traffic_variation;
        if !(variation >= 0.0 && variation.is_finite()) {
            return Err(RoutingError::Parameter {
                name:   "traffic_variation",
                reason: format!("{variation} is not a finite non-negative std-dev"),
            });
        }
        let traffic = Normal::new(0.0, params.traffic_variation).map_err(|e| RoutingError::Parameter {
            name:   "traffic_variation",
            reason: e.to_string(),
        })?;
        Ok(Self {
            base_ticks: params.base_delivery_ticks,
            ticks_per_km: params.ticks_per_km.max(0.0),
            weather_impact: params.weather_impact.max(0.0),
            traffic,
        })
    }
}

/// Travel ticks attributable to distance alone: `ceil(km * ticks_per_km)`.
/// Non-decreasing in `distance_m`; zero for zero or negative input.
pub fn distance_factor(distance_m: f64, ticks_per_km: f64) -> u64 {
    if !(distance_m > 0.0) || !(ticks_per_km > 0.0) {
        return 0;
    }
    (distance_m / 1000.0 * ticks_per_km).ceil() as u64
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Estimate {
    pub distance_m: f64,
    /// At least 1.
    pub ticks:      u64,
}

/// ETA for a delivery from `kitchen` to `customer`:
///
/// ```text
/// max(1, round(base + distance_factor(d) + N(0, traffic_variation) + weather_impact * U[0,1)))
/// ```
///
/// Both noise terms are always drawn, so a stream's position depends only on
/// how many estimates it has produced.
pub fn estimate_delivery_time(
    kitchen:  GeoPoint,
    customer: GeoPoint,
    index:    &SpatialIndex,
    params:   &EtaParams,
    rng:      &mut AgentRng,
) -> RoutingResult<Estimate> {
    let distance_m = index.distance(kitchen, customer)?;
    if !distance_m.is_finite() {
        return Err(RoutingError::BadDistance(distance_m));
    }
    let traffic: f64 = rng.sample(params.traffic);
    let weather = params.weather_impact * rng.unit();

    let raw = params.base_ticks as f64
        + distance_factor(distance_m, params.ticks_per_km) as f64
        + traffic
        + weather;
    let ticks = if raw.is_finite() { raw.round().max(1.0) as u64 } else { 1 };
    Ok(Estimate { distance_m, ticks })
}

/// One dispatch waiting for its ETA.  Carries the order's own stream so jobs
/// can be computed in any order.
#[derive(Debug)]
pub struct EtaJob {
    pub order:    OrderId,
    pub kitchen:  GeoPoint,
    pub customer: GeoPoint,
    pub rng:      AgentRng,
}

/// Estimate a tick's dispatches.  Output order equals input order whether or
/// not the `parallel` feature is on; each job is handed back so its stream
/// can be returned to the registry.
pub fn estimate_batch(
    jobs:   Vec<EtaJob>,
    index:  &SpatialIndex,
    params: &EtaParams,
) -> Vec<(EtaJob, RoutingResult<Estimate>)> {
    if jobs.is_empty() {
        return Vec::new();
    }
    debug!(jobs = jobs.len(), "estimating deliveries");
    let run = |mut job: EtaJob| {
        let result = estimate_delivery_time(job.kitchen, job.customer, index, params, &mut job.rng);
        (job, result)
    };

    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;
        jobs.into_par_iter().map(run).collect()
    }
    #[cfg(not(feature = "parallel"))]
    {
        jobs.into_iter().map(run).collect()
    }
}
