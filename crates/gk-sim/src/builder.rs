//! Fluent builder for constructing a [`Sim`].

use std::path::PathBuf;
use std::sync::Arc;

use tracing::debug;

use gk_behavior::DecisionModel;
use gk_core::{RngRegistry, SimConfig};
use gk_delivery::{DeliveryTracker, EtaParams};
use gk_setup::{EngineParams, SimulationSetup};
use gk_spatial::SpatialIndex;
use gk_world::World;

use crate::{Sim, SimResult};

/// Clock settings taken from the setup's parameters.
pub fn sim_config(params: &EngineParams, duration_ticks: u64) -> SimConfig {
    SimConfig {
        start_unix_secs: params.start_unix_secs,
        tick_duration_secs: params.tick_duration_secs,
        duration_ticks,
        seed: params.seed,
        snapshot_interval_ticks: params.snapshot_interval_ticks,
        log_interval_ticks: params.log_interval_ticks,
    }
}

/// Fluent builder for [`Sim<D>`].
///
/// | Method                  | Default                                      |
/// |-------------------------|----------------------------------------------|
/// | `.config(c)`            | [`sim_config`] from the setup's parameters   |
/// | `.duration(n)`          | `SimConfig::default().duration_ticks`        |
/// | `.seed(s)`              | `params.seed`                                |
/// | `.spatial(index)`       | built from the setup                         |
/// | `.routing_location(p)`  | none: great-circle distances                 |
pub struct SimBuilder<D: DecisionModel> {
    setup:            Arc<SimulationSetup>,
    model:            D,
    config:           Option<SimConfig>,
    duration:         Option<u64>,
    seed:             Option<u64>,
    spatial:          Option<SpatialIndex>,
    routing_location: Option<PathBuf>,
}

impl<D: DecisionModel> SimBuilder<D> {
    pub fn new(setup: Arc<SimulationSetup>, model: D) -> Self {
        Self {
            setup,
            model,
            config: None,
            duration: None,
            seed: None,
            spatial: None,
            routing_location: None,
        }
    }

    pub fn config(mut self, config: SimConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Ticks [`Sim::run`] executes.  Overrides the config's value.
    pub fn duration(mut self, ticks: u64) -> Self {
        self.duration = Some(ticks);
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Use a prebuilt spatial index instead of building one.
    pub fn spatial(mut self, index: SpatialIndex) -> Self {
        self.spatial = Some(index);
        self
    }

    /// Directory holding `nodes.csv` / `edges.csv` for road distances.
    pub fn routing_location(mut self, dir: impl Into<PathBuf>) -> Self {
        self.routing_location = Some(dir.into());
        self
    }

    /// Validate the clock settings, build the spatial index and the empty
    /// world, and return a ready-to-run [`Sim`].
    pub fn build(self) -> SimResult<Sim<D>> {
        let mut config = self
            .config
            .unwrap_or_else(|| sim_config(&self.setup.params, SimConfig::default().duration_ticks));
        if let Some(d) = self.duration {
            config.duration_ticks = d;
        }
        if let Some(s) = self.seed {
            config.seed = s;
        }
        config.validate()?;

        let spatial = match self.spatial {
            Some(index) => index,
            None => SpatialIndex::build(&self.setup, self.routing_location.as_deref())?,
        };
        let eta = EtaParams::new(&self.setup.params)?;
        debug!(
            ticks = config.duration_ticks,
            seed = config.seed,
            router = spatial.router_name(),
            "simulation built"
        );

        Ok(Sim {
            clock: config.make_clock(),
            rngs: RngRegistry::new(config.seed),
            config,
            world: World::new(self.setup),
            spatial,
            eta,
            deliveries: DeliveryTracker::new(),
            model: self.model,
            pending: Vec::new(),
        })
    }
}
