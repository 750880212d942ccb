//! One simulation run, end to end.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use gk_behavior::{DecisionModel, DemandModel};
use gk_output::{OutputError, OutputFormat, SnapshotObserver, open_writer};
use gk_setup::SimulationSetup;
use gk_sim::{Sim, SimBuilder};

use crate::GhostKitchenResult;

/// Everything `run_simulation` needs besides the setup.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub duration:         u64,
    pub output_location:  PathBuf,
    /// `nodes.csv` / `edges.csv` for road distances; great-circle without.
    pub routing_location: Option<PathBuf>,
    pub format:           OutputFormat,
    /// Overrides `simulation.json`'s seed.
    pub seed:             Option<u64>,
    pub dry_run:          bool,
}

impl RunOptions {
    pub fn new(duration: u64, output_location: impl Into<PathBuf>) -> Self {
        Self {
            duration,
            output_location: output_location.into(),
            routing_location: None,
            format: OutputFormat::default(),
            seed: None,
            dry_run: false,
        }
    }
}

/// What a run did, or for a dry run, what it would do.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    pub dry_run:             bool,
    pub seed:                u64,
    pub ticks_requested:     u64,
    pub ticks_executed:      u64,
    pub sites:               usize,
    pub kitchens:            usize,
    pub stations:            usize,
    pub brands:              usize,
    pub menu_items:          usize,
    pub router:              &'static str,
    pub format:              &'static str,
    /// `None` for a dry run.
    pub output_location:     Option<PathBuf>,
    pub snapshots:           u64,
    pub events:              usize,
    pub orders_placed:       u64,
    pub orders_delivered:    u64,
    pub orders_cancelled:    u64,
    pub orders_closed:       u64,
    pub active_orders:       usize,
    pub mean_rating:         Option<f64>,
    pub mean_queue_wait:     Option<f64>,
    pub mean_delivery_ticks: Option<f64>,
}

impl RunReport {
    fn new<D: DecisionModel>(sim: &Sim<D>, options: &RunOptions, snapshots: u64) -> Self {
        let world = sim.world();
        let setup = world.setup();
        let m = world.metrics();
        Self {
            dry_run: options.dry_run,
            seed: sim.config().seed,
            ticks_requested: options.duration,
            ticks_executed: sim.now().0,
            sites: setup.sites.len(),
            kitchens: setup.kitchens.len(),
            stations: setup.stations.len(),
            brands: setup.brands.len(),
            menu_items: setup.menu_items.len(),
            router: sim.spatial().router_name(),
            format: options.format.as_str(),
            output_location: (!options.dry_run).then(|| options.output_location.clone()),
            snapshots,
            events: world.events().len(),
            orders_placed: m.orders_placed,
            orders_delivered: m.orders_delivered,
            orders_cancelled: m.orders_cancelled,
            orders_closed: m.orders_closed,
            active_orders: world.active_order_count(),
            mean_rating: m.mean_rating(),
            mean_queue_wait: m.mean_queue_wait(),
            mean_delivery_ticks: m.mean_delivery_ticks(),
        }
    }
}

/// Run `setup` for `duration` ticks with the default demand model, writing
/// Parquet snapshots to `output_location`.
///
/// With `dry_run` the setup, parameters and routing resources are checked
/// and the engine is built, but no tick runs and nothing is written.
pub fn run_simulation(
    setup:            Arc<SimulationSetup>,
    duration:         u64,
    output_location:  &Path,
    routing_location: Option<&Path>,
    dry_run:          bool,
) -> GhostKitchenResult<RunReport> {
    let options = RunOptions {
        routing_location: routing_location.map(Path::to_path_buf),
        dry_run,
        ..RunOptions::new(duration, output_location)
    };
    run_with(setup, &options)
}

/// [`run_simulation`] with every knob exposed.
pub fn run_with(setup: Arc<SimulationSetup>, options: &RunOptions) -> GhostKitchenResult<RunReport> {
    let model = DemandModel::new(&setup)?;
    run_with_model(setup, model, options)
}

/// Run with a caller-supplied decision model.
pub fn run_with_model<D: DecisionModel>(
    setup:   Arc<SimulationSetup>,
    model:   D,
    options: &RunOptions,
) -> GhostKitchenResult<RunReport> {
    if !options.format.is_available() {
        return Err(OutputError::UnsupportedFormat(options.format.to_string()).into());
    }

    let mut builder = SimBuilder::new(setup, model).duration(options.duration);
    if let Some(seed) = options.seed {
        builder = builder.seed(seed);
    }
    if let Some(dir) = &options.routing_location {
        if dir.is_dir() {
            builder = builder.routing_location(dir);
        } else {
            warn!(path = %dir.display(), "routing location missing, using great-circle distances");
        }
    }
    let mut sim = builder.build()?;

    if options.dry_run {
        let report = RunReport::new(&sim, options, 0);
        info!(
            ticks = report.ticks_requested,
            kitchens = report.kitchens,
            stations = report.stations,
            router = report.router,
            "dry run: setup valid"
        );
        return Ok(report);
    }

    let writer = open_writer(options.format, &options.output_location)?;
    let mut observer = SnapshotObserver::new(writer, sim.config());
    sim.run(&mut observer)?;
    if let Some(e) = observer.take_error() {
        return Err(e.into());
    }

    let report = RunReport::new(&sim, options, observer.snapshots());
    info!(
        output = %options.output_location.display(),
        snapshots = report.snapshots,
        placed = report.orders_placed,
        delivered = report.orders_delivered,
        "run complete"
    );
    Ok(report)
}
