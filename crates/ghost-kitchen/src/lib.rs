//! `ghost-kitchen`: a discrete-time digital twin of a network of delivery-only
//! kitchens.
//!
//! This crate is the outer surface over the engine crates:
//!
//! | Function                  | Purpose                                        |
//! |---------------------------|------------------------------------------------|
//! | [`load_simulation_setup`] | read and validate a setup directory            |
//! | [`run_simulation`]        | run (or dry-run) a setup and write snapshots   |
//! | [`run_with`]              | the same with seed / format / routing options  |
//! | [`validate_setup`]        | load, then build the engine without running it |
//! | [`init_setup`]            | write a template setup directory               |
//!
//! Every configuration error surfaces from `load_simulation_setup` before a
//! single tick executes.

pub mod error;
pub mod init;
pub mod run;


use std::path::Path;
use std::sync::Arc;

pub use error::{GhostKitchenError, GhostKitchenResult};
pub use init::init_setup;
pub use run::{RunOptions, RunReport, run_simulation, run_with, run_with_model};

pub use gk_output::OutputFormat;
pub use gk_setup::{BrandTemplate, LoadOptions, SimulationSetup, SiteTemplate};

/// Load and validate the setup in `directory`.
pub fn load_simulation_setup(directory: &Path, options: &LoadOptions) -> GhostKitchenResult<SimulationSetup> {
    Ok(gk_setup::load_setup_dir(directory, options)?)
}

/// Load the setup in `directory` and dry-run it: the demand model, spatial
/// index and routing resources are all built, but no tick runs.
pub fn validate_setup(directory: &Path, routing_location: Option<&Path>) -> GhostKitchenResult<RunReport> {
    let setup = load_simulation_setup(directory, &LoadOptions::new())?;
    run_simulation(Arc::new(setup), 0, directory, routing_location, true)
}
