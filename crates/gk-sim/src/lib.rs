//! `gk-sim`: the simulation clock and the order lifecycle machine.
//!
//! | Module        | Contents                                                 |
//! |---------------|----------------------------------------------------------|
//! | [`sim`]       | `Sim<D>`: tick loop, control API                         |
//! | [`lifecycle`] | one tick of order transitions, `Command`                 |
//! | [`builder`]   | `SimBuilder`, `sim_config`                               |
//! | [`observer`]  | `SimObserver`, `NoopObserver`, `SummaryCollector`        |
//! | [`summary`]   | `TickSummary`                                            |
//! | [`error`]     | `SimError`, `SimResult<T>`                               |
//!
//! # Cargo features
//!
//! | Feature    | Effect                                                      |
//! |------------|-------------------------------------------------------------|
//! | `parallel` | Station evaluation and ETA computation on Rayon's pool.     |
//!
//! # Quick-start
//!
//! ```rust,ignore
//! let setup = Arc::new(load_setup_dir(dir, &LoadOptions::new())?);
//! let model = DemandModel::new(&setup)?;
//! let mut sim = SimBuilder::new(setup, model).duration(1_440).build()?;
//! sim.run(&mut NoopObserver)?;
//! ```

pub mod builder;
pub mod error;
pub mod lifecycle;
pub mod observer;
pub mod sim;
pub mod summary;

#[cfg(test)]
mod tests;

pub use builder::{SimBuilder, sim_config};
pub use error::{SimError, SimResult};
pub use lifecycle::Command;
pub use observer::{NoopObserver, SimObserver, SummaryCollector};
pub use sim::Sim;
pub use summary::TickSummary;
