//! `gk-output`: periodic snapshots of World State.
//!
//! Two backends implement [`SnapshotWriter`]:
//!
//! | Feature              | Backend | Files created in the output directory        |
//! |----------------------|---------|----------------------------------------------|
//! | *(always)*           | CSV     | `orders.csv`, `stations.csv`, `agents.csv`,  |
//! |                      |         | `events.csv`, `tick_summaries.csv`           |
//! | `parquet` (default)  | Parquet | the same five tables as `.parquet`, Snappy   |
//!
//! [`SnapshotObserver`] implements `gk_sim::SimObserver` and drives either
//! backend.
//!
//! # Usage
//!
//! ```rust,ignore
//! use gk_output::{OutputFormat, SnapshotObserver, open_writer};
//!
//! let writer = open_writer(OutputFormat::Parquet, Path::new("./out"))?;
//! let mut obs = SnapshotObserver::new(writer, sim.config());
//! sim.run(&mut obs)?;
//! if let Some(e) = obs.take_error() { return Err(e.into()); }
//! ```

pub mod csv;
pub mod error;
pub mod observer;
pub mod row;
pub mod writer;

#[cfg(feature = "parquet")]
pub mod parquet;

#[cfg(test)]
mod tests;

pub use csv::CsvWriter;
pub use error::{OutputError, OutputResult};
pub use observer::SnapshotObserver;
pub use row::{AgentRow, EventRow, OrderRow, StationRow, TickSummaryRow};
pub use writer::{OutputFormat, SnapshotWriter, open_writer};

#[cfg(feature = "parquet")]
pub use parquet::ParquetWriter;
