//! The `SnapshotWriter` trait and backend selection.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::{
    AgentRow, CsvWriter, EventRow, OrderRow, OutputError, OutputResult, StationRow, TickSummaryRow,
};

/// Implemented by the CSV and Parquet writers.
///
/// Calls after `finish` fail with [`OutputError::Finished`].
pub trait SnapshotWriter {
    fn write_orders(&mut self, rows: &[OrderRow]) -> OutputResult<()>;

    fn write_stations(&mut self, rows: &[StationRow]) -> OutputResult<()>;

    fn write_agents(&mut self, rows: &[AgentRow]) -> OutputResult<()>;

    fn write_events(&mut self, rows: &[EventRow]) -> OutputResult<()>;

    fn write_tick_summary(&mut self, row: &TickSummaryRow) -> OutputResult<()>;

    /// Flush and close every file.  Idempotent.
    fn finish(&mut self) -> OutputResult<()>;
}

impl<W: SnapshotWriter + ?Sized> SnapshotWriter for Box<W> {
    fn write_orders(&mut self, rows: &[OrderRow]) -> OutputResult<()> {
        (**self).write_orders(rows)
    }

    fn write_stations(&mut self, rows: &[StationRow]) -> OutputResult<()> {
        (**self).write_stations(rows)
    }

    fn write_agents(&mut self, rows: &[AgentRow]) -> OutputResult<()> {
        (**self).write_agents(rows)
    }

    fn write_events(&mut self, rows: &[EventRow]) -> OutputResult<()> {
        (**self).write_events(rows)
    }

    fn write_tick_summary(&mut self, row: &TickSummaryRow) -> OutputResult<()> {
        (**self).write_tick_summary(row)
    }

    fn finish(&mut self) -> OutputResult<()> {
        (**self).finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Parquet,
    Csv,
}

impl OutputFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            OutputFormat::Parquet => "parquet",
            OutputFormat::Csv => "csv",
        }
    }

    /// Whether this build can write the format.
    pub fn is_available(self) -> bool {
        match self {
            OutputFormat::Csv => true,
            OutputFormat::Parquet => cfg!(feature = "parquet"),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = OutputError;

    fn from_str(s: &str) -> OutputResult<Self> {
        match s.to_ascii_lowercase().as_str() {
            "parquet" => Ok(OutputFormat::Parquet),
            "csv" => Ok(OutputFormat::Csv),
            other => Err(OutputError::UnsupportedFormat(other.to_owned())),
        }
    }
}

/// Create `dir` if needed and open a writer of the requested format in it.
pub fn open_writer(format: OutputFormat, dir: &Path) -> OutputResult<Box<dyn SnapshotWriter>> {
    std::fs::create_dir_all(dir)?;
    match format {
        OutputFormat::Csv => Ok(Box::new(CsvWriter::new(dir)?)),
        #[cfg(feature = "parquet")]
        OutputFormat::Parquet => Ok(Box::new(crate::ParquetWriter::new(dir)?)),
        #[cfg(not(feature = "parquet"))]
        OutputFormat::Parquet => Err(OutputError::UnsupportedFormat("parquet".into())),
    }
}
