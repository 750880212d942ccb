//! CSV backend.  Missing values are written as empty fields.

use std::fs::File;
use std::path::Path;

use csv::Writer;

use crate::writer::SnapshotWriter;
use crate::{AgentRow, EventRow, OrderRow, OutputError, OutputResult, StationRow, TickSummaryRow};

pub const ORDER_COLUMNS: [&str; 21] = [
    "snapshot_tick", "order_id", "customer_id", "brand", "item", "kitchen", "state",
    "cancel_reason", "step", "steps_total", "created", "ready_at", "dispatched_at",
    "delivered_at", "closed_at", "driver_id", "eta_ticks", "distance_m", "rating", "lat", "lon",
];

pub const STATION_COLUMNS: [&str; 8] = [
    "snapshot_tick", "station", "kitchen", "station_type", "capacity", "occupied", "state",
    "occupants",
];

pub const AGENT_COLUMNS: [&str; 7] =
    ["snapshot_tick", "agent_id", "role", "status", "lat", "lon", "order_id"];

pub const EVENT_COLUMNS: [&str; 5] = ["tick", "subject_kind", "subject_id", "kind", "payload"];

pub const SUMMARY_COLUMNS: [&str; 18] = [
    "tick", "unix_time_secs", "arrivals", "orders_placed", "cancelled", "steps_started",
    "steps_completed", "dispatched", "delivered", "closed", "warnings", "events",
    "active_orders", "queued_requests", "running_steps", "busy_slots", "total_slots",
    "utilization",
];

fn opt<T: ToString>(v: Option<T>) -> String {
    v.map(|x| x.to_string()).unwrap_or_default()
}

struct Tables {
    orders:    Writer<File>,
    stations:  Writer<File>,
    agents:    Writer<File>,
    events:    Writer<File>,
    summaries: Writer<File>,
}

/// Writes the five tables as CSV files in one directory.
pub struct CsvWriter {
    tables: Option<Tables>,
}

fn open(dir: &Path, name: &str, header: &[&str]) -> OutputResult<Writer<File>> {
    let mut w = Writer::from_path(dir.join(name))?;
    w.write_record(header)?;
    Ok(w)
}

impl CsvWriter {
    /// Create the files in `dir` and write their header rows.
    pub fn new(dir: &Path) -> OutputResult<Self> {
        Ok(Self {
            tables: Some(Tables {
                orders:    open(dir, "orders.csv", &ORDER_COLUMNS)?,
                stations:  open(dir, "stations.csv", &STATION_COLUMNS)?,
                agents:    open(dir, "agents.csv", &AGENT_COLUMNS)?,
                events:    open(dir, "events.csv", &EVENT_COLUMNS)?,
                summaries: open(dir, "tick_summaries.csv", &SUMMARY_COLUMNS)?,
            }),
        })
    }

    fn tables(&mut self) -> OutputResult<&mut Tables> {
        self.tables.as_mut().ok_or(OutputError::Finished)
    }
}

impl SnapshotWriter for CsvWriter {
    fn write_orders(&mut self, rows: &[OrderRow]) -> OutputResult<()> {
        let w = &mut self.tables()?.orders;
        for r in rows {
            w.write_record(&[
                r.snapshot_tick.to_string(),
                r.order_id.to_string(),
                r.customer_id.to_string(),
                r.brand.clone(),
                r.item.clone(),
                r.kitchen.clone().unwrap_or_default(),
                r.state.to_owned(),
                opt(r.cancel_reason),
                r.step.to_string(),
                r.steps_total.to_string(),
                r.created.to_string(),
                opt(r.ready_at),
                opt(r.dispatched_at),
                opt(r.delivered_at),
                opt(r.closed_at),
                opt(r.driver_id),
                opt(r.eta_ticks),
                opt(r.distance_m),
                opt(r.rating),
                r.lat.to_string(),
                r.lon.to_string(),
            ])?;
        }
        Ok(())
    }

    fn write_stations(&mut self, rows: &[StationRow]) -> OutputResult<()> {
        let w = &mut self.tables()?.stations;
        for r in rows {
            w.write_record(&[
                r.snapshot_tick.to_string(),
                r.station.clone(),
                r.kitchen.clone(),
                r.station_type.clone(),
                r.capacity.to_string(),
                r.occupied.to_string(),
                r.state.to_owned(),
                r.occupants.clone(),
            ])?;
        }
        Ok(())
    }

    fn write_agents(&mut self, rows: &[AgentRow]) -> OutputResult<()> {
        let w = &mut self.tables()?.agents;
        for r in rows {
            w.write_record(&[
                r.snapshot_tick.to_string(),
                r.agent_id.to_string(),
                r.role.to_owned(),
                r.status.to_owned(),
                r.lat.to_string(),
                r.lon.to_string(),
                opt(r.order_id),
            ])?;
        }
        Ok(())
    }

    fn write_events(&mut self, rows: &[EventRow]) -> OutputResult<()> {
        let w = &mut self.tables()?.events;
        for r in rows {
            w.write_record(&[
                r.tick.to_string(),
                r.subject_kind.to_owned(),
                r.subject_id.to_string(),
                r.kind.to_owned(),
                r.payload.clone(),
            ])?;
        }
        Ok(())
    }

    fn write_tick_summary(&mut self, r: &TickSummaryRow) -> OutputResult<()> {
        self.tables()?.summaries.write_record(&[
            r.tick.to_string(),
            r.unix_time_secs.to_string(),
            r.arrivals.to_string(),
            r.orders_placed.to_string(),
            r.cancelled.to_string(),
            r.steps_started.to_string(),
            r.steps_completed.to_string(),
            r.dispatched.to_string(),
            r.delivered.to_string(),
            r.closed.to_string(),
            r.warnings.to_string(),
            r.events.to_string(),
            r.active_orders.to_string(),
            r.queued_requests.to_string(),
            r.running_steps.to_string(),
            r.busy_slots.to_string(),
            r.total_slots.to_string(),
            r.utilization.to_string(),
        ])?;
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        let Some(mut t) = self.tables.take() else {
            return Ok(());
        };
        t.orders.flush()?;
        t.stations.flush()?;
        t.agents.flush()?;
        t.events.flush()?;
        t.summaries.flush()?;
        Ok(())
    }
}
