//! `SnapshotObserver<W>`: bridges `SimObserver` to a `SnapshotWriter`.

use tracing::{debug, error};

use gk_core::{SimConfig, Tick};
use gk_sim::{SimObserver, TickSummary};
use gk_world::World;

use crate::row::{AgentRow, EventRow, OrderRow, StationRow, TickSummaryRow};
use crate::writer::SnapshotWriter;
use crate::{OutputError, OutputResult};

/// A [`SimObserver`] that writes World State snapshots to any
/// [`SnapshotWriter`].
///
/// Each snapshot writes every active order and live agent, the orders and
/// customers retired since the previous snapshot, and every station.  Events are written
/// incrementally: each snapshot writes only those appended since the last
/// one.  A summary row is written every tick.
///
/// `SimObserver` methods cannot fail, so the first write error is stored
/// and later writes are skipped.  Check [`take_error`][Self::take_error]
/// after `sim.run()` returns.
pub struct SnapshotObserver<W: SnapshotWriter> {
    writer:             W,
    start_unix_secs:    i64,
    tick_duration_secs: u32,
    events_written:     usize,
    last_snapshot:      Option<Tick>,
    snapshots:          u64,
    first_error:        Option<OutputError>,
}

impl<W: SnapshotWriter> SnapshotObserver<W> {
    pub fn new(writer: W, config: &SimConfig) -> Self {
        Self {
            writer,
            start_unix_secs: config.start_unix_secs,
            tick_duration_secs: config.tick_duration_secs,
            events_written: 0,
            last_snapshot: None,
            snapshots: 0,
            first_error: None,
        }
    }

    pub fn take_error(&mut self) -> Option<OutputError> {
        self.first_error.take()
    }

    /// Snapshots written so far.
    pub fn snapshots(&self) -> u64 {
        self.snapshots
    }

    pub fn into_writer(self) -> W {
        self.writer
    }

    fn unix_time(&self, tick: Tick) -> i64 {
        self.start_unix_secs + tick.0 as i64 * self.tick_duration_secs as i64
    }

    fn record(&mut self, result: OutputResult<()>) {
        if let Err(e) = result {
            if self.first_error.is_none() {
                error!(error = %e, "snapshot write failed; further output skipped");
                self.first_error = Some(e);
            }
        }
    }

    fn write_snapshot(&mut self, tick: Tick, world: &World) -> OutputResult<()> {
        let setup = world.setup();
        let since = self.last_snapshot;

        let mut orders: Vec<OrderRow> = world
            .active_orders()
            .chain(world.archived_since(since))
            .map(|o| OrderRow::new(tick, o, setup))
            .collect();
        orders.sort_by_key(|r| r.order_id);
        self.writer.write_orders(&orders)?;

        let stations: Vec<StationRow> = world
            .board()
            .station_views()
            .map(|v| StationRow::new(tick, &v, setup))
            .collect();
        self.writer.write_stations(&stations)?;

        let roster = world.agents();
        let mut agents: Vec<AgentRow> = roster
            .iter()
            .chain(roster.retired_since(since))
            .map(|a| AgentRow::new(tick, a))
            .collect();
        agents.sort_by_key(|r| r.agent_id);
        self.writer.write_agents(&agents)?;

        self.write_new_events(world)?;
        self.last_snapshot = Some(tick);
        self.snapshots += 1;
        debug!(tick = %tick, orders = orders.len(), agents = agents.len(), "snapshot written");
        Ok(())
    }

    fn write_new_events(&mut self, world: &World) -> OutputResult<()> {
        let fresh: Vec<EventRow> = world.events().since(self.events_written).iter().map(EventRow::from).collect();
        self.writer.write_events(&fresh)?;
        self.events_written += fresh.len();
        Ok(())
    }
}

impl<W: SnapshotWriter> SimObserver for SnapshotObserver<W> {
    fn on_tick_end(&mut self, tick: Tick, summary: &TickSummary) {
        if self.first_error.is_some() {
            return;
        }
        let row = TickSummaryRow::new(summary, self.unix_time(tick));
        let result = self.writer.write_tick_summary(&row);
        self.record(result);
    }

    fn on_snapshot(&mut self, tick: Tick, world: &World) {
        if self.first_error.is_some() {
            return;
        }
        let result = self.write_snapshot(tick, world);
        self.record(result);
    }

    fn on_sim_end(&mut self, _final_tick: Tick, world: &World) {
        if self.first_error.is_none() {
            let result = self.write_new_events(world);
            self.record(result);
        }
        let result = self.writer.finish();
        self.record(result);
    }
}
