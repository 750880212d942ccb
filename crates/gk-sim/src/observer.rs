//! Observer hooks for progress reporting and output.

use gk_core::Tick;
use gk_world::World;

use crate::TickSummary;

/// Callbacks invoked by [`Sim::run`][crate::Sim::run] at tick boundaries.
///
/// Every method defaults to a no-op.  Observers only ever see committed
/// state: `on_snapshot` runs after the tick's commit, never in the middle of
/// one.
pub trait SimObserver {
    fn on_tick_start(&mut self, _tick: Tick) {}

    fn on_tick_end(&mut self, _tick: Tick, _summary: &TickSummary) {}

    /// Called every `snapshot_interval_ticks` ticks and on the last tick.
    fn on_snapshot(&mut self, _tick: Tick, _world: &World) {}

    /// Called once after the final tick of [`Sim::run`][crate::Sim::run].
    fn on_sim_end(&mut self, _final_tick: Tick, _world: &World) {}
}

/// Does nothing.
pub struct NoopObserver;

impl SimObserver for NoopObserver {}

/// Keeps every tick summary; handy in tests and small runs.
#[derive(Debug, Default)]
pub struct SummaryCollector {
    pub summaries: Vec<TickSummary>,
    pub snapshots: Vec<Tick>,
    pub finished:  Option<Tick>,
}

impl SimObserver for SummaryCollector {
    fn on_tick_end(&mut self, _tick: Tick, summary: &TickSummary) {
        self.summaries.push(*summary);
    }

    fn on_snapshot(&mut self, tick: Tick, _world: &World) {
        self.snapshots.push(tick);
    }

    fn on_sim_end(&mut self, final_tick: Tick, _world: &World) {
        self.finished = Some(final_tick);
    }
}
