//! The `Sim` struct and its tick loop.

use std::mem;

use tracing::{debug, info};

use gk_behavior::DecisionModel;
use gk_core::{KitchenId, OrderId, RngRegistry, SimClock, SimConfig, StreamOwner, Tick};
use gk_delivery::{DeliveryTracker, EtaParams};
use gk_spatial::SpatialIndex;
use gk_world::{CancelReason, World};

use crate::lifecycle::{Command, TickPass};
use crate::{SimError, SimObserver, SimResult, TickSummary};

/// The simulation runner.
///
/// Each tick runs the same fixed sequence:
///
/// 1. **Decisions**: queued commands, customer arrivals, cancellations.
/// 2. **Lifecycle**: hand-overs, feedback, finished steps, kitchen
///    assignment for new orders.
/// 3. **Scheduler**: queued station requests are granted on a staged copy
///    of the station board.
/// 4. **Routing**: ready orders get a driver and an ETA.
/// 5. **Commit**: the staged [`TickTxn`](gk_world::TickTxn) is checked and
///    applied to the world in one step.
/// 6. **Snapshot**: observers see the committed world.
///
/// A commit failure (a scheduling invariant violation or an illegal
/// transition) halts the run; the world keeps the last good tick.
///
/// Create via [`SimBuilder`][crate::SimBuilder].
pub struct Sim<D: DecisionModel> {
    pub(crate) config:     SimConfig,
    pub(crate) clock:      SimClock,
    pub(crate) world:      World,
    pub(crate) spatial:    SpatialIndex,
    pub(crate) eta:        EtaParams,
    pub(crate) deliveries: DeliveryTracker,
    pub(crate) model:      D,
    pub(crate) rngs:       RngRegistry,
    /// Commands waiting for the next tick boundary.
    pub(crate) pending:    Vec<Command>,
}

impl<D: DecisionModel> Sim<D> {
    // ── Accessors ─────────────────────────────────────────────────────────

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn clock(&self) -> &SimClock {
        &self.clock
    }

    #[inline]
    pub fn now(&self) -> Tick {
        self.clock.now()
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn spatial(&self) -> &SpatialIndex {
        &self.spatial
    }

    pub fn deliveries(&self) -> &DeliveryTracker {
        &self.deliveries
    }

    pub fn model(&self) -> &D {
        &self.model
    }

    /// Random streams currently alive.
    pub fn live_streams(&self) -> usize {
        self.rngs.len()
    }

    // ── Control ───────────────────────────────────────────────────────────

    /// Cancel an order at the next tick boundary.  Only orders that have not
    /// left the kitchen can be cancelled.
    pub fn cancel_order(&mut self, order: OrderId, reason: CancelReason) -> SimResult<()> {
        let state = self
            .world
            .active_order(order)
            .ok_or(SimError::UnknownOrder(order))?
            .state;
        if !state.is_pre_dispatch() {
            return Err(SimError::NotCancellable { order, state: state.name() });
        }
        debug!(order = %order, reason = reason.as_str(), "cancellation queued");
        self.pending.push(Command::Cancel { order, reason });
        Ok(())
    }

    /// Close a kitchen at the next tick boundary: its pre-dispatch orders
    /// are cancelled and it takes no new ones.
    pub fn close_kitchen(&mut self, kitchen: KitchenId) -> SimResult<()> {
        if kitchen.index() >= self.world.setup().kitchens.len() {
            return Err(SimError::UnknownKitchen(kitchen));
        }
        self.pending.push(Command::CloseKitchen(kitchen));
        Ok(())
    }

    // ── Running ───────────────────────────────────────────────────────────

    /// Run from the current tick to `config.end_tick()`.
    pub fn run<O: SimObserver>(&mut self, observer: &mut O) -> SimResult<()> {
        let end = self.config.end_tick();
        info!(
            from = %self.now(),
            to = %end,
            kitchens = self.world.setup().kitchens.len(),
            seed = self.config.seed,
            "simulation started"
        );
        while self.now() < end {
            self.tick_once(observer)?;
        }
        let m = self.world.metrics();
        info!(
            final_tick = %self.now(),
            placed = m.orders_placed,
            delivered = m.orders_delivered,
            cancelled = m.orders_cancelled,
            active = self.world.active_order_count(),
            "simulation finished"
        );
        observer.on_sim_end(self.now(), &self.world);
        Ok(())
    }

    /// Run exactly `n` ticks from the current position, ignoring
    /// `end_tick`.  Does not call `on_sim_end`.
    pub fn run_ticks<O: SimObserver>(&mut self, n: u64, observer: &mut O) -> SimResult<()> {
        for _ in 0..n {
            self.tick_once(observer)?;
        }
        Ok(())
    }

    fn tick_once<O: SimObserver>(&mut self, observer: &mut O) -> SimResult<()> {
        let now = self.now();
        observer.on_tick_start(now);
        let summary = self.process_tick()?;
        observer.on_tick_end(now, &summary);
        if self.config.is_snapshot_tick(now) {
            observer.on_snapshot(now, &self.world);
        }
        if (now.0 + 1) % self.config.log_interval_ticks == 0 {
            let m = self.world.metrics();
            info!(
                clock = %self.clock,
                active = summary.active_orders,
                delivered = m.orders_delivered,
                utilization = summary.utilization(),
                "progress"
            );
        }
        self.clock.advance();
        Ok(())
    }

    fn process_tick(&mut self) -> SimResult<TickSummary> {
        let now = self.now();
        let events_before = self.world.events().len();
        let commands = mem::take(&mut self.pending);

        let out = TickPass::new(
            &self.world,
            &self.model,
            &self.spatial,
            &self.eta,
            &self.deliveries,
            &mut self.rngs,
        )
        .run(commands)?;

        let delta = out.txn.metrics;
        let archived = self.world.commit(out.txn)?;

        for id in out.delivered {
            self.deliveries.complete(id);
        }
        for (id, trip) in out.trips {
            self.deliveries.dispatch(id, trip)?;
        }
        for id in &archived {
            if let Some(order) = self.world.order(*id) {
                self.rngs.retire(StreamOwner::Agent(order.customer));
            }
        }

        let events = self.world.events().len() - events_before;
        debug!(tick = %now, events, archived = archived.len(), "tick committed");
        Ok(TickSummary::new(now, &delta, events, &self.world))
    }
}
