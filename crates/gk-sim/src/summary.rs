use gk_core::Tick;
use gk_world::{Metrics, World};

/// What one tick did, handed to `SimObserver::on_tick_end` and written as a
/// `tick_summaries` row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickSummary {
    pub tick:            Tick,
    pub arrivals:        u64,
    pub orders_placed:   u64,
    pub cancelled:       u64,
    pub steps_started:   u64,
    pub steps_completed: u64,
    pub dispatched:      u64,
    pub delivered:       u64,
    pub closed:          u64,
    pub warnings:        u64,
    /// Events appended by this tick.
    pub events:          usize,
    pub active_orders:   usize,
    pub queued_requests: usize,
    pub running_steps:   usize,
    pub busy_slots:      u32,
    pub total_slots:     u32,
}

impl TickSummary {
    pub(crate) fn new(tick: Tick, delta: &Metrics, events: usize, world: &World) -> Self {
        let stats = world.board().stats();
        Self {
            tick,
            arrivals: delta.customers_arrived,
            orders_placed: delta.orders_placed,
            cancelled: delta.orders_cancelled,
            steps_started: delta.steps_started,
            steps_completed: delta.steps_completed,
            dispatched: delta.deliveries_dispatched,
            delivered: delta.orders_delivered,
            closed: delta.orders_closed,
            warnings: delta.backlog_warnings + delta.saturation_warnings,
            events,
            active_orders: world.active_order_count(),
            queued_requests: stats.iter().map(|k| k.queued).sum(),
            running_steps: stats.iter().map(|k| k.in_progress).sum(),
            busy_slots: stats.iter().map(|k| k.busy_slots).sum(),
            total_slots: stats.iter().map(|k| k.total_slots).sum(),
        }
    }

    /// Busy share of all station slots, 0 with no stations.
    pub fn utilization(&self) -> f64 {
        if self.total_slots == 0 {
            0.0
        } else {
            self.busy_slots as f64 / self.total_slots as f64
        }
    }
}
