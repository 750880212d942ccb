use std::ops::AddAssign;

/// Running totals for the whole run.  A `TickTxn` carries a delta that is
/// added on commit.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Metrics {
    pub customers_arrived:     u64,
    pub orders_placed:         u64,
    pub orders_cancelled:      u64,
    pub orders_delivered:      u64,
    pub orders_closed:         u64,
    pub feedback_received:     u64,
    pub rating_sum:            u64,
    pub steps_started:         u64,
    pub steps_completed:       u64,
    pub queue_wait_ticks:      u64,
    pub deliveries_dispatched: u64,
    pub delivery_ticks:        u64,
    pub drivers_spawned:       u64,
    pub routing_failures:      u64,
    pub backlog_warnings:      u64,
    pub saturation_warnings:   u64,
}

impl Metrics {
    pub fn mean_rating(&self) -> Option<f64> {
        (self.feedback_received > 0).then(|| self.rating_sum as f64 / self.feedback_received as f64)
    }

    pub fn mean_queue_wait(&self) -> Option<f64> {
        (self.steps_started > 0).then(|| self.queue_wait_ticks as f64 / self.steps_started as f64)
    }

    pub fn mean_delivery_ticks(&self) -> Option<f64> {
        (self.deliveries_dispatched > 0)
            .then(|| self.delivery_ticks as f64 / self.deliveries_dispatched as f64)
    }
}

impl AddAssign for Metrics {
    fn add_assign(&mut self, d: Metrics) {
        self.customers_arrived += d.customers_arrived;
        self.orders_placed += d.orders_placed;
        self.orders_cancelled += d.orders_cancelled;
        self.orders_delivered += d.orders_delivered;
        self.orders_closed += d.orders_closed;
        self.feedback_received += d.feedback_received;
        self.rating_sum += d.rating_sum;
        self.steps_started += d.steps_started;
        self.steps_completed += d.steps_completed;
        self.queue_wait_ticks += d.queue_wait_ticks;
        self.deliveries_dispatched += d.deliveries_dispatched;
        self.delivery_ticks += d.delivery_ticks;
        self.drivers_spawned += d.drivers_spawned;
        self.routing_failures += d.routing_failures;
        self.backlog_warnings += d.backlog_warnings;
        self.saturation_warnings += d.saturation_warnings;
    }
}
