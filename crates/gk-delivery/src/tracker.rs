//! In-flight deliveries.

use std::collections::BTreeMap;

use gk_core::{AgentId, GeoPoint, KitchenId, OrderId, Tick};

use crate::{RoutingError, RoutingResult};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InFlight {
    pub driver:     AgentId,
    pub kitchen:    KitchenId,
    pub from:       GeoPoint,
    pub to:         GeoPoint,
    pub departed:   Tick,
    pub arrival:    Tick,
    pub distance_m: f64,
}

impl InFlight {
    /// Fraction of the trip covered at `now`, in [0, 1].
    pub fn progress(&self, now: Tick) -> f64 {
        now.progress_between(self.departed, self.arrival)
    }

    /// Linear interpolation between kitchen and customer.
    pub fn position(&self, now: Tick) -> GeoPoint {
        self.from.lerp(self.to, self.progress(now))
    }
}

/// Deliveries between dispatch and hand-over, keyed by order.
///
/// Updated only after the tick that dispatched or delivered has committed,
/// so it never runs ahead of the world.
#[derive(Debug, Clone, Default)]
pub struct DeliveryTracker {
    in_flight: BTreeMap<OrderId, InFlight>,
}

impl DeliveryTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dispatch(&mut self, order: OrderId, trip: InFlight) -> RoutingResult<()> {
        if self.in_flight.contains_key(&order) {
            return Err(RoutingError::AlreadyInFlight(order));
        }
        self.in_flight.insert(order, trip);
        Ok(())
    }

    /// Orders whose arrival tick is `now` or earlier, ascending by id.
    pub fn due(&self, now: Tick) -> Vec<OrderId> {
        self.in_flight
            .iter()
            .filter(|(_, t)| t.arrival <= now)
            .map(|(&id, _)| id)
            .collect()
    }

    /// Remove a delivery that has been handed over.
    pub fn complete(&mut self, order: OrderId) -> Option<InFlight> {
        self.in_flight.remove(&order)
    }

    pub fn get(&self, order: OrderId) -> Option<&InFlight> {
        self.in_flight.get(&order)
    }

    pub fn progress(&self, order: OrderId, now: Tick) -> Option<f64> {
        self.in_flight.get(&order).map(|t| t.progress(now))
    }

    pub fn iter(&self) -> impl Iterator<Item = (OrderId, &InFlight)> {
        self.in_flight.iter().map(|(&id, t)| (id, t))
    }

    pub fn len(&self) -> usize {
        self.in_flight.len()
    }

    pub fn is_empty(&self) -> bool {
        self.in_flight.is_empty()
    }
}
