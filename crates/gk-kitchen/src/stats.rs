use gk_core::{KitchenId, OrderId, StationId, StationTypeId};

use crate::StationState;

/// Backpressure signal for one kitchen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KitchenStats {
    pub kitchen:     KitchenId,
    pub queued:      usize,
    pub in_progress: usize,
    pub busy_slots:  u32,
    pub total_slots: u32,
}

impl KitchenStats {
    /// busy / total; 0 for a kitchen with no stations.
    pub fn utilization(&self) -> f64 {
        if self.total_slots == 0 {
            0.0
        } else {
            self.busy_slots as f64 / self.total_slots as f64
        }
    }

    pub fn idle_slots(&self) -> u32 {
        self.total_slots - self.busy_slots
    }
}

/// Snapshot row for one station.
#[derive(Debug, Clone, PartialEq)]
pub struct StationView {
    pub station:      StationId,
    pub kitchen:      KitchenId,
    pub station_type: StationTypeId,
    pub capacity:     u32,
    pub state:        StationState,
    pub occupants:    Vec<OrderId>,
}
