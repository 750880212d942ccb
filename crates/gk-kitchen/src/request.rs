use gk_core::{KitchenId, OrderId, StationId, StationTypeId, Tick};

/// One recipe step asking for a station.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StationRequest {
    pub order:        OrderId,
    pub kitchen:      KitchenId,
    pub station_type: StationTypeId,
    /// Index of the instruction within the item's recipe.
    pub step:         usize,
    /// Creation tick of the order.
    pub created:      Tick,
    /// Tick the step became ready to start.
    pub requested:    Tick,
}

impl StationRequest {
    #[inline]
    pub fn key(&self) -> QueueKey {
        QueueKey {
            requested: self.requested,
            created:   self.created,
            order:     self.order,
        }
    }
}

/// Position in a station-type queue.  Field order is the sort order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct QueueKey {
    pub requested: Tick,
    pub created:   Tick,
    pub order:     OrderId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Granted(StationId),
    Queued,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Grant {
    pub order:   OrderId,
    pub kitchen: KitchenId,
    pub station: StationId,
    pub step:    usize,
    pub tick:    Tick,
    /// Ticks spent queued before the grant.
    pub waited:  u64,
}
