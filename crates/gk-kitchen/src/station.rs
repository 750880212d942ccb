use gk_core::{OrderId, StationId, StationTypeId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StationState {
    Idle,
    Busy(u32),
}

/// Runtime occupancy of one station.
#[derive(Debug, Clone)]
pub struct StationSlot {
    pub id:           StationId,
    pub station_type: StationTypeId,
    pub capacity:     u32,
    /// Orders currently executing here, in grant order.
    pub occupants:    Vec<OrderId>,
}

impl StationSlot {
    #[inline]
    pub fn occupied(&self) -> u32 {
        self.occupants.len() as u32
    }

    #[inline]
    pub fn has_free_slot(&self) -> bool {
        self.occupied() < self.capacity
    }

    pub fn state(&self) -> StationState {
        match self.occupied() {
            0 => StationState::Idle,
            n => StationState::Busy(n),
        }
    }
}
