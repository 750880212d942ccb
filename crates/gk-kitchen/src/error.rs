use thiserror::Error;

use gk_core::{KitchenId, OrderId, StationId, StationTypeId};

#[derive(Debug, Error)]
pub enum SchedulerError {
    /// A scheduler defect.  The run must halt rather than continue on a
    /// corrupted board.
    #[error("{station} holds {occupied} instructions but has capacity {capacity}")]
    InvariantViolation {
        station:  StationId,
        occupied: usize,
        capacity: u32,
    },

    #[error("{order} holds a slot on {station} twice")]
    DoubleBooking { order: OrderId, station: StationId },

    #[error("{0} is not on the board")]
    UnknownKitchen(KitchenId),

    #[error("{kitchen} has no station of type {station_type}")]
    NoStationOfType {
        kitchen:      KitchenId,
        station_type: StationTypeId,
    },

    #[error("{0} already has a pending or running step")]
    DuplicateRequest(OrderId),
}

pub type SchedulerResult<T> = Result<T, SchedulerError>;
