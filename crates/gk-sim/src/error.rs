use thiserror::Error;

use gk_behavior::BehaviorError;
use gk_core::{CoreError, KitchenId, OrderId};
use gk_delivery::RoutingError;
use gk_kitchen::SchedulerError;
use gk_spatial::SpatialError;
use gk_world::WorldError;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("simulation configuration error: {0}")]
    Config(#[from] CoreError),

    /// Fatal: the run halts and the last committed tick stands.
    #[error("scheduling invariant violated: {0}")]
    Scheduler(#[from] SchedulerError),

    #[error("world commit rejected: {0}")]
    World(WorldError),

    #[error(transparent)]
    Routing(#[from] RoutingError),

    #[error(transparent)]
    Spatial(#[from] SpatialError),

    #[error(transparent)]
    Behavior(#[from] BehaviorError),

    #[error("no active {0}")]
    UnknownOrder(OrderId),

    #[error("no {0} in this setup")]
    UnknownKitchen(KitchenId),

    #[error("{order} is {state} and can no longer be cancelled")]
    NotCancellable { order: OrderId, state: &'static str },

    #[error("{0} was running a step but held no station slot")]
    SlotMissing(OrderId),
}

impl From<WorldError> for SimError {
    fn from(e: WorldError) -> Self {
        match e {
            WorldError::Scheduler(s) => SimError::Scheduler(s),
            other => SimError::World(other),
        }
    }
}

pub type SimResult<T> = Result<T, SimError>;
