use thiserror::Error;

use gk_core::{AgentId, OrderId, Tick};
use gk_kitchen::SchedulerError;

/// Commit-time invariant failures.  Each one is an engine defect.
#[derive(Debug, Error)]
pub enum WorldError {
    #[error(transparent)]
    Scheduler(#[from] SchedulerError),

    #[error("{order} step index went from {from} to {to}")]
    StepRegression { order: OrderId, from: usize, to: usize },

    #[error("{order} advanced from step {from} to {to} in one tick")]
    StepSkipped { order: OrderId, from: usize, to: usize },

    #[error("{order} started step {step} before step {prev} completed")]
    StepOverlap { order: OrderId, step: usize, prev: usize },

    #[error("{order} left {from} for {to}, which is not a lifecycle transition")]
    IllegalTransition {
        order: OrderId,
        from:  &'static str,
        to:    &'static str,
    },

    #[error("update for unknown {0}")]
    UnknownOrder(OrderId),

    #[error("update for unknown {0}")]
    UnknownAgent(AgentId),

    #[error("transaction for {got} applied to a world at {expected}")]
    StaleTxn { expected: Tick, got: Tick },

    #[error("staged id {got} does not follow {expected}")]
    IdGap { expected: u64, got: u64 },
}

pub type WorldResult<T> = Result<T, WorldError>;
