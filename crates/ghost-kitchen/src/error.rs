use std::path::PathBuf;

use thiserror::Error;

use gk_behavior::BehaviorError;
use gk_output::OutputError;
use gk_setup::ConfigError;
use gk_sim::SimError;

#[derive(Debug, Error)]
pub enum GhostKitchenError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("simulation error: {0}")]
    Sim(#[from] SimError),

    #[error("behavior model error: {0}")]
    Behavior(#[from] BehaviorError),

    #[error("output error: {0}")]
    Output(#[from] OutputError),

    #[error("{0} already holds a setup")]
    AlreadyInitialized(PathBuf),
}

pub type GhostKitchenResult<T> = Result<T, GhostKitchenError>;
