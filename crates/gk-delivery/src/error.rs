use thiserror::Error;

use gk_core::OrderId;
use gk_spatial::SpatialError;

#[derive(Debug, Error)]
pub enum RoutingError {
    #[error("routing failed: {0}")]
    Spatial(#[from] SpatialError),

    #[error("non-finite distance {0}")]
    BadDistance(f64),

    #[error("invalid {name}: {reason}")]
    Parameter { name: &'static str, reason: String },

    #[error("{0} is already out for delivery")]
    AlreadyInFlight(OrderId),
}

pub type RoutingResult<T> = Result<T, RoutingError>;
