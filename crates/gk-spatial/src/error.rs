use std::path::PathBuf;

use thiserror::Error;

use crate::NodeId;

/// Spatial failures.  Inside a run these degrade a single order; they never
/// abort the simulation.
#[derive(Debug, Error)]
pub enum SpatialError {
    #[error("invalid coordinate ({lat}, {lon})")]
    InvalidCoordinate { lat: f64, lon: f64 },

    #[error("invalid H3 resolution {0}")]
    InvalidResolution(u8),

    #[error("no route from {from} to {to}")]
    NoRoute { from: NodeId, to: NodeId },

    #[error("road network has no nodes")]
    EmptyNetwork,

    #[error("edge references unknown node id {0}")]
    UnknownNode(u64),

    #[error("I/O error reading {path}: {source}")]
    Io {
        path:   PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed CSV in {path}: {source}")]
    Csv {
        path:   PathBuf,
        #[source]
        source: csv::Error,
    },
}

pub type SpatialResult<T> = Result<T, SpatialError>;
