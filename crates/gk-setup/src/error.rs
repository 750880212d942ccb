use std::path::PathBuf;

use thiserror::Error;

/// A setup that cannot be simulated.  Always raised before tick 0.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("setup directory {0} does not exist")]
    MissingDirectory(PathBuf),

    #[error("I/O error reading {path}: {source}")]
    Io {
        path:   PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed JSON in {path}: {source}")]
    Json {
        path:   PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("malformed CSV in {path}: {source}")]
    Csv {
        path:   PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("duplicate {kind} id {id:?}")]
    DuplicateId { kind: &'static str, id: String },

    #[error("site {site:?} has invalid coordinate ({lat}, {lon})")]
    InvalidCoordinate { site: String, lat: f64, lon: f64 },

    #[error("station {station:?} in kitchen {kitchen:?} has capacity 0")]
    ZeroCapacity { kitchen: String, station: String },

    #[error("kitchen {kitchen:?} references unknown brand {brand:?}")]
    UnknownBrand { kitchen: String, brand: String },

    #[error("menu item {item:?} references unknown ingredient {ingredient:?}")]
    UnknownIngredient { item: String, ingredient: String },

    #[error(
        "menu item {item:?} of brand {brand:?}: step {step:?} requires station type \
         {station_type:?}, which no kitchen serving the brand has"
    )]
    UnreachableStationType {
        brand:        String,
        item:         String,
        step:         String,
        station_type: String,
    },

    #[error("menu item {item:?} of brand {brand:?} cannot be prepared end-to-end in any single kitchen")]
    NoCapableKitchen { brand: String, item: String },

    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}

pub type ConfigResult<T> = Result<T, ConfigError>;
