use thiserror::Error;

/// Errors raised by the shared primitives.  Higher crates wrap this with
/// `#[from]` in their own enums.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid coordinate ({lat}, {lon})")]
    InvalidCoordinate { lat: f64, lon: f64 },

    #[error("invalid simulation config: {0}")]
    Config(String),
}

pub type CoreResult<T> = Result<T, CoreError>;
