use thiserror::Error;

#[derive(Debug, Error)]
pub enum BehaviorError {
    #[error("invalid {name}: {reason}")]
    Parameter { name: &'static str, reason: String },
}

pub type BehaviorResult<T> = Result<T, BehaviorError>;
