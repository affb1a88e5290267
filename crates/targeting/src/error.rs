use thiserror::Error;

pub type TargetingResult<T> = Result<T, TargetingError>;

#[derive(Error, Debug)]
pub enum TargetingError {
    #[error("Malformed audience targeting config: {0}")]
    Malformed(#[from] serde_json::Error),
}
