use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("invalid wall time '{0}' (expected H:M:S)")]
    InvalidWallTime(String),

    #[error("invalid job label: {0:?}")]
    InvalidLabel(String),

    #[error("override key '{0}' is reserved and cannot be changed")]
    ReservedKey(String),
}

pub type ModelResult<T> = Result<T, ModelError>;
