use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExecError {
    #[error("invalid scheduler configuration: {0}")]
    InvalidSchedulerConfig(String),

    #[error("invalid memory size '{0}': expected <number>[K|M|G|T]")]
    InvalidMemory(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
