use thiserror::Error;

use fab_model::WallTime;

use crate::template::TemplateError;

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("failed to stage config '{config}': {reason}")]
    Staging { config: String, reason: String },

    #[error("failed to submit job '{job}': {reason}")]
    Submit { job: String, reason: String },

    #[error("job '{job}' failed: {reason}")]
    JobFailed { job: String, reason: String },

    #[error("job '{job}' exceeded its wall time of {wall_time}")]
    Timeout { job: String, wall_time: WallTime },

    #[error("failed to fetch results: {0}")]
    Fetch(String),

    #[error("job name: {0}")]
    Template(#[from] TemplateError),

    #[error("io error: {0}")]
    Io(String),
}

impl From<std::io::Error> for SchedulerError {
    fn from(e: std::io::Error) -> Self {
        SchedulerError::Io(e.to_string())
    }
}
