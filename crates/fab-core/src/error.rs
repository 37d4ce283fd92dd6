use std::path::PathBuf;

use thiserror::Error;

use fab_model::ModelError;

use crate::{compare::CompareError, scheduler::SchedulerError, template::TemplateError};

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("no scheduler registered for host: {0}")]
    NoScheduler(String),

    #[error("scheduler error: {0}")]
    Scheduler(#[from] SchedulerError),

    #[error("template error: {0}")]
    Template(#[from] TemplateError),

    #[error("comparison failed: {0}")]
    Compare(#[from] CompareError),

    #[error("invalid job: {0}")]
    Model(#[from] ModelError),

    #[error("cannot read sweep directory {path}: {source}")]
    Sweep {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
