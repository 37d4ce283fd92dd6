//! Scheduler abstraction the task layer submits jobs through.
//!
//! Concrete schedulers (local subprocesses, batch queues on remote machines)
//! implement [`Scheduler`] and are selected per host by [`SchedulerRouter`].
mod error;
pub use error::SchedulerError;

mod id;
pub use id::make_job_id;

mod router;
pub use router::{SchedulerEntry, SchedulerRouter};

use async_trait::async_trait;
use fab_model::JobSpec;

use crate::ExecContext;

/// Receipt for a submitted job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobHandle {
    /// Scheduler-unique job name, used by [`Scheduler::wait_complete`] filters.
    pub name: String,
    /// Result directory name (relative to the results root) the job writes to.
    pub result_dir: String,
}

/// Job submission backend.
///
/// Every call is a blocking step of a sequential task: the task awaits each
/// call before issuing the next one. Failures are returned as is and never
/// retried by the caller.
#[async_trait]
pub trait Scheduler: Send + Sync {
    /// Scheduler name used in logs and metrics.
    fn name(&self) -> &'static str;

    /// Stage the input files of `config` into the execution target.
    async fn put_configs(&self, ctx: &ExecContext, config: &str) -> Result<(), SchedulerError>;

    /// Submit one job.
    async fn submit(&self, ctx: &ExecContext, spec: &JobSpec) -> Result<JobHandle, SchedulerError>;

    /// Block until every outstanding job whose name contains `filter` is terminal.
    ///
    /// An empty filter matches every job.
    async fn wait_complete(&self, ctx: &ExecContext, filter: &str) -> Result<(), SchedulerError>;

    /// Copy the output of all submitted jobs into the context's local results root.
    async fn fetch_results(&self, ctx: &ExecContext) -> Result<(), SchedulerError>;
}
