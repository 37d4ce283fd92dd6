pub mod aggregate;
pub mod compare;
pub mod context;
pub mod error;
pub mod metrics;
pub mod scheduler;
pub mod tasks;
pub mod template;
pub mod validation;
pub mod workflow;

#[cfg(test)]
mod testing;

pub use context::{ContextConfig, ExecContext};
pub use error::CoreError;
pub use metrics::{JobOutcome, MetricsBackend, MetricsHandle, NoOpMetrics, noop_metrics};
pub use scheduler::{JobHandle, Scheduler, SchedulerError, SchedulerRouter, make_job_id};

pub mod prelude {
    pub use crate::aggregate::{Aggregator, Identity, Scores};
    pub use crate::compare::{CompareError, CompareFn, Comparator, ZeroPolicy};
    pub use crate::context::ExecContext;
    pub use crate::error::CoreError;
    pub use crate::scheduler::{JobHandle, Scheduler, SchedulerError, SchedulerRouter};
    pub use crate::workflow::{ValidationReport, ValidationRequest, ValidationWorkflow};
}
