//! Local scheduler: runs job scripts as subprocesses of this process.
//!
//! The "remote" side of a FabSim-style workflow is simulated with plain
//! directories: configs are staged under a work root, every job gets its own
//! directory below a remote results root, and fetching copies those
//! directories into the context's local results root.
mod config;
mod fsops;
mod job;
mod scheduler;

pub use config::{LocalSchedulerConfig, OutputLogConfig, SubmitMode};
pub use scheduler::LocalScheduler;

use std::sync::Arc;

use fab_core::SchedulerRouter;

use crate::ExecError;

/// Register a local scheduler for `localhost` in the given router.
pub fn register_local_scheduler(
    router: &mut SchedulerRouter,
    config: LocalSchedulerConfig,
) -> Result<(), ExecError> {
    router.register_for_host(fab_model::LOCALHOST, Arc::new(LocalScheduler::new(config)?));
    Ok(())
}
