//! Router that selects the [`Scheduler`] responsible for a context's host.
//!
//! Entries are checked in registration order. A host-bound entry wins over a
//! catch-all entry; among catch-all entries the first registered is used.
use std::sync::Arc;

use tracing::{debug, trace};

use crate::{ExecContext, error::CoreError, scheduler::Scheduler};

/// Single scheduler registration.
pub struct SchedulerEntry {
    /// Concrete scheduler implementation.
    pub scheduler: Arc<dyn Scheduler>,
    /// Host this scheduler serves; `None` serves any host.
    pub host: Option<String>,
}

/// Picks a [`Scheduler`] for an [`ExecContext`].
#[derive(Default)]
pub struct SchedulerRouter {
    entries: Vec<SchedulerEntry>,
}

impl SchedulerRouter {
    /// Create an empty router.
    #[inline]
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Register a catch-all scheduler.
    #[inline]
    pub fn register(&mut self, scheduler: Arc<dyn Scheduler>) {
        self.entries.push(SchedulerEntry {
            scheduler,
            host: None,
        });
    }

    /// Register a scheduler for one host.
    #[inline]
    pub fn register_for_host(&mut self, host: impl Into<String>, scheduler: Arc<dyn Scheduler>) {
        self.entries.push(SchedulerEntry {
            scheduler,
            host: Some(host.into()),
        });
    }

    /// Pick the scheduler for `host`.
    pub fn pick(&self, host: &str) -> Option<&Arc<dyn Scheduler>> {
        self.entries
            .iter()
            .find(|e| e.host.as_deref() == Some(host))
            .or_else(|| self.entries.iter().find(|e| e.host.is_none()))
            .map(|e| &e.scheduler)
    }

    /// Pick the scheduler for the context's host or fail with [`CoreError::NoScheduler`].
    pub fn for_context(&self, ctx: &ExecContext) -> Result<&Arc<dyn Scheduler>, CoreError> {
        trace!(host = ctx.host(), "routing context");
        let s = self
            .pick(ctx.host())
            .ok_or_else(|| CoreError::NoScheduler(ctx.host().to_string()))?;
        debug!(scheduler = s.name(), host = ctx.host(), "scheduler selected");
        Ok(s)
    }

    /// Returns `true` if a scheduler is bound to exactly this host.
    pub fn contains_host(&self, host: &str) -> bool {
        self.entries
            .iter()
            .any(|e| e.host.as_deref() == Some(host))
    }
}
