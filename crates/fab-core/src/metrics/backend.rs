use std::sync::Arc;

/// Terminal state of a job, for metrics classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobOutcome {
    /// Job exited successfully.
    Success,
    /// Job exited with an error.
    Failure,
    /// Job ran past its wall time.
    Timeout,
}

impl JobOutcome {
    /// Return label value for metrics.
    #[inline]
    pub fn as_label(&self) -> &'static str {
        match self {
            JobOutcome::Success => "success",
            JobOutcome::Failure => "failure",
            JobOutcome::Timeout => "timeout",
        }
    }
}

/// Backend metrics collection interface.
///
/// Implementations are carried by [`crate::ExecContext`] and called by the
/// validation workflow and by scheduler backends.
pub trait MetricsBackend: Send + Sync + 'static {
    /// Record a job handed to a scheduler.
    ///
    /// # Arguments
    /// - `scheduler`: scheduler name
    /// - `label`: job label, `"none"` for unlabeled jobs
    fn record_job_submitted(&self, scheduler: &str, label: &str);
    /// Record a job reaching a terminal state.
    ///
    /// # Arguments
    /// - `scheduler`: scheduler name
    /// - `outcome`: how the job terminated
    /// - `duration_ms`: run time in milliseconds
    fn record_job_completed(&self, scheduler: &str, outcome: JobOutcome, duration_ms: u64);
    /// Record one comparison score.
    ///
    /// # Arguments
    /// - `config`: configuration the compared jobs were built from
    /// - `score`: relative difference between subject and reference
    fn record_score(&self, config: &str, score: f64);
}

/// Shared handle to metrics backend.
pub type MetricsHandle = Arc<dyn MetricsBackend>;
