//! Metrics helpers for exec schedulers.

use fab_core::{JobOutcome, SchedulerError};

/// Local scheduler type identifier for metrics.
pub const SCHEDULER_TYPE_LOCAL: &str = "local";

/// Convert the result of a finished job to a [`JobOutcome`] for metrics.
pub fn scheduler_error_to_outcome(error: &SchedulerError) -> JobOutcome {
    match error {
        SchedulerError::Timeout { .. } => JobOutcome::Timeout,
        _ => JobOutcome::Failure,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fab_model::WallTime;

    #[test]
    fn timeout_maps_to_timeout() {
        let err = SchedulerError::Timeout {
            job: "j".into(),
            wall_time: WallTime::from_secs(1),
        };
        assert_eq!(scheduler_error_to_outcome(&err), JobOutcome::Timeout);
    }

    #[test]
    fn job_failed_maps_to_failure() {
        let err = SchedulerError::JobFailed {
            job: "j".into(),
            reason: "exit 1".into(),
        };
        assert_eq!(scheduler_error_to_outcome(&err), JobOutcome::Failure);
    }

    #[test]
    fn submit_maps_to_failure() {
        let err = SchedulerError::Submit {
            job: "j".into(),
            reason: "spawn failed".into(),
        };
        assert_eq!(scheduler_error_to_outcome(&err), JobOutcome::Failure);
    }
}
