use std::sync::atomic::{AtomicU64, Ordering};

/// Process-wide monotonically increasing sequence for job names.
static JOB_SEQ: AtomicU64 = AtomicU64::new(1);

fn next_seq() -> u64 {
    JOB_SEQ.fetch_add(1, Ordering::Relaxed)
}

/// Build a human-readable, process-unique job name.
///
/// Format: `{scheduler}-{result_dir}-{seq:x}`.
/// - `scheduler`: [`Scheduler::name`](crate::Scheduler::name)
/// - `result_dir`: result directory the job writes to
/// - `seq`: per-process hex sequence
pub fn make_job_id(scheduler: &str, result_dir: &str) -> String {
    format!("{scheduler}-{result_dir}-{seq:x}", seq = next_seq())
}

#[cfg(test)]
mod tests {
    use super::make_job_id;

    #[test]
    fn ids_are_unique_and_keep_their_parts() {
        let a = make_job_id("local", "sif_dummy_test_localhost_1");
        let b = make_job_id("local", "sif_dummy_test_localhost_1");

        assert_ne!(a, b);
        assert!(a.starts_with("local-sif_dummy_test_localhost_1-"));
    }
}
