//! Well-known names shared by the task layer.
//!
//! Result directories, script names and override keys are matched by string,
//! so they live here instead of being repeated at every call site.

/// Fixed name of the file every job writes its scalar result to.
pub const OUTPUT_FILE: &str = "out.txt";

/// Configuration name used when re-scoring previously computed results.
///
/// With `skip_runs` the validation task rebinds the context to this name so
/// result paths resolve to `sif_validation…` / `test_subject_validation…`.
pub const VALIDATION_CONFIG: &str = "validation";

/// Script that produces the reference (stable intermediate form) result.
pub const SIF_SCRIPT: &str = "dummy_sif";

/// Script used as test subject when the caller does not name one.
pub const DEFAULT_TESTING_TEMPLATE: &str = "dummy_to_be_tested";

/// Host name that identifies in-process execution; jobs there are never waited on.
pub const LOCALHOST: &str = "localhost";

/// Override key that replaces a job's default wall time.
pub const ARG_WALL_TIME: &str = "wall_time";

/// Keys that identify a job and therefore cannot be overridden by caller arguments.
pub const RESERVED_ARGS: &[&str] = &["script", "label"];
