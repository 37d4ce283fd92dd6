mod args;
pub use args::{Arg, Args};

mod vars;
pub use vars::Vars;

mod constants;
pub use constants::{
    ARG_WALL_TIME, DEFAULT_TESTING_TEMPLATE, LOCALHOST, OUTPUT_FILE, RESERVED_ARGS, SIF_SCRIPT,
    VALIDATION_CONFIG,
};

/// Name of a configuration directory (e.g. `dummy_test`, `cylinder`).
///
/// Configurations are looked up under the plugin's config root and define the input files of a job.
pub type ConfigName = String;
