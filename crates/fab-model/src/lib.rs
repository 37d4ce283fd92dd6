mod domain;
pub use domain::{Arg, Args, ConfigName, Vars};
pub use domain::{
    ARG_WALL_TIME, DEFAULT_TESTING_TEMPLATE, LOCALHOST, OUTPUT_FILE, RESERVED_ARGS, SIF_SCRIPT,
    VALIDATION_CONFIG,
};

mod error;
pub use error::{ModelError, ModelResult};

mod job;
pub use job::{DEFAULT_WALL_TIME, JobLabel, JobSpec, WallTime};
