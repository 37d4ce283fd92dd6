mod label;
pub use label::JobLabel;

mod walltime;
pub use walltime::{DEFAULT_WALL_TIME, WallTime};

mod spec;
pub use spec::JobSpec;
