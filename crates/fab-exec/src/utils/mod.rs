mod limits;
pub use limits::RlimitConfig;
pub use limits::{attach_rlimits, parse_memory};

mod log;
