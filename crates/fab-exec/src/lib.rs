mod error;
pub use error::ExecError;

mod utils;
pub use utils::*;

mod metrics;
pub use metrics::SCHEDULER_TYPE_LOCAL;
pub use metrics::scheduler_error_to_outcome;

#[cfg(feature = "local")]
pub mod local;
