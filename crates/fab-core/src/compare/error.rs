use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CompareError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("line {line}: could not convert {content:?} to float")]
    Parse { line: usize, content: String },

    #[error("no numeric line found")]
    NoValue,

    #[error("division by zero: reference value is 0")]
    ZeroReference,
}
