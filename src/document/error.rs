//! Document store error types.

use std::path::PathBuf;
use thiserror::Error;

use super::BlockId;

/// Errors raised by document store operations
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("block {0} not found")]
    NotFound(BlockId),

    #[error("invalid block: {0}")]
    Validation(String),

    #[error("IO error on `{}`", .0.display())]
    Io(PathBuf, #[source] std::io::Error),
}

impl DocumentError {
    pub(super) fn io(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        Self::Io(path.into(), err)
    }
}
