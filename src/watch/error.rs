//! Watcher error types.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WatchError {
    /// The filesystem subscription could not be established.
    #[error("cannot watch `{}`", .0.display())]
    Setup(PathBuf, #[source] notify::Error),
}
