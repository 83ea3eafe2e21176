//! Build pipeline errors.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("`{0}` not found in PATH")]
    MissingProgram(String),

    #[error("failed to clean `{}`", .0.display())]
    Clean(PathBuf, #[source] std::io::Error),

    #[error("failed to copy `{}` into the output", .0.display())]
    Copy(PathBuf, #[source] std::io::Error),

    #[error("failed to replace `{}` with the new build", .0.display())]
    Publish(PathBuf, #[source] std::io::Error),

    #[error("build command failed")]
    Command(#[source] anyhow::Error),
}
