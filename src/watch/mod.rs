//! Debounced filesystem watching.
//!
//! - [`DebouncedWatcher`] - generic subscription + debounce + callback
//! - [`TargetWatch`] - reloads the document when the edited file changes
//! - [`SelfWatch`] - rebuilds the front-end when the project changes

mod debounce;
mod error;
mod project;
mod target;
mod watcher;

#[cfg(test)]
mod tests;

pub use debounce::DebounceState;
pub use error::WatchError;
pub use project::SelfWatch;
pub use target::TargetWatch;
pub use watcher::{DebouncedWatcher, WatchOptions};
