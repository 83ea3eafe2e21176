//! Target watch: keeps the document store in sync with the edited file.
//!
//! The parent directory is watched rather than the file itself, so editors
//! that save by writing a new file and renaming it over the old one keep
//! triggering reloads.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;

use super::{DebouncedWatcher, WatchError, WatchOptions};
use crate::actor::Notifier;
use crate::document::{DocumentError, DocumentStore};
use crate::logger::status_success;

pub struct TargetWatch {
    watcher: DebouncedWatcher,
    path: PathBuf,
}

impl TargetWatch {
    /// Subscribe to changes of `path`.
    ///
    /// The store is not touched until the first event or [`seed`](Self::seed).
    pub fn new(
        path: &Path,
        store: Arc<DocumentStore>,
        notifier: Notifier,
        min_interval: Duration,
    ) -> Result<Self, WatchError> {
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let file_name = path.file_name().map(ToOwned::to_owned);

        let options = WatchOptions::new("target", dir, min_interval)
            .filter(move |changed| changed.file_name() == file_name.as_deref());

        let target = path.to_path_buf();
        let on_fire = Arc::new(move || reload(&store, &notifier, &target));

        Ok(Self {
            watcher: DebouncedWatcher::new(options, on_fire)?,
            path: path.to_path_buf(),
        })
    }

    /// Load the file for the first time. Failure leaves nothing to serve.
    pub fn seed(&self) -> anyhow::Result<()> {
        self.watcher
            .fire_now()
            .with_context(|| format!("initial load of `{}` failed", self.path.display()))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Reload the document from the file and tell clients.
///
/// Only the echo of our own `save_to_file` is skipped. On failure the
/// previous document stays in place.
fn reload(store: &DocumentStore, notifier: &Notifier, path: &Path) -> anyhow::Result<()> {
    let name = display_name(path);

    match load_unless_own_write(store, path) {
        Ok(true) => {
            status_success(&format!("reloaded {name}"));
            notifier.reload(format!("{name} changed"));
            Ok(())
        }
        Ok(false) => {
            crate::debug!("watch"; "{} written by us, not reloaded", name);
            Ok(())
        }
        Err(e) => {
            notifier.error(path.display().to_string(), e.to_string());
            Err(e.into())
        }
    }
}

fn load_unless_own_write(store: &DocumentStore, path: &Path) -> Result<bool, DocumentError> {
    if store.take_own_write(path)? {
        return Ok(false);
    }
    store.load_from_file(path)?;
    Ok(true)
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned())
}
