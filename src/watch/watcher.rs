//! Debounced filesystem watcher.
//!
//! ```text
//! notify --(std mpsc)--> worker thread --[filter]--[debounce]--> on_fire()
//! ```
//!
//! The notify callback only forwards raw events; filtering, debouncing and the
//! user callback all run on the watcher's own worker thread.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::mpsc::Receiver;
use std::thread;
use std::time::Duration;

use notify::event::{AccessKind, AccessMode, ModifyKind};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};

use super::{DebounceState, WatchError};
use crate::utils::path::is_temp_file;

/// Callback run on every accepted event and on [`DebouncedWatcher::fire_now`].
pub type OnFire = Arc<dyn Fn() -> anyhow::Result<()> + Send + Sync>;

/// Decides whether an event path is relevant to a watcher.
pub type PathFilter = Arc<dyn Fn(&Path) -> bool + Send + Sync>;

/// Construction parameters for [`DebouncedWatcher`].
#[derive(Clone)]
pub struct WatchOptions {
    /// Label used in log output
    pub name: &'static str,
    /// File or directory to subscribe to
    pub path: PathBuf,
    pub recursive: bool,
    pub min_interval: Duration,
    /// Relevance filter; without one, editor temp files are ignored
    pub filter: Option<PathFilter>,
}

impl WatchOptions {
    pub fn new(name: &'static str, path: impl Into<PathBuf>, min_interval: Duration) -> Self {
        Self {
            name,
            path: path.into(),
            recursive: false,
            min_interval,
            filter: None,
        }
    }

    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    pub fn filter(mut self, filter: impl Fn(&Path) -> bool + Send + Sync + 'static) -> Self {
        self.filter = Some(Arc::new(filter));
        self
    }
}

/// A filesystem subscription that runs `on_fire` at most once per
/// `min_interval`.
///
/// Dropping the watcher ends the subscription; the worker thread exits once
/// the event channel closes.
pub struct DebouncedWatcher {
    name: &'static str,
    state: Arc<DebounceState>,
    on_fire: OnFire,
    /// Watcher handle (must be kept alive)
    _watcher: RecommendedWatcher,
}

impl DebouncedWatcher {
    /// Subscribe to `options.path` and start the worker thread.
    ///
    /// Fails if the path is missing or cannot be watched.
    pub fn new(options: WatchOptions, on_fire: OnFire) -> Result<Self, WatchError> {
        let setup_err = |e| WatchError::Setup(options.path.clone(), e);

        let (notify_tx, notify_rx) = std::sync::mpsc::channel();
        let mut watcher = notify::recommended_watcher(move |res| {
            let _ = notify_tx.send(res);
        })
        .map_err(setup_err)?;

        let mode = if options.recursive {
            RecursiveMode::Recursive
        } else {
            RecursiveMode::NonRecursive
        };
        watcher.watch(&options.path, mode).map_err(setup_err)?;

        let state = Arc::new(DebounceState::new(options.min_interval));
        let worker = Worker {
            name: options.name,
            state: Arc::clone(&state),
            on_fire: Arc::clone(&on_fire),
            filter: options.filter.clone(),
        };
        thread::Builder::new()
            .name(format!("watch-{}", options.name))
            .spawn(move || worker.run(notify_rx))
            .map_err(|e| setup_err(notify::Error::io(e)))?;

        crate::debug!("watch"; "{}: watching {}", options.name, options.path.display());

        Ok(Self {
            name: options.name,
            state,
            on_fire,
            _watcher: watcher,
        })
    }

    /// Run the callback immediately, ignoring the debounce window.
    ///
    /// The fire is recorded, so events from the same burst are discarded.
    pub fn fire_now(&self) -> anyhow::Result<()> {
        crate::debug!("watch"; "{}: forced fire", self.name);
        self.state.stamp();
        let result = (self.on_fire)();
        self.state.stamp();
        result
    }

    #[cfg(test)]
    pub fn state(&self) -> &DebounceState {
        &self.state
    }
}

/// Event loop state owned by the worker thread.
pub(super) struct Worker {
    pub(super) name: &'static str,
    pub(super) state: Arc<DebounceState>,
    pub(super) on_fire: OnFire,
    pub(super) filter: Option<PathFilter>,
}

impl Worker {
    fn run(self, rx: Receiver<notify::Result<Event>>) {
        while let Ok(result) = rx.recv() {
            match result {
                Ok(event) => self.handle(&event),
                Err(e) => crate::log!("watch"; "{}: notify error: {}", self.name, e),
            }
        }
        crate::debug!("watch"; "{}: stopped", self.name);
    }

    pub(super) fn handle(&self, event: &Event) {
        if !is_relevant(event, self.filter.as_ref()) {
            return;
        }
        if !self.state.try_accept() {
            crate::debug!("watch"; "{}: debounced {:?}", self.name, event.paths);
            return;
        }

        crate::debug!("watch"; "{}: {:?} {:?}", self.name, event.kind, event.paths);
        if let Err(e) = (self.on_fire)() {
            crate::logger::status_error(&format!("{} failed", self.name), &format!("{e:#}"));
        }
        self.state.stamp();
    }
}

/// Keep create, remove and content-modify events on relevant paths.
///
/// Access and metadata-only events (mtime/atime/chmod noise) are dropped.
pub(super) fn is_relevant(event: &Event, filter: Option<&PathFilter>) -> bool {
    let kind_matches = match event.kind {
        EventKind::Create(_) | EventKind::Remove(_) => true,
        EventKind::Modify(ModifyKind::Metadata(_)) => false,
        EventKind::Modify(_) => true,
        // a writer closing the file; some backends report nothing else
        EventKind::Access(AccessKind::Close(AccessMode::Write)) => true,
        _ => false,
    };

    kind_matches
        && event.paths.iter().any(|path| match filter {
            Some(filter) => filter(path),
            None => !is_temp_file(path),
        })
}
