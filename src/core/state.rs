//! Ctrl+C handling.
//!
//! Until the HTTP server is up there is nothing to unwind, so an interrupt
//! exits on the spot (a slow seed load or front-end build included). Once
//! [`register_server`] ran, an interrupt unblocks the accept loop and wakes
//! the reload actor instead, and the process winds down from `serve`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use anyhow::Context;
use crossbeam::channel::Sender;
use tiny_http::Server;

static INTERRUPTED: AtomicBool = AtomicBool::new(false);

static HOOKS: OnceLock<ShutdownHooks> = OnceLock::new();

/// What an interrupt has to wake up once serving started.
struct ShutdownHooks {
    server: Arc<Server>,
    actors: Sender<()>,
}

impl ShutdownHooks {
    fn fire(&self) {
        crate::log!("serve"; "shutting down...");
        let _ = self.actors.send(());
        self.server.unblock();
    }
}

/// Install the process-wide Ctrl+C handler. Call once, first thing in `main`.
pub fn setup_shutdown_handler() -> anyhow::Result<()> {
    ctrlc::set_handler(|| {
        INTERRUPTED.store(true, Ordering::SeqCst);
        match HOOKS.get() {
            Some(hooks) => hooks.fire(),
            None => std::process::exit(0),
        }
    })
    .context("failed to install Ctrl+C handler")
}

/// Switch Ctrl+C from "exit now" to unblocking `server` and signalling `actors`.
pub fn register_server(server: Arc<Server>, actors: Sender<()>) {
    if HOOKS.set(ShutdownHooks { server, actors }).is_err() {
        crate::debug!("serve"; "shutdown hooks already registered");
    }
}

/// Whether Ctrl+C was pressed.
pub fn is_shutdown() -> bool {
    INTERRUPTED.load(Ordering::Relaxed)
}
