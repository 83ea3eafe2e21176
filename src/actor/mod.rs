//! Reload notification actor.
//!
//! A single `WsActor` task owns the WebSocket clients. Everything else talks
//! to it through a cloneable [`Notifier`], which never blocks the caller.

pub mod messages;
mod ws;

pub use ws::WsActor;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::mpsc;

use messages::WsMsg;

/// Channel buffer size for the actor mailbox
pub const CHANNEL_BUFFER: usize = 64;

/// Handle for pushing reload notifications to browser clients.
///
/// Tracks whether the last outcome was an error, so the first success after a
/// failure also clears the client-side overlay.
#[derive(Clone)]
pub struct Notifier {
    tx: Option<mpsc::Sender<WsMsg>>,
    failing: Arc<AtomicBool>,
}

impl Notifier {
    pub fn new(tx: mpsc::Sender<WsMsg>) -> Self {
        Self {
            tx: Some(tx),
            failing: Arc::new(AtomicBool::new(false)),
        }
    }

    /// A notifier that drops everything (push disabled, clients poll).
    pub fn disabled() -> Self {
        Self {
            tx: None,
            failing: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Create a notifier together with its mailbox.
    #[cfg(test)]
    pub fn channel() -> (Self, mpsc::Receiver<WsMsg>) {
        let (tx, rx) = mpsc::channel(CHANNEL_BUFFER);
        (Self::new(tx), rx)
    }

    #[cfg(test)]
    pub fn is_enabled(&self) -> bool {
        self.tx.is_some()
    }

    pub fn reload(&self, reason: impl Into<String>) {
        if self.failing.swap(false, Ordering::AcqRel) {
            self.send(WsMsg::ClearError);
        }
        self.send(WsMsg::Reload {
            reason: reason.into(),
        });
    }

    pub fn error(&self, path: impl Into<String>, error: impl Into<String>) {
        self.failing.store(true, Ordering::Release);
        self.send(WsMsg::Error {
            path: path.into(),
            error: error.into(),
        });
    }

    /// Ask the actor to close all clients and stop.
    pub fn shutdown(&self) {
        self.send(WsMsg::Shutdown);
    }

    fn send(&self, msg: WsMsg) {
        if let Some(tx) = &self.tx
            && let Err(e) = tx.try_send(msg)
        {
            crate::debug!("reload"; "notification dropped: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reload_sends_reason() {
        let (notifier, mut rx) = Notifier::channel();
        notifier.reload("notes.md changed");
        assert!(matches!(
            rx.try_recv(),
            Ok(WsMsg::Reload { reason }) if reason == "notes.md changed"
        ));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_success_after_error_clears_once() {
        let (notifier, mut rx) = Notifier::channel();
        notifier.error("build", "exit 1");
        notifier.reload("frontend rebuilt");
        notifier.reload("frontend rebuilt");

        assert!(matches!(rx.try_recv(), Ok(WsMsg::Error { path, .. }) if path == "build"));
        assert!(matches!(rx.try_recv(), Ok(WsMsg::ClearError)));
        assert!(matches!(rx.try_recv(), Ok(WsMsg::Reload { .. })));
        assert!(matches!(rx.try_recv(), Ok(WsMsg::Reload { .. })));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_disabled_notifier_is_silent() {
        let notifier = Notifier::disabled();
        assert!(!notifier.is_enabled());
        notifier.error("x", "y");
        notifier.reload("z");
    }

    #[test]
    fn test_clones_share_failure_state() {
        let (notifier, mut rx) = Notifier::channel();
        let other = notifier.clone();
        notifier.error("notes.md", "gone");
        other.reload("notes.md changed");

        assert!(matches!(rx.try_recv(), Ok(WsMsg::Error { .. })));
        assert!(matches!(rx.try_recv(), Ok(WsMsg::ClearError)));
    }
}
