//! Server lifecycle management.

use crate::{
    actor::{Notifier, WsActor, messages::WsMsg},
    core::register_server,
    log,
};
use anyhow::{Context, Result};
use crossbeam::channel::{Receiver, Sender};
use std::{
    net::{IpAddr, SocketAddr},
    sync::Arc,
    thread::{self, JoinHandle},
    time::Duration,
};
use tiny_http::Server;
use tokio::sync::mpsc;

/// Bind exactly `interface:port`. Port 0 picks an ephemeral port.
pub fn bind(interface: IpAddr, port: u16) -> Result<(Server, SocketAddr)> {
    let requested = SocketAddr::new(interface, port);
    let server = Server::http(requested)
        .map_err(|e| anyhow::anyhow!("Failed to bind http://{}: {}", requested, e))?;
    let addr = server.server_addr().to_ip().unwrap_or(requested);
    Ok((server, addr))
}

/// Register server for graceful shutdown.
///
/// When Ctrl+C is pressed, the handler unblocks the server and notifies actors.
pub fn register_server_for_shutdown(server: Arc<Server>, shutdown_tx: Sender<()>) {
    register_server(server, shutdown_tx);
}

/// Spawn the reload actor system on its own runtime thread.
pub fn spawn_actors(
    ws_rx: mpsc::Receiver<WsMsg>,
    notifier: Notifier,
    shutdown_rx: Receiver<()>,
) -> Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("reload-actors".into())
        .spawn(move || run_actor_system(ws_rx, &notifier, &shutdown_rx))
        .context("Failed to spawn reload actor thread")
}

fn run_actor_system(ws_rx: mpsc::Receiver<WsMsg>, notifier: &Notifier, shutdown_rx: &Receiver<()>) {
    let rt = match tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            log!("reload"; "failed to create runtime: {}", e);
            return;
        }
    };

    rt.block_on(async {
        let ws_handle = tokio::spawn(WsActor::new(ws_rx).run());
        crate::debug!("actor"; "start");

        // Wait for shutdown signal (poll-based since crossbeam channel)
        loop {
            if shutdown_rx.try_recv().is_ok() || crate::core::is_shutdown() {
                crate::debug!("actor"; "shutdown signal received");
                break;
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }

        notifier.shutdown();
        let _ = tokio::time::timeout(Duration::from_millis(500), ws_handle).await;
        crate::debug!("actor"; "stopped");
    });
}

/// Wait for actor system to shutdown gracefully (max 2 seconds).
pub fn wait_for_shutdown(handle: Option<JoinHandle<()>>) {
    let Some(handle) = handle else { return };

    for _ in 0..40 {
        if handle.is_finished() {
            let _ = handle.join();
            return;
        }
        thread::sleep(Duration::from_millis(50));
    }
}
