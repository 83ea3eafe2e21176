//! Sync server: the document API plus static serving of the build output.

mod lifecycle;
mod path;
mod response;
mod routes;


pub use response::Reply;
pub use routes::dispatch;

use crate::{
    actor::{Notifier, messages::WsMsg},
    config::DungeonConfig,
    debug,
    document::DocumentStore,
    log,
};
use anyhow::{Context, Result};
use crossbeam::channel;
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::AtomicU64;
use tiny_http::{Method, Request, Server};
use tokio::sync::mpsc;

/// Everything a request handler may touch.
pub struct AppState {
    pub store: Arc<DocumentStore>,
    pub notifier: Notifier,
    /// Watched document file
    pub target: PathBuf,
    /// Build output directory (static fallback root)
    pub output: PathBuf,
    /// Page served at `/`
    pub page: PathBuf,
    pub save_on_update: bool,
    pub max_body_bytes: usize,
    /// Reload push port, when push is enabled
    pub ws_port: Option<u16>,
    /// `/increment` counter
    pub counter: AtomicU64,
}

impl AppState {
    pub fn new(
        config: &DungeonConfig,
        store: Arc<DocumentStore>,
        notifier: Notifier,
        ws_port: Option<u16>,
    ) -> Self {
        Self {
            store,
            notifier,
            target: config.target.clone(),
            output: config.build.output.clone(),
            page: config.build.page_path(),
            save_on_update: config.serve.save_on_update,
            max_body_bytes: config.serve.max_body_bytes,
            ws_port,
            counter: AtomicU64::new(0),
        }
    }
}

/// Bound server ready to accept requests
pub struct BoundServer {
    server: Arc<Server>,
    workers: usize,
    shutdown_rx: channel::Receiver<()>,
}

/// Bind the HTTP server and register it for Ctrl+C shutdown.
///
/// Binding happens before the request loop so startup failures (port in
/// use) surface before any background work begins.
pub fn bind_server(config: &DungeonConfig) -> Result<BoundServer> {
    let (server, addr) = lifecycle::bind(config.serve.interface, config.serve.port)?;
    let server = Arc::new(server);

    let (shutdown_tx, shutdown_rx) = channel::unbounded::<()>();
    lifecycle::register_server_for_shutdown(Arc::clone(&server), shutdown_tx);

    log!("serve"; "http://{}", addr);

    Ok(BoundServer {
        server,
        workers: config.serve.workers,
        shutdown_rx,
    })
}

impl BoundServer {
    /// Start the request loop (blocking until shutdown).
    ///
    /// With a reload mailbox, the reload actor runs alongside the server.
    pub fn run(self, state: Arc<AppState>, ws_rx: Option<mpsc::Receiver<WsMsg>>) -> Result<()> {
        let actor_handle = ws_rx
            .map(|rx| lifecycle::spawn_actors(rx, state.notifier.clone(), self.shutdown_rx))
            .transpose()?;

        run_request_loop(&self.server, state, self.workers)?;
        lifecycle::wait_for_shutdown(actor_handle);
        Ok(())
    }
}

/// Serve requests on a thread pool until the server is unblocked.
fn run_request_loop(server: &Server, state: Arc<AppState>, workers: usize) -> Result<()> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .thread_name(|i| format!("http-{i}"))
        .build()
        .context("Failed to create request thread pool")?;

    for request in server.incoming_requests() {
        let state = Arc::clone(&state);
        pool.spawn(move || {
            if let Err(e) = handle_request(request, &state) {
                log!("serve"; "request error: {e}");
            }
        });
    }
    Ok(())
}

/// Handle a single HTTP request
fn handle_request(mut request: Request, state: &AppState) -> Result<()> {
    let head = request.method() == &Method::Head;

    // Early exit if shutdown requested
    if crate::core::is_shutdown() {
        return response::send(request, Reply::error(503, "shutting down"), head);
    }

    let reply = match read_body(&mut request, state.max_body_bytes) {
        Ok(body) => dispatch(request.method(), request.url(), &body, state),
        Err(reply) => reply,
    };
    debug!("serve"; "{} {} -> {}", request.method(), request.url(), reply.status);

    response::send(request, reply, head)
}

/// Read the request body, refusing anything over `limit` bytes.
fn read_body(request: &mut Request, limit: usize) -> Result<Vec<u8>, Reply> {
    let mut body = Vec::new();
    request
        .as_reader()
        .take(limit as u64 + 1)
        .read_to_end(&mut body)
        .map_err(|e| Reply::error(400, format!("failed to read body: {e}")))?;

    if body.len() > limit {
        return Err(Reply::error(413, format!("body exceeds {limit} bytes")));
    }
    Ok(body)
}
