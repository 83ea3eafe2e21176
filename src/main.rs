//! Dungeon - live-editing dev server.
//!
//! Watches one file, serves it as a JSON document of positioned text blocks,
//! accepts edits over HTTP and pushes reload notifications to the browser.

mod actor;
mod cli;
mod config;
mod core;
mod document;
mod embed;
mod logger;
mod pipeline;
mod reload;
mod utils;
mod watch;

use std::sync::Arc;

use anyhow::Result;
use clap::ColorChoice;
use tokio::sync::mpsc;

use actor::{CHANNEL_BUFFER, Notifier, messages::WsMsg};
use cli::{
    Cli,
    serve::{AppState, bind_server},
};
use config::DungeonConfig;
use document::DocumentStore;
use logger::status_error;
use pipeline::BuildPipeline;
use watch::{SelfWatch, TargetWatch};

fn main() -> Result<()> {
    // Setup global Ctrl+C handler (before any blocking operations)
    core::setup_shutdown_handler()?;

    let cli = Cli::parse_or_usage();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }
    logger::set_verbose(cli.verbose);

    let config = DungeonConfig::load(&cli)?;
    serve(&config)
}

/// Start everything and serve until Ctrl+C.
///
/// Order matters: the port is bound first so a clash fails fast, and the
/// document is seeded before the first request is accepted.
fn serve(config: &DungeonConfig) -> Result<()> {
    let (notifier, ws_rx, ws_port) = start_push(config)?;
    let bound = bind_server(config)?;

    let pipeline = Arc::new(BuildPipeline::new(config.build.clone()));
    prepare_frontend(config, &pipeline);

    let store = Arc::new(DocumentStore::new());
    let target = TargetWatch::new(
        &config.target,
        Arc::clone(&store),
        notifier.clone(),
        config.watch.min_interval(),
    )?;
    target.seed()?;
    log!("watch"; "{}", target.path().display());

    let _self_watch = if config.debug {
        log!("watch"; "rebuilding on changes under {}", config.build.root.display());
        Some(SelfWatch::new(config, pipeline, notifier.clone())?)
    } else {
        None
    };

    let state = Arc::new(AppState::new(config, store, notifier, ws_port));
    bound.run(state, ws_rx)
}

/// Bind the reload push listener, if enabled.
fn start_push(
    config: &DungeonConfig,
) -> Result<(Notifier, Option<mpsc::Receiver<WsMsg>>, Option<u16>)> {
    if !config.serve.push {
        return Ok((Notifier::disabled(), None, None));
    }

    let (ws_tx, ws_rx) = mpsc::channel(CHANNEL_BUFFER);
    let port = reload::server::start_ws_server_with_channel(
        config.serve.interface,
        config.serve.ws_port,
        ws_tx.clone(),
    )?;
    debug!("reload"; "ws://{}:{}", config.serve.interface, port);

    Ok((Notifier::new(ws_tx), Some(ws_rx), Some(port)))
}

/// Build the front-end at startup.
///
/// Debug mode always rebuilds; otherwise only a missing output is built.
/// Failures are reported and the server starts anyway.
fn prepare_frontend(config: &DungeonConfig, pipeline: &BuildPipeline) {
    if !config.debug && pipeline.has_output() {
        debug!("build"; "output present, skipping build");
        return;
    }

    match pipeline.build() {
        Ok(()) => log!("build"; "front-end ready in {}", pipeline.output_dir().display()),
        Err(e) => status_error("build failed", &format!("{:#}", anyhow::Error::from(e))),
    }
}
