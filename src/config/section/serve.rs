//! `[serve]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [serve]
//! interface = "127.0.0.1"     # Network interface (127.0.0.1 = localhost only)
//! port = 3000                 # HTTP port number
//! push = true                 # Push reload notifications over WebSocket
//! ws_port = 35729             # WebSocket port for reload push
//! save_on_update = false      # Write block 0 back to the file on every update
//! workers = 4                 # Request handler threads
//! max_body_bytes = 1048576    # Largest accepted request body
//! ```
//!
//! Use `interface = "0.0.0.0"` to make the server accessible from LAN.

use std::net::{IpAddr, Ipv4Addr};

use serde::{Deserialize, Serialize};

/// Development server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServeConfig {
    /// Network interface to bind.
    /// - `127.0.0.1` (default): localhost only
    /// - `0.0.0.0`: all interfaces (LAN accessible)
    pub interface: IpAddr,

    /// HTTP port number.
    pub port: u16,

    /// Push reload notifications to browsers over WebSocket.
    pub push: bool,

    /// WebSocket port for reload push.
    pub ws_port: u16,

    /// Write block 0 back to the watched file after every successful update.
    pub save_on_update: bool,

    /// Request handler threads.
    pub workers: usize,

    /// Largest accepted request body, in bytes.
    pub max_body_bytes: usize,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            interface: IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)),
            port: 3000,
            push: true,
            ws_port: 35729,
            save_on_update: false,
            workers: 4,
            max_body_bytes: 1024 * 1024,
        }
    }
}
