//! Reload push: WebSocket listener and message protocol.

pub mod message;
pub mod server;
