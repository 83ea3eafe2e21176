//! Actor Message Definitions
//!
//! ```text
//! TargetWatch / SelfWatch / HTTP handlers --Notifier--> WsActor --> Clients
//! ws listener --AddClient--> WsActor
//! ```

/// Messages to WebSocket Actor
#[derive(Debug)]
pub enum WsMsg {
    /// Tell clients to refetch or reload
    Reload { reason: String },
    /// Reload or build error (display overlay, no reload)
    Error { path: String, error: String },
    /// Clear error overlay (the next reload or build succeeded)
    ClearError,
    /// Add client (handshake happens in the actor)
    AddClient(std::net::TcpStream),
    /// Shutdown
    Shutdown,
}
