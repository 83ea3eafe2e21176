//! Reload Message Protocol
//!
//! JSON messages pushed over WebSocket from the server to browser clients.
//!
//! # Message Types
//!
//! - `connected`: Sent once after the handshake
//! - `reload`: Document reloaded or front-end rebuilt; refetch or reload
//! - `error`: Reload or build failed (display overlay, keep current state)
//! - `clear_error`: The failure was resolved

use serde::{Deserialize, Serialize};

/// Reload message sent over WebSocket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ReloadMessage {
    /// Connection established
    Connected {
        /// Server version for compatibility check
        version: String,
    },

    /// Something the page shows changed
    Reload {
        #[serde(skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },

    /// Reload or build error
    Error {
        /// File (or stage) that failed
        path: String,
        error: String,
    },

    /// Clear error overlay
    #[serde(rename = "clear_error")]
    ClearError,
}

impl ReloadMessage {
    pub fn connected() -> Self {
        Self::Connected {
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    pub fn reload_with_reason(reason: impl Into<String>) -> Self {
        Self::Reload {
            reason: Some(reason.into()),
        }
    }

    pub fn error(path: impl Into<String>, error: impl Into<String>) -> Self {
        Self::Error {
            path: path.into(),
            error: error.into(),
        }
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| r#"{"type":"reload"}"#.to_string())
    }

    /// Parse from JSON string
    #[cfg(test)]
    pub fn from_json(s: &str) -> Option<Self> {
        serde_json::from_str(s).ok()
    }
}
