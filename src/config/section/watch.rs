//! `[watch]` section configuration.
//!
//! ```toml
//! [watch]
//! min_interval_ms = 100   # Minimum spacing between two callbacks of one watcher
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// File watcher settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    /// Minimum interval between two callbacks, in milliseconds.
    pub min_interval_ms: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            min_interval_ms: 100,
        }
    }
}

impl WatchConfig {
    pub const fn min_interval(&self) -> Duration {
        Duration::from_millis(self.min_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_parse_config;

    #[test]
    fn test_watch_config_default() {
        let config = test_parse_config("");
        assert_eq!(config.watch.min_interval(), Duration::from_millis(100));
    }

    #[test]
    fn test_watch_config_custom() {
        let config = test_parse_config("[watch]\nmin_interval_ms = 250");
        assert_eq!(config.watch.min_interval_ms, 250);
    }
}
