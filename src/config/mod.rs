//! Configuration management for `dungeon.toml`.
//!
//! The config file is optional; every field has a default and a missing file
//! means "all defaults, rooted at the current directory".
//!
//! # Sections
//!
//! | Section   | Purpose                                           |
//! |-----------|---------------------------------------------------|
//! | `[serve]` | HTTP server, reload push, write-back              |
//! | `[watch]` | Debounce interval shared by all watchers          |
//! | `[build]` | Front-end project rebuilt in `--debug` mode       |

mod error;
pub mod section;

pub use error::ConfigError;
pub use section::{BuildConfig, ServeConfig, WatchConfig};

use crate::{
    cli::Cli,
    log,
    utils::path::{expand_path, normalize_path},
};
use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Root configuration structure representing dungeon.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DungeonConfig {
    /// Absolute path to the config file (internal use only)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Directory relative paths resolve against (internal use only)
    #[serde(skip)]
    pub root: PathBuf,

    /// Absolute path of the watched document file (from the CLI)
    #[serde(skip)]
    pub target: PathBuf,

    /// Rebuild the front-end and watch the project (from the CLI)
    #[serde(skip)]
    pub debug: bool,

    /// Development server settings
    #[serde(default)]
    pub serve: ServeConfig,

    /// Watcher settings
    #[serde(default)]
    pub watch: WatchConfig,

    /// Front-end build settings
    #[serde(default)]
    pub build: BuildConfig,
}

impl DungeonConfig {
    /// Load configuration from CLI arguments.
    ///
    /// A relative `--config` path resolves against the current directory; the
    /// project root is the config file's parent directory.
    pub fn load(cli: &Cli) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current working directory")?;
        let config_path = expand_path(&cli.config, &cwd);

        let mut config = if config_path.is_file() {
            Self::from_path(&config_path)?
        } else {
            crate::debug!("config"; "{} not found, using defaults", config_path.display());
            Self::default()
        };

        let root = config_path.parent().map_or(cwd.clone(), Path::to_path_buf);
        config.config_path = config_path;
        config.finalize(&root, cli, &cwd);
        config.validate()?;

        Ok(config)
    }

    /// Parse configuration from TOML string
    #[cfg(test)]
    pub fn from_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(ConfigError::Toml)?;
        Ok(config)
    }

    /// Load configuration from file path, warning about unknown fields.
    fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content)?;
        if !ignored.is_empty() {
            Self::print_unknown_fields_warning(&ignored, path);
        }

        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>)> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })
        .map_err(ConfigError::Toml)?;
        Ok((config, ignored))
    }

    fn print_unknown_fields_warning(fields: &[String], path: &Path) {
        let display_path = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| path.to_string_lossy());
        log!("warning"; "unknown fields in {}, ignoring: {}", display_path, fields.join(", "));
    }

    /// Resolve paths and apply CLI options.
    fn finalize(&mut self, root: &Path, cli: &Cli, cwd: &Path) {
        self.root = normalize_path(root);
        self.normalize_paths();

        self.target = normalize_path(&expand_path(&cli.file_path, cwd));
        self.debug = cli.debug;
    }

    /// Make every `[build]` path absolute.
    ///
    /// `root` resolves against the config directory, the rest against `root`.
    fn normalize_paths(&mut self) {
        let build = &mut self.build;
        build.root = normalize_path(&expand_path(&build.root, &self.root));
        build.front = normalize_path(&expand_path(&build.front, &build.root));
        build.output = normalize_path(&expand_path(&build.output, &build.root));
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        let serve = &self.serve;
        if serve.workers == 0 {
            bail!(ConfigError::Validation("serve.workers must be at least 1".into()));
        }
        if serve.max_body_bytes == 0 {
            bail!(ConfigError::Validation("serve.max_body_bytes must be positive".into()));
        }
        if serve.push && serve.port == serve.ws_port && serve.port != 0 {
            bail!(ConfigError::Validation(format!(
                "serve.port and serve.ws_port are both {}",
                serve.port
            )));
        }
        if self.debug && self.build.command.is_empty() {
            bail!(ConfigError::Validation(
                "build.command is empty, nothing to run in debug mode".into()
            ));
        }
        if self.build.page.is_absolute() {
            bail!(ConfigError::Validation(format!(
                "build.page `{}` must be relative to build.output",
                self.build.page.display()
            )));
        }
        Ok(())
    }
}

/// Parse a config snippet, failing the test on unknown fields.
#[cfg(test)]
pub fn test_parse_config(content: &str) -> DungeonConfig {
    let (parsed, ignored) = DungeonConfig::parse_with_ignored(content).unwrap();
    assert!(
        ignored.is_empty(),
        "test config has unknown fields: {:?}",
        ignored
    );
    parsed
}
