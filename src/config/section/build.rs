//! `[build]` section configuration.
//!
//! Describes the front-end project that `--debug` rebuilds.
//!
//! # Example
//!
//! ```toml
//! [build]
//! root = "."                  # Project root, watched in debug mode
//! front = "front"             # Directory the build command runs in
//! output = "build"            # Output directory served by the HTTP server
//! page = "index.html"         # Page served at `/`
//! command = ["elm", "make", "src/Main.elm", "--output=$DUNGEON_OUTPUT_DIR/elm.js"]
//! copy = ["index.html"]       # Files copied from the root into the output
//! pty = false                 # Run the command inside a pseudo-terminal
//! ```
//!
//! `$DUNGEON_OUTPUT_DIR` and `$DUNGEON_ROOT` are substituted in `command`
//! arguments and exported to the command's environment.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Front-end build settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Project root directory.
    pub root: PathBuf,

    /// Front-end directory, relative to `root`.
    pub front: PathBuf,

    /// Output directory, relative to `root`.
    pub output: PathBuf,

    /// Page served at `/`, relative to `output`.
    pub page: PathBuf,

    /// Build command; the first element is the program.
    pub command: Vec<String>,

    /// Files copied from `root` into `output` before the command runs.
    pub copy: Vec<PathBuf>,

    /// Run the build command inside a pseudo-terminal.
    pub pty: bool,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            root: ".".into(),
            front: "front".into(),
            output: "build".into(),
            page: "index.html".into(),
            command: ["elm", "make", "src/Main.elm", "--output=$DUNGEON_OUTPUT_DIR/elm.js"]
                .map(String::from)
                .to_vec(),
            copy: vec!["index.html".into()],
            pty: false,
        }
    }
}

impl BuildConfig {
    /// Absolute path of the page served at `/`.
    pub fn page_path(&self) -> PathBuf {
        self.output.join(&self.page)
    }
}
