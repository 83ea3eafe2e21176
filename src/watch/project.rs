//! Self watch: rebuilds the front-end when the project changes (debug mode).

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use super::{DebouncedWatcher, WatchError, WatchOptions};
use crate::actor::Notifier;
use crate::config::DungeonConfig;
use crate::logger::status_success;
use crate::pipeline::BuildPipeline;
use crate::utils::path::is_temp_file;

/// Directory names never worth a rebuild (VCS, compiler caches).
const IGNORED_DIRS: &[&str] = &[".git", "target", "elm-stuff", "node_modules"];

pub struct SelfWatch {
    _watcher: DebouncedWatcher,
}

impl SelfWatch {
    /// Watch `build.root` recursively and rebuild on every accepted change.
    ///
    /// Build failures are reported and leave the previous output in place.
    pub fn new(
        config: &DungeonConfig,
        pipeline: Arc<BuildPipeline>,
        notifier: Notifier,
    ) -> Result<Self, WatchError> {
        let ignore = IgnoreRules {
            root: config.build.root.clone(),
            output: config.build.output.clone(),
            scratch: pipeline.scratch_dirs(),
            target: config.target.clone(),
        };

        let options = WatchOptions::new("project", &config.build.root, config.watch.min_interval())
            .recursive(true)
            .filter(move |path| !ignore.is_ignored(path));

        let on_fire = Arc::new(move || -> anyhow::Result<()> {
            match pipeline.build() {
                Ok(()) => {
                    status_success("rebuilt front-end");
                    notifier.reload("frontend rebuilt");
                    Ok(())
                }
                Err(e) => {
                    let e = anyhow::Error::from(e);
                    notifier.error("build", format!("{e:#}"));
                    Err(e)
                }
            }
        });

        Ok(Self {
            _watcher: DebouncedWatcher::new(options, on_fire)?,
        })
    }
}

/// Paths under the project root that must not trigger a rebuild.
struct IgnoreRules {
    root: PathBuf,
    output: PathBuf,
    /// Where builds are staged before they replace `output`
    scratch: [PathBuf; 2],
    /// Edited document; it is reloaded, not rebuilt
    target: PathBuf,
}

impl IgnoreRules {
    fn is_ignored(&self, path: &Path) -> bool {
        let generated = path.starts_with(&self.output)
            || self.scratch.iter().any(|dir| path.starts_with(dir));
        if generated || is_temp_file(path) || path == self.target {
            return true;
        }
        let relative = path.strip_prefix(&self.root).unwrap_or(path);
        relative.components().any(|c| match c {
            Component::Normal(name) => IGNORED_DIRS.iter().any(|d| name == *d),
            _ => false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules() -> IgnoreRules {
        IgnoreRules {
            root: "/proj".into(),
            output: "/proj/build".into(),
            scratch: ["/proj/.build.staging".into(), "/proj/.build.previous".into()],
            target: "/proj/notes.md".into(),
        }
    }

    #[test]
    fn test_sources_trigger_rebuild() {
        let rules = rules();
        assert!(!rules.is_ignored(Path::new("/proj/front/src/Main.elm")));
        assert!(!rules.is_ignored(Path::new("/proj/index.html")));
    }

    #[test]
    fn test_output_and_target_ignored() {
        let rules = rules();
        assert!(rules.is_ignored(Path::new("/proj/build/elm.js")));
        assert!(rules.is_ignored(Path::new("/proj/.build.staging/elm.js")));
        assert!(rules.is_ignored(Path::new("/proj/.build.previous/index.html")));
        assert!(rules.is_ignored(Path::new("/proj/notes.md")));
    }

    #[test]
    fn test_cache_dirs_ignored() {
        let rules = rules();
        assert!(rules.is_ignored(Path::new("/proj/.git/index")));
        assert!(rules.is_ignored(Path::new("/proj/target/debug/dungeon")));
        assert!(rules.is_ignored(Path::new("/proj/front/elm-stuff/0.19.1/d.dat")));
    }

    #[test]
    fn test_editor_files_ignored() {
        let rules = rules();
        assert!(rules.is_ignored(Path::new("/proj/front/src/.Main.elm.swp")));
        assert!(rules.is_ignored(Path::new("/proj/front/src/Main.elm~")));
    }
}
