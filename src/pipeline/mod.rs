//! Front-end build pipeline.
//!
//! ```text
//! build:  mkdir <staging> -> copy <root>/<copy...> -> (cd <front> && <command>)
//!         -> <output> becomes <previous>, <staging> becomes <output>
//! ```
//!
//! The output being served is only replaced once a build has fully
//! succeeded; a failed build leaves it exactly as it was.
//!
//! `$DUNGEON_OUTPUT_DIR` (the staging directory) and `$DUNGEON_ROOT` are
//! substituted in command arguments and exported to the command's
//! environment.

mod error;

pub use error::BuildError;

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use crate::config::BuildConfig;
use crate::utils::exec::{COMPILER_CHATTER, Cmd};

type Result<T> = std::result::Result<T, BuildError>;

/// Runs the configured front-end build. One build at a time.
pub struct BuildPipeline {
    config: BuildConfig,
    running: Mutex<()>,
}

impl BuildPipeline {
    pub fn new(config: BuildConfig) -> Self {
        Self {
            config,
            running: Mutex::new(()),
        }
    }

    /// Absolute path of the page served at `/`.
    pub fn page_path(&self) -> PathBuf {
        self.config.page_path()
    }

    pub fn output_dir(&self) -> &Path {
        &self.config.output
    }

    /// Whether a previous build left the served page behind.
    pub fn has_output(&self) -> bool {
        self.page_path().is_file()
    }

    /// Directories the build writes besides the output itself.
    pub fn scratch_dirs(&self) -> [PathBuf; 2] {
        [self.staging_dir(), self.previous_dir()]
    }

    /// Remove the output directory. A missing directory is not an error.
    #[cfg(test)]
    pub fn clean(&self) -> Result<()> {
        let _running = self.running.lock();
        remove_dir(&self.config.output)
    }

    /// Build from scratch and publish the result as the new output.
    pub fn build(&self) -> Result<()> {
        let _running = self.running.lock();
        let staging = self.staging_dir();
        remove_dir(&staging)?;

        if let Err(e) = self.build_into(&staging) {
            if let Err(cleanup) = remove_dir(&staging) {
                crate::debug!("build"; "{}", cleanup);
            }
            return Err(e);
        }
        self.publish(&staging)
    }

    fn build_into(&self, dir: &Path) -> Result<()> {
        fs::create_dir_all(dir).map_err(|e| BuildError::Copy(dir.to_path_buf(), e))?;

        for file in &self.config.copy {
            self.copy_file(file, dir)?;
        }

        if self.config.command.is_empty() {
            return Ok(());
        }
        self.run_command(dir)
    }

    /// Swap the finished staging directory in place of the output.
    fn publish(&self, staging: &Path) -> Result<()> {
        let output = &self.config.output;
        let previous = self.previous_dir();
        remove_dir(&previous)?;

        let had_output = output.exists();
        if had_output {
            fs::rename(output, &previous).map_err(|e| BuildError::Publish(output.clone(), e))?;
        }
        if let Err(e) = fs::rename(staging, output) {
            if had_output {
                let _ = fs::rename(&previous, output);
            }
            return Err(BuildError::Publish(output.clone(), e));
        }
        crate::debug!("build"; "published {}", output.display());
        remove_dir(&previous)
    }

    fn staging_dir(&self) -> PathBuf {
        sibling(&self.config.output, "staging")
    }

    fn previous_dir(&self) -> PathBuf {
        sibling(&self.config.output, "previous")
    }

    fn copy_file(&self, file: &Path, dir: &Path) -> Result<()> {
        let from = self.config.root.join(file);
        let to = dir.join(file);
        if let Some(parent) = to.parent() {
            fs::create_dir_all(parent).map_err(|e| BuildError::Copy(from.clone(), e))?;
        }
        fs::copy(&from, &to).map_err(|e| BuildError::Copy(from.clone(), e))?;
        crate::debug!("build"; "copied {}", file.display());
        Ok(())
    }

    fn run_command(&self, dir: &Path) -> Result<()> {
        let vars = self.vars(dir);
        let args = resolve_args(&self.config.command, &vars);
        let program = &args[0];

        which::which_in(program, std::env::var_os("PATH"), &self.config.front)
            .map_err(|_| BuildError::MissingProgram(program.clone()))?;

        crate::log!("build"; "`{}` running", args.join(" "));
        Cmd::from_slice(&args)
            .cwd(&self.config.front)
            .envs(&vars)
            .pty(self.config.pty)
            .quiet(COMPILER_CHATTER)
            .run()
            .map_err(BuildError::Command)?;
        Ok(())
    }

    /// `$DUNGEON_*` variables for a build writing into `dir`.
    fn vars(&self, dir: &Path) -> FxHashMap<String, String> {
        let mut vars = FxHashMap::default();
        vars.insert("DUNGEON_OUTPUT_DIR".into(), dir.display().to_string());
        vars.insert(
            "DUNGEON_ROOT".into(),
            self.config.root.display().to_string(),
        );
        vars
    }
}

/// `<parent>/.<output name>.<suffix>`
fn sibling(output: &Path, suffix: &str) -> PathBuf {
    let name = output
        .file_name()
        .map_or_else(|| "build".into(), |n| n.to_string_lossy());
    output.with_file_name(format!(".{name}.{suffix}"))
}

/// Remove a directory tree. A missing directory is not an error.
fn remove_dir(dir: &Path) -> Result<()> {
    match fs::remove_dir_all(dir) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(BuildError::Clean(dir.to_path_buf(), e)),
    }
}

/// Replace `$KEY` occurrences with values from `vars`.
fn resolve_args(args: &[String], vars: &FxHashMap<String, String>) -> Vec<String> {
    args.iter()
        .map(|arg| {
            vars.iter().fold(arg.clone(), |acc, (key, value)| {
                acc.replace(&format!("${key}"), value)
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn project(command: &[&str]) -> (TempDir, BuildPipeline) {
        let dir = TempDir::new().unwrap();
        let root = dir.path().to_path_buf();
        fs::create_dir_all(root.join("front")).unwrap();
        fs::write(root.join("index.html"), "<html></html>").unwrap();

        let config = BuildConfig {
            root: root.clone(),
            front: root.join("front"),
            output: root.join("build"),
            command: command.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        };
        (dir, BuildPipeline::new(config))
    }

    #[test]
    fn test_resolve_args() {
        let mut vars = FxHashMap::default();
        vars.insert("DUNGEON_OUTPUT_DIR".into(), "/out".into());
        vars.insert("DUNGEON_ROOT".into(), "/root".into());

        let args = vec![
            "elm".into(),
            "--output=$DUNGEON_OUTPUT_DIR/elm.js".into(),
            "$DUNGEON_ROOT/a $DUNGEON_OUTPUT_DIR/b".into(),
        ];
        let resolved = resolve_args(&args, &vars);
        assert_eq!(resolved[0], "elm");
        assert_eq!(resolved[1], "--output=/out/elm.js");
        assert_eq!(resolved[2], "/root/a /out/b");
    }

    #[test]
    fn test_scratch_dirs_are_hidden_siblings() {
        let (dir, pipeline) = project(&[]);
        let [staging, previous] = pipeline.scratch_dirs();
        assert_eq!(staging, dir.path().join(".build.staging"));
        assert_eq!(previous, dir.path().join(".build.previous"));
    }

    #[test]
    fn test_build_copies_files_without_command() {
        let (_dir, pipeline) = project(&[]);
        assert!(!pipeline.has_output());

        pipeline.build().unwrap();

        assert!(pipeline.has_output());
        assert_eq!(fs::read_to_string(pipeline.page_path()).unwrap(), "<html></html>");
        for scratch in pipeline.scratch_dirs() {
            assert!(!scratch.exists());
        }
    }

    #[test]
    fn test_clean_missing_output_is_ok() {
        let (_dir, pipeline) = project(&[]);
        pipeline.clean().unwrap();
        pipeline.build().unwrap();
        pipeline.clean().unwrap();
        assert!(!pipeline.output_dir().exists());
    }

    #[test]
    fn test_build_drops_stale_files() {
        let (_dir, pipeline) = project(&[]);
        pipeline.build().unwrap();
        let stale = pipeline.output_dir().join("stale.js");
        fs::write(&stale, "old").unwrap();

        pipeline.build().unwrap();

        assert!(!stale.exists());
        assert!(pipeline.has_output());
    }

    #[test]
    fn test_missing_copy_source() {
        let (dir, pipeline) = project(&[]);
        fs::remove_file(dir.path().join("index.html")).unwrap();
        assert!(matches!(pipeline.build(), Err(BuildError::Copy(..))));
        assert!(!pipeline.output_dir().exists());
    }

    #[test]
    fn test_missing_program() {
        let (_dir, pipeline) = project(&["dungeon-no-such-compiler-xyz"]);
        match pipeline.build() {
            Err(BuildError::MissingProgram(name)) => {
                assert_eq!(name, "dungeon-no-such-compiler-xyz");
            }
            other => panic!("expected MissingProgram, got {other:?}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_command_runs_in_front_with_vars() {
        let (_dir, pipeline) = project(&[
            "sh",
            "-c",
            "pwd > \"$DUNGEON_OUTPUT_DIR/cwd.txt\"; echo ok > $DUNGEON_OUTPUT_DIR/elm.js",
        ]);
        pipeline.build().unwrap();

        let out = pipeline.output_dir();
        assert_eq!(fs::read_to_string(out.join("elm.js")).unwrap().trim(), "ok");
        let cwd = fs::read_to_string(out.join("cwd.txt")).unwrap();
        assert!(cwd.trim().ends_with("front"));
    }

    #[cfg(unix)]
    #[test]
    fn test_failing_command() {
        let (_dir, pipeline) = project(&["sh", "-c", "exit 2"]);
        assert!(matches!(pipeline.build(), Err(BuildError::Command(_))));
    }

    #[cfg(unix)]
    #[test]
    fn test_failed_build_keeps_served_output() {
        let (dir, pipeline) = project(&[
            "sh",
            "-c",
            "test -e \"$DUNGEON_ROOT/broken\" && exit 1; echo v1 > $DUNGEON_OUTPUT_DIR/elm.js",
        ]);
        pipeline.build().unwrap();
        let bundle = pipeline.output_dir().join("elm.js");
        assert_eq!(fs::read_to_string(&bundle).unwrap().trim(), "v1");

        fs::write(dir.path().join("broken"), "").unwrap();
        assert!(matches!(pipeline.build(), Err(BuildError::Command(_))));

        assert_eq!(fs::read_to_string(&bundle).unwrap().trim(), "v1");
        assert!(pipeline.has_output());
        for scratch in pipeline.scratch_dirs() {
            assert!(!scratch.exists());
        }
    }
}
