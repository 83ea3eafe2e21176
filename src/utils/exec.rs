//! Running the front-end build command.
//!
//! Output is captured, chatter lines are dropped, and whatever is left gets
//! logged under the program's name. A failing command becomes an error that
//! carries its (ANSI-stripped) output, ready for the status line and the
//! browser overlay.
//!
//! ```ignore
//! Cmd::from_slice(&["elm", "make", "src/Main.elm"])
//!     .cwd(front_dir)
//!     .envs([("DUNGEON_OUTPUT_DIR", out)])
//!     .quiet(COMPILER_CHATTER)
//!     .run()?;
//! ```

use std::borrow::Cow;
use std::ffi::{OsStr, OsString};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::LazyLock;
use std::thread;

use anyhow::{Context, Result, bail};
use portable_pty::{CommandBuilder, NativePtySystem, PtySize, PtySystem};
use regex::Regex;

/// Elm progress lines that carry nothing on success.
pub const COMPILER_CHATTER: &[&str] = &["Compiling ...", "Success!", "Dependencies ready!"];

#[derive(Default)]
pub struct Cmd {
    program: OsString,
    args: Vec<OsString>,
    cwd: Option<PathBuf>,
    envs: Vec<(String, String)>,
    pty: bool,
    quiet: &'static [&'static str],
}

impl Cmd {
    pub fn new(program: impl AsRef<OsStr>) -> Self {
        Self {
            program: program.as_ref().to_owned(),
            ..Self::default()
        }
    }

    /// First element is the program, the rest are arguments.
    pub fn from_slice<S: AsRef<OsStr>>(argv: &[S]) -> Self {
        match argv.split_first() {
            Some((program, rest)) => Self::new(program).args(rest),
            None => Self::default(),
        }
    }

    /// Empty arguments are dropped, so unset variables don't leave `""` behind.
    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        let arg = arg.as_ref();
        if !arg.is_empty() {
            self.args.push(arg.to_owned());
        }
        self
    }

    pub fn args<I, S>(self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        args.into_iter().fold(self, |cmd, arg| cmd.arg(arg))
    }

    pub fn cwd(mut self, dir: impl AsRef<Path>) -> Self {
        self.cwd = Some(dir.as_ref().to_owned());
        self
    }

    pub fn envs<K, V, I>(mut self, vars: I) -> Self
    where
        K: AsRef<str>,
        V: AsRef<str>,
        I: IntoIterator<Item = (K, V)>,
    {
        self.envs.extend(
            vars.into_iter()
                .map(|(k, v)| (k.as_ref().to_owned(), v.as_ref().to_owned())),
        );
        self
    }

    /// Run under a pseudo-terminal so the compiler keeps its colors.
    pub fn pty(mut self, enable: bool) -> Self {
        self.pty = enable;
        self
    }

    /// Line prefixes left out of the log.
    pub fn quiet(mut self, prefixes: &'static [&'static str]) -> Self {
        self.quiet = prefixes;
        self
    }

    /// Run to completion and return everything it printed.
    pub fn run(self) -> Result<String> {
        let name = self.program.to_string_lossy().into_owned();
        let (success, output) = if self.pty {
            self.capture_pty(&name)?
        } else {
            self.capture(&name)?
        };

        let output = strip_ansi(&output).into_owned();
        if !success {
            bail!("`{name}` failed\n{}", output.trim_end());
        }

        let shown = visible_lines(&output, self.quiet);
        if !shown.is_empty() {
            crate::log!(&name; "{}", shown.join("\n"));
        }
        Ok(output)
    }

    fn capture(&self, name: &str) -> Result<(bool, String)> {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args).envs(self.envs.iter().cloned());
        if let Some(dir) = &self.cwd {
            cmd.current_dir(dir);
        }

        let out = cmd.output().with_context(|| format!("cannot start `{name}`"))?;
        let mut text = String::from_utf8_lossy(&out.stdout).into_owned();
        text.push_str(&String::from_utf8_lossy(&out.stderr));
        Ok((out.status.success(), text))
    }

    fn capture_pty(&self, name: &str) -> Result<(bool, String)> {
        let mut builder = CommandBuilder::new(&self.program);
        builder.args(&self.args);
        for (k, v) in &self.envs {
            builder.env(k, v);
        }
        if let Some(dir) = &self.cwd {
            builder.cwd(dir);
        }

        let pair = NativePtySystem::default().openpty(PtySize {
            rows: 24,
            cols: 100,
            pixel_width: 0,
            pixel_height: 0,
        })?;
        let mut child = pair
            .slave
            .spawn_command(builder)
            .with_context(|| format!("cannot start `{name}`"))?;
        drop(pair.slave);

        // reads block until the child closes its end
        let mut reader = pair.master.try_clone_reader()?;
        let drain = thread::spawn(move || {
            let mut text = String::new();
            let _ = reader.read_to_string(&mut text);
            text
        });

        let status = child.wait()?;
        drop(pair.master);
        let text = drain
            .join()
            .map_err(|_| anyhow::anyhow!("output reader for `{name}` panicked"))?;

        Ok((status.success(), text))
    }
}

fn visible_lines<'a>(output: &'a str, quiet: &[&str]) -> Vec<&'a str> {
    output
        .lines()
        .map(str::trim_end)
        .filter(|line| !is_quiet(line.trim_start(), quiet))
        .collect()
}

fn is_quiet(line: &str, quiet: &[&str]) -> bool {
    line.is_empty() || quiet.iter().any(|prefix| line.starts_with(prefix))
}

fn strip_ansi(s: &str) -> Cow<'_, str> {
    static ESCAPES: LazyLock<Option<Regex>> =
        LazyLock::new(|| Regex::new(r"\x1b\[[0-9;?]*[A-Za-z]").ok());
    match ESCAPES.as_ref() {
        Some(re) => re.replace_all(s, ""),
        None => Cow::Borrowed(s),
    }
}
