//! Terminal output.
//!
//! Two channels share stdout:
//! - `log!` / `debug!` lines, prefixed with a colored `[module]` tag
//!   (`debug!` only with `--verbose`)
//! - the watch status block, rewritten in place after every reload or
//!   rebuild so a long session shows the latest outcome instead of a
//!   scrolling history
//!
//! ```ignore
//! log!("serve"; "http://{}", addr);
//! debug!("watch"; "event {:?}", event.kind);
//! status_success("reloaded notes.md");
//! ```

use std::io::{Write, stdout};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use crossterm::{
    cursor, execute,
    terminal::{Clear, ClearType},
};
use owo_colors::{AnsiColors, OwoColorize};
use parking_lot::Mutex;

static VERBOSE: AtomicBool = AtomicBool::new(false);

pub fn set_verbose(v: bool) {
    VERBOSE.store(v, Ordering::SeqCst);
}

pub fn is_verbose() -> bool {
    VERBOSE.load(Ordering::SeqCst)
}

/// `log!("module"; "format {}", args)`
#[macro_export]
macro_rules! log {
    ($module:expr; $($arg:tt)*) => {{
        $crate::logger::log($module, &format!($($arg)*))
    }};
}

/// Like `log!`, but silent unless `--verbose`.
#[macro_export]
macro_rules! debug {
    ($module:expr; $($arg:tt)*) => {{
        if $crate::logger::is_verbose() {
            $crate::logger::log($module, &format!($($arg)*))
        }
    }};
}

pub fn log(module: &str, message: &str) {
    let tag = module_tag(module);

    let mut out = stdout().lock();
    execute!(out, Clear(ClearType::UntilNewLine)).ok();
    writeln!(out, "{tag} {message}").ok();
    out.flush().ok();
}

fn module_tag(module: &str) -> String {
    format!("[{module}]")
        .color(module_color(module))
        .bold()
        .to_string()
}

fn module_color(module: &str) -> AnsiColors {
    match module {
        "serve" => AnsiColors::BrightBlue,
        "watch" | "reload" => AnsiColors::BrightGreen,
        "build" => AnsiColors::BrightMagenta,
        "error" => AnsiColors::BrightRed,
        "config" => AnsiColors::BrightCyan,
        _ => AnsiColors::BrightYellow,
    }
}

// ============================================================================
// Watch status
// ============================================================================

enum Outcome {
    Ok,
    Failed,
}

/// The status block and how many terminal lines it currently covers.
struct StatusBlock {
    height: usize,
}

static STATUS: Mutex<StatusBlock> = Mutex::new(StatusBlock { height: 0 });

impl StatusBlock {
    fn show(&mut self, outcome: Outcome, text: &str) {
        let mut out = stdout().lock();

        if let Ok(lines) = u16::try_from(self.height)
            && lines > 0
        {
            execute!(out, cursor::MoveUp(lines), Clear(ClearType::FromCursorDown)).ok();
        }

        let mark = match outcome {
            Outcome::Ok => "✓".green().to_string(),
            Outcome::Failed => "✗".red().to_string(),
        };
        let stamp = format!("[{}]", clock(unix_now()));
        writeln!(out, "{} {mark} {text}", stamp.dimmed()).ok();
        out.flush().ok();

        self.height = text.lines().count().max(1);
    }
}

/// Replace the status block with a success line.
pub fn status_success(message: &str) {
    STATUS.lock().show(Outcome::Ok, message);
}

/// Replace the status block with a failure summary and its detail below.
pub fn status_error(summary: &str, detail: &str) {
    STATUS.lock().show(Outcome::Failed, &with_detail(summary, detail));
}

fn with_detail(summary: &str, detail: &str) -> String {
    match detail.trim_end() {
        "" => summary.to_owned(),
        detail => format!("{summary}\n{detail}"),
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_secs())
}

/// `HH:MM:SS` (UTC) of a unix timestamp.
fn clock(secs: u64) -> String {
    let (h, m, s) = ((secs / 3600) % 24, (secs / 60) % 60, secs % 60);
    format!("{h:02}:{m:02}:{s:02}")
}
