//! Command-line interface definitions.

use clap::{ColorChoice, Parser};
use std::path::PathBuf;

/// Live-editing dev server: watches a file and serves it as an editable document
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// File to watch and edit
    #[arg(value_name = "FILE_PATH", value_hint = clap::ValueHint::FilePath)]
    pub file_path: PathBuf,

    /// Rebuild the front-end at startup and whenever the project changes
    #[arg(short, long)]
    pub debug: bool,

    /// Config file path (default: dungeon.toml, optional)
    #[arg(short = 'C', long, default_value = "dungeon.toml", value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// Enable verbose output for debugging
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// Control colored output (auto, always, never)
    #[arg(long, default_value = "auto")]
    pub color: ColorChoice,
}

impl Cli {
    /// Parse process arguments.
    ///
    /// Help and version exit normally; any usage error prints the message to
    /// stdout and exits with status 1.
    pub fn parse_or_usage() -> Self {
        match Self::try_parse() {
            Ok(cli) => cli,
            Err(e) if !e.use_stderr() => e.exit(),
            Err(e) => {
                println!("{}", e.render());
                std::process::exit(1);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_positional_only() {
        let cli = Cli::try_parse_from(["dungeon", "notes.md"]).unwrap();
        assert_eq!(cli.file_path, PathBuf::from("notes.md"));
        assert!(!cli.debug);
        assert_eq!(cli.config, PathBuf::from("dungeon.toml"));
    }

    #[test]
    fn test_debug_flag_short_and_long() {
        let short = Cli::try_parse_from(["dungeon", "-d", "notes.md"]).unwrap();
        let long = Cli::try_parse_from(["dungeon", "notes.md", "--debug"]).unwrap();
        assert!(short.debug);
        assert!(long.debug);
    }

    #[test]
    fn test_missing_positional_is_error() {
        assert!(Cli::try_parse_from(["dungeon", "--debug"]).is_err());
    }

    #[test]
    fn test_extra_positional_is_error() {
        assert!(Cli::try_parse_from(["dungeon", "a.md", "b.md"]).is_err());
    }

    #[test]
    fn test_command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_verbose_and_version_flags_coexist() {
        let cli = Cli::try_parse_from(["dungeon", "-v", "notes.md"]).unwrap();
        assert!(cli.verbose);

        let err = Cli::try_parse_from(["dungeon", "-V"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayVersion);
    }
}
