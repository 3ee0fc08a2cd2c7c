//! Library interface for the `stackctl` CLI.
//!
//! This crate exposes the CLI's argument parser and command structure as a library,
//! primarily for documentation generation and testing. The actual entry point is
//! in `main.rs`.
//!
//! # Structure
//!
//! - [`Cli`] - The root argument parser (clap derive)
//! - [`Commands`] - Available subcommands
//! - [`commands`] - Command implementations
//! - [`terminal`] - Interactive prompts and progress output
//!
//! # Documentation Generation
//!
//! The [`command()`] function returns the clap `Command` for generating man pages
//! and shell completions via `xtask`.

pub mod commands;

pub mod terminal;

use clap::{CommandFactory, Parser, Subcommand};
use std::path::PathBuf;

/// Color output preference.
#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
pub enum ColorChoice {
    /// Detect terminal capabilities automatically.
    #[default]
    Auto,
    /// Always emit colors.
    Always,
    /// Never emit colors.
    Never,
}

impl ColorChoice {
    /// Configure global color output based on this choice.
    ///
    /// Call this once at startup to set the color mode.
    pub fn apply(self) {
        match self {
            Self::Auto => {} // owo-colors auto-detects by default
            Self::Always => owo_colors::set_override(true),
            Self::Never => owo_colors::set_override(false),
        }
    }
}

const ENV_HELP: &str = "\
ENVIRONMENT VARIABLES:
    RUST_LOG              Log filter (e.g., debug, stackctl=trace)
    STACKCTL_LOG_PATH     Explicit log file path
    STACKCTL_LOG_DIR      Log directory
";
/// Command-line interface definition for stackctl.
#[derive(Parser)]
#[command(name = "stackctl")]
#[command(
    about = "Launch Docker Compose services, Makefile targets and project commands from one menu",
    long_about = None
)]
#[command(version)]
#[command(after_long_help = ENV_HELP)]
pub struct Cli {
    /// The subcommand to execute (opens the launcher menu when omitted).
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Path to configuration file (overrides discovery)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Run as if started in DIR
    #[arg(short = 'C', long, global = true)]
    pub chdir: Option<PathBuf>,

    /// Only print errors (suppresses warnings/info)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// More detail (repeatable; e.g. -vv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Colorize output
    #[arg(long, global = true, value_enum, default_value_t)]
    pub color: ColorChoice,

    /// Output as JSON (for scripting)
    #[arg(long, global = true)]
    pub json: bool,
}

/// Available subcommands for the CLI.
#[derive(Subcommand)]
pub enum Commands {
    /// Select Docker Compose services to start
    Compose(commands::compose::ComposeArgs),

    /// Select Makefile targets to run
    Make(commands::make::MakeArgs),

    /// Run a configured command
    Run(commands::run::RunArgs),

    /// Diagnose configuration and environment
    Doctor(commands::doctor::DoctorArgs),

    /// Show package information
    Info(commands::info::InfoArgs),
}

/// Returns the clap command for documentation generation
pub fn command() -> clap::Command {
    Cli::command()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        command().debug_assert();
    }

    #[test]
    fn no_subcommand_opens_launcher() {
        let cli = Cli::try_parse_from(["stackctl"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn run_accepts_path_and_raw() {
        let cli = Cli::try_parse_from(["stackctl", "run", "db", "migrate"]).unwrap();
        let Some(Commands::Run(args)) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.path, ["db", "migrate"]);

        assert!(Cli::try_parse_from(["stackctl", "run", "db", "--raw", "echo hi"]).is_err());
    }
}
