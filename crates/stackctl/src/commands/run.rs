//! Run command: execute a configured command without the root menu.

use anyhow::{Context, bail};
use clap::Args;
use stackctl_core::config::Config;
use stackctl_core::resolver::Resolution;
use stackctl_core::{Launcher, Outcome, SystemRunner};
use tracing::{debug, instrument};

use crate::terminal::TerminalOperator;

/// Arguments for the `run` subcommand.
#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Entry names leading through the command tree (e.g. `db migrate`).
    /// Prompts below a group; opens the top of the tree when omitted.
    #[arg(value_name = "KEY")]
    pub path: Vec<String>,

    /// Run a raw choice instead: a shell command line, or a JSON object of
    /// named commands to choose from
    #[arg(long, value_name = "CHOICE", conflicts_with = "path")]
    pub raw: Option<String>,
}

/// Resolve a configured command (or a raw choice) and run it.
///
/// Exits unsuccessfully when the command it ran failed, so `run` can be used
/// from scripts.
#[instrument(name = "cmd_run", skip_all)]
pub fn cmd_run(args: RunArgs, config: &Config, quiet: bool, json: bool) -> anyhow::Result<()> {
    let mut operator = TerminalOperator::new(quiet || json);
    let mut launcher = Launcher::new(config, &SystemRunner, &mut operator);

    let result = match args.raw {
        Some(ref choice) => launcher.raw(choice),
        None => launcher.commands(&args.path),
    };

    match result.context("launcher action failed")? {
        Outcome::Finished(resolution) => {
            if json {
                println!("{}", serde_json::to_string_pretty(&resolution)?);
            }
            if let Resolution::Executed {
                command,
                succeeded: false,
            } = resolution
            {
                bail!("command failed: {command}");
            }
            Ok(())
        }
        // The reason (unknown entry, invalid choice) was already reported
        Outcome::Skipped => bail!("nothing was run"),
        Outcome::Cancelled => {
            debug!("cancelled by operator");
            Ok(())
        }
    }
}
