//! The launcher menu, shown when no subcommand is given.

use stackctl_core::config::Config;
use stackctl_core::{Launcher, SystemRunner};
use tracing::instrument;

use crate::terminal::TerminalOperator;

/// Show the root menu: Docker Compose, Makefile, then the configured commands.
#[instrument(name = "cmd_launch", skip_all)]
pub fn cmd_launch(config: &Config, quiet: bool, json: bool) -> anyhow::Result<()> {
    // Stdout carries only the report under --json
    let quiet = quiet || json;
    super::print_banner(config, quiet);
    let mut operator = TerminalOperator::new(quiet);
    let mut launcher = Launcher::new(config, &SystemRunner, &mut operator);
    super::finish(launcher.launch(), json)?;
    Ok(())
}
