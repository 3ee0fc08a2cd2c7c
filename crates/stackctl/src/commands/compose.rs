//! Compose command: pick Docker Compose services and start them.

use clap::Args;
use stackctl_core::config::Config;
use stackctl_core::{Launcher, SystemRunner};
use tracing::instrument;

use crate::terminal::TerminalOperator;

/// Arguments for the `compose` subcommand.
#[derive(Args, Debug, Default)]
pub struct ComposeArgs {
    // No subcommand-specific arguments; the file comes from dockerComposePath
}

/// Run the Compose selector.
#[instrument(name = "cmd_compose", skip_all)]
pub fn cmd_compose(_args: ComposeArgs, config: &Config, quiet: bool, json: bool) -> anyhow::Result<()> {
    let quiet = quiet || json;
    super::print_banner(config, quiet);
    let mut operator = TerminalOperator::new(quiet);
    let mut launcher = Launcher::new(config, &SystemRunner, &mut operator);
    super::finish(launcher.compose(), json)?;
    Ok(())
}
