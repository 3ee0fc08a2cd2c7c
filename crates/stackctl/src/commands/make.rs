//! Make command: pick Makefile targets and run them.

use clap::Args;
use stackctl_core::config::Config;
use stackctl_core::{Launcher, SystemRunner};
use tracing::instrument;

use crate::terminal::TerminalOperator;

/// Arguments for the `make` subcommand.
#[derive(Args, Debug, Default)]
pub struct MakeArgs {
    // No subcommand-specific arguments; the file comes from makefilePath
}

/// Run the Makefile selector.
#[instrument(name = "cmd_make", skip_all)]
pub fn cmd_make(_args: MakeArgs, config: &Config, quiet: bool, json: bool) -> anyhow::Result<()> {
    let quiet = quiet || json;
    super::print_banner(config, quiet);
    let mut operator = TerminalOperator::new(quiet);
    let mut launcher = Launcher::new(config, &SystemRunner, &mut operator);
    super::finish(launcher.make(), json)?;
    Ok(())
}
