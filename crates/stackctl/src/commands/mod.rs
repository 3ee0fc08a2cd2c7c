//! Command implementations

pub mod compose;

pub mod doctor;

pub mod info;

pub mod launch;

pub mod make;

pub mod run;

use anyhow::Context;
use owo_colors::OwoColorize;
use serde::Serialize;
use stackctl_core::config::Config;
use stackctl_core::{LaunchResult, Outcome};
use tracing::debug;

/// Print the `options.name` banner ahead of interactive menus.
pub fn print_banner(config: &Config, quiet: bool) {
    if quiet {
        return;
    }
    if let Some(name) = config.options.name.as_deref() {
        println!("{}", name.bold().cyan());
        println!();
    }
}

/// Turn a launcher result into the command result.
///
/// Cancellation ends the command quietly. With `--json`, finished reports are
/// printed to stdout.
pub fn finish<T: Serialize>(result: LaunchResult<Outcome<T>>, json: bool) -> anyhow::Result<Option<T>> {
    match result.context("launcher action failed")? {
        Outcome::Finished(report) => {
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            }
            Ok(Some(report))
        }
        Outcome::Skipped => {
            debug!("nothing to do");
            Ok(None)
        }
        Outcome::Cancelled => {
            debug!("cancelled by operator");
            Ok(None)
        }
    }
}
