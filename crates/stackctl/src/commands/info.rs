//! Info command: show package, configuration, and release information.

use clap::Args;
use owo_colors::OwoColorize;
use serde::Serialize;
use tracing::{debug, instrument, warn};

use camino::Utf8PathBuf;
use stackctl_core::config::Config;
use stackctl_core::update::{self, UpdateStatus};

/// Arguments for the `info` subcommand.
#[derive(Args, Debug, Default)]
pub struct InfoArgs {
    /// Skip the crates.io lookup for newer releases
    #[arg(long)]
    pub offline: bool,
}

#[derive(Serialize)]
struct PackageInfo {
    name: &'static str,
    version: &'static str,
    #[serde(skip_serializing_if = "str::is_empty")]
    description: &'static str,
    #[serde(skip_serializing_if = "str::is_empty")]
    repository: &'static str,
    #[serde(skip_serializing_if = "str::is_empty")]
    homepage: &'static str,
    #[serde(skip_serializing_if = "str::is_empty")]
    license: &'static str,
}

impl PackageInfo {
    const fn new() -> Self {
        Self {
            name: env!("CARGO_PKG_NAME"),
            version: env!("CARGO_PKG_VERSION"),
            description: env!("CARGO_PKG_DESCRIPTION"),
            repository: env!("CARGO_PKG_REPOSITORY"),
            homepage: env!("CARGO_PKG_HOMEPAGE"),
            license: env!("CARGO_PKG_LICENSE"),
        }
    }
}

#[derive(Serialize)]
struct ConfigInfo {
    /// Highest-precedence config file
    #[serde(skip_serializing_if = "Option::is_none")]
    config_file: Option<String>,
    /// Every file merged, lowest precedence first
    sources: Vec<String>,
    log_level: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    log_dir: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    docker_compose_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    makefile_path: Option<String>,
    commands: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sso_session: Option<String>,
}

impl ConfigInfo {
    fn from_config(config: &Config, sources: &[Utf8PathBuf]) -> Self {
        Self {
            config_file: sources.last().map(|p| p.to_string()),
            sources: sources.iter().map(|p| p.to_string()).collect(),
            log_level: config.log_level.as_str().to_string(),
            log_dir: config.log_dir.as_ref().map(|p| p.to_string()),
            name: config.options.name.clone(),
            docker_compose_path: config.compose_file().map(|p| p.to_string()),
            makefile_path: config.makefile().map(|p| p.to_string()),
            commands: config.commands.names().map(str::to_string).collect(),
            sso_session: config.sso().map(|sso| sso.session.clone()),
        }
    }
}

/// Result of the release lookup.
#[derive(Serialize)]
#[serde(untagged)]
enum ReleaseInfo {
    Checked(UpdateStatus),
    Unavailable { error: String },
}

#[derive(Serialize)]
struct FullInfo {
    #[serde(flatten)]
    package: PackageInfo,
    config: ConfigInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    release: Option<ReleaseInfo>,
}

fn check_release() -> ReleaseInfo {
    match update::check(env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")) {
        Ok(status) => ReleaseInfo::Checked(status),
        Err(e) => {
            warn!(error = %e, "release check failed");
            ReleaseInfo::Unavailable {
                error: e.to_string(),
            }
        }
    }
}

/// Print package information.
///
/// # Arguments
/// * `global_json` - Global `--json` flag from CLI
/// * `config` - Loaded configuration
/// * `sources` - Config files `config` was merged from
#[instrument(name = "cmd_info", skip_all, fields(json_output))]
pub fn cmd_info(
    args: InfoArgs,
    global_json: bool,
    config: &Config,
    sources: &[Utf8PathBuf],
) -> anyhow::Result<()> {
    debug!(json_output = global_json, offline = args.offline, "executing info command");

    let full_info = FullInfo {
        package: PackageInfo::new(),
        config: ConfigInfo::from_config(config, sources),
        release: (!args.offline).then(check_release),
    };

    if global_json {
        println!("{}", serde_json::to_string_pretty(&full_info)?);
        return Ok(());
    }

    println!(
        "{} {}",
        full_info.package.name.bold(),
        full_info.package.version.green()
    );
    if !full_info.package.description.is_empty() {
        println!("{}", full_info.package.description);
    }
    if !full_info.package.license.is_empty() {
        println!("{}: {}", "License".dimmed(), full_info.package.license);
    }
    if !full_info.package.repository.is_empty() {
        println!(
            "{}: {}",
            "Repository".dimmed(),
            full_info.package.repository.cyan()
        );
    }
    if !full_info.package.homepage.is_empty() {
        println!(
            "{}: {}",
            "Homepage".dimmed(),
            full_info.package.homepage.cyan()
        );
    }

    match full_info.release {
        Some(ReleaseInfo::Checked(UpdateStatus::UpToDate)) => {
            println!("{}: {}", "Release".dimmed(), "up to date".green());
        }
        Some(ReleaseInfo::Checked(UpdateStatus::Outdated { ref latest })) => {
            println!(
                "{}: {} {}",
                "Release".dimmed(),
                "update available:".yellow(),
                latest.to_string().green().bold()
            );
        }
        Some(ReleaseInfo::Checked(UpdateStatus::Ahead)) => {
            println!("{}: {}", "Release".dimmed(), "newer than latest release".cyan());
        }
        Some(ReleaseInfo::Unavailable { .. }) => {
            println!("{}: {}", "Release".dimmed(), "unavailable".yellow());
        }
        None => {}
    }

    // Configuration section
    let cfg = &full_info.config;
    println!();
    println!("{}", "Configuration".bold().underline());
    if cfg.sources.is_empty() {
        println!("{}: {}", "Config file".dimmed(), "none loaded".yellow());
    }
    for path in &cfg.sources {
        println!("{}: {}", "Config file".dimmed(), path.cyan());
    }
    if let Some(ref name) = cfg.name {
        println!("{}: {}", "Name".dimmed(), name);
    }
    println!("{}: {}", "Log level".dimmed(), cfg.log_level);
    if let Some(ref dir) = cfg.log_dir {
        println!("{}: {}", "Log directory".dimmed(), dir);
    }
    print_path("Docker Compose file", cfg.docker_compose_path.as_deref());
    print_path("Makefile", cfg.makefile_path.as_deref());
    if cfg.commands.is_empty() {
        println!("{}: {}", "Commands".dimmed(), "none".yellow());
    } else {
        println!("{}: {}", "Commands".dimmed(), cfg.commands.join(", "));
    }
    if let Some(ref session) = cfg.sso_session {
        println!("{}: {}", "AWS SSO session".dimmed(), session.cyan());
    }

    Ok(())
}

fn print_path(label: &str, path: Option<&str>) {
    match path {
        Some(path) => println!("{}: {}", label.dimmed(), path.cyan()),
        None => println!("{}: {}", label.dimmed(), "not configured".yellow()),
    }
}
