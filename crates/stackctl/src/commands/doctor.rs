//! Doctor command: diagnose configuration and environment.

use camino::{Utf8Path, Utf8PathBuf};
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use inquire::Confirm;
use owo_colors::OwoColorize;
use serde::Serialize;
use stackctl_core::{SystemRunner, exec};
use stackctl_core::actions::{ActionNode, ActionTree};
use stackctl_core::config::{self, Config, LauncherOptions};
use stackctl_core::repo::{RepoStatus, check_repo_freshness};
use tracing::{debug, instrument};

/// External tools the launcher shells out to.
const TOOLS: &[(&str, &str)] = &[
    ("git", "repository freshness check"),
    ("docker", "Docker Compose services"),
    ("make", "Makefile targets"),
    ("aws", "AWS SSO login"),
];

/// Arguments for the `doctor` subcommand.
#[derive(Args, Debug, Default)]
pub struct DoctorArgs {
    /// Skip the freshness check of the configured files' repositories
    #[arg(long)]
    pub no_git: bool,
}

#[derive(Serialize)]
struct DoctorReport {
    config: ConfigStatus,
    files: Vec<FileStatus>,
    commands: usize,
    tools: Vec<ToolStatus>,
    directories: DirectoryPaths,
}

#[derive(Serialize)]
struct ConfigStatus {
    /// Highest-precedence config file, if any
    file: Option<String>,
    /// Every file merged, lowest precedence first
    sources: Vec<String>,
    /// Whether a config file was found
    found: bool,
}

#[derive(Serialize)]
struct FileStatus {
    /// `dockerComposePath` or `makefilePath`
    key: &'static str,
    path: String,
    exists: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    repository: Option<RepoStatus>,
}

#[derive(Serialize)]
struct ToolStatus {
    name: &'static str,
    purpose: &'static str,
    path: Option<String>,
}

#[derive(Serialize)]
struct DirectoryPaths {
    config: Option<String>,
    data_local: Option<String>,
}

impl DoctorReport {
    fn gather(config: &Config, sources: &[Utf8PathBuf], check_git: bool) -> Self {
        let configured = [
            ("dockerComposePath", config.compose_file()),
            ("makefilePath", config.makefile()),
        ];

        let files = configured
            .into_iter()
            .filter_map(|(key, path)| path.map(|p| (key, p)))
            .map(|(key, path)| FileStatus {
                key,
                path: path.to_string(),
                exists: path.is_file(),
                repository: check_git
                    .then(|| check_repo_freshness(&SystemRunner, path, &config.options.git)),
            })
            .collect();

        let tools = TOOLS
            .iter()
            .map(|&(name, purpose)| ToolStatus {
                name,
                purpose,
                path: exec::locate(name).map(|p| p.display().to_string()),
            })
            .collect();

        Self {
            config: ConfigStatus {
                found: !sources.is_empty(),
                file: sources.last().map(|p| p.to_string()),
                sources: sources.iter().map(|p| p.to_string()).collect(),
            },
            files,
            commands: count_commands(&config.commands),
            tools,
            directories: DirectoryPaths {
                config: config::user_config_dir().map(|p| p.to_string()),
                data_local: config::user_data_local_dir().map(|p| p.to_string()),
            },
        }
    }
}

/// Number of runnable leaves in the tree.
fn count_commands(tree: &ActionTree) -> usize {
    tree.iter()
        .map(|(_, node)| match node {
            ActionNode::Leaf(_) => 1,
            ActionNode::Group(group) => count_commands(group),
        })
        .sum()
}

/// Run diagnostics and report configuration status.
///
/// # Arguments
/// * `global_json` - Global `--json` flag from CLI
/// * `config` - Loaded configuration
/// * `sources` - Config files `config` was merged from
/// * `cwd` - Current working directory
#[instrument(name = "cmd_doctor", skip_all, fields(json_output))]
pub fn cmd_doctor(
    args: DoctorArgs,
    global_json: bool,
    config: &Config,
    sources: &[Utf8PathBuf],
    cwd: &Utf8Path,
) -> anyhow::Result<()> {
    debug!(json_output = global_json, "executing doctor command");

    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message("Gathering diagnostics...");
    spinner.enable_steady_tick(std::time::Duration::from_millis(80));

    let report = DoctorReport::gather(config, sources, !args.no_git);
    spinner.finish_and_clear();

    if global_json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("{}", "Configuration".bold().underline());
    if report.config.found {
        for source in &report.config.sources {
            println!("  {} Config file: {}", "✓".green(), source.cyan());
        }
    } else {
        println!("  {} No config file found", "○".yellow());
        offer_config_creation(cwd)?;
    }
    println!("  {}: {}", "Commands".dimmed(), report.commands);
    println!();

    println!("{}", "Files".bold().underline());
    if report.files.is_empty() {
        println!("  {} No dockerComposePath or makefilePath configured", "○".dimmed());
    }
    for file in &report.files {
        if file.exists {
            println!("  {} {}: {}", "✓".green(), file.key.dimmed(), file.path.cyan());
        } else {
            println!("  {} {}: {} (missing)", "✗".red(), file.key.dimmed(), file.path.red());
        }
        if let Some(ref status) = file.repository {
            print_repo_status(status);
        }
    }
    println!();

    println!("{}", "Tools".bold().underline());
    for tool in &report.tools {
        match tool.path {
            Some(ref path) => println!("  {} {} {}", "✓".green(), tool.name.bold(), path.dimmed()),
            None => println!(
                "  {} {} {}",
                "○".yellow(),
                tool.name.bold(),
                format!("not found (needed for {})", tool.purpose).yellow()
            ),
        }
    }
    println!();

    println!("{}", "Directories".bold().underline());
    print_dir("  Config", &report.directories.config);
    print_dir("  Data (local)", &report.directories.data_local);
    println!("  {}: {}", "Working directory".dimmed(), cwd.cyan());

    Ok(())
}

fn print_repo_status(status: &RepoStatus) {
    if status.is_fresh() {
        println!("      {} up to date with its remote", "✓".green());
        return;
    }
    let flag = |ok: bool| if ok { "yes".green().to_string() } else { "no".red().to_string() };
    println!(
        "      {} {}  {} {}  {} {}",
        "in repository".dimmed(),
        flag(status.in_repository),
        "trunk".dimmed(),
        flag(status.is_on_trunk_branch),
        "synced".dimmed(),
        flag(status.is_synced)
    );
    for diagnostic in &status.diagnostics {
        println!("      {}", diagnostic.dimmed());
    }
}

fn print_dir(label: &str, path: &Option<String>) {
    print!("{}: ", label.dimmed());
    match path {
        Some(p) => println!("{}", p.cyan()),
        None => println!("{}", "(unavailable)".yellow()),
    }
}

/// A starting point for a project config file.
fn starter_config() -> Config {
    let mut config = Config {
        docker_compose_path: Some("docker-compose.yml".into()),
        makefile_path: Some("Makefile".into()),
        options: LauncherOptions {
            name: Some("My Stack".into()),
            ..LauncherOptions::default()
        },
        ..Config::default()
    };
    if let Ok(commands) = serde_json::from_str(
        r#"{"say-hello": "echo hello", "database": {"migrate": "make migrate", "seed": "make seed"}}"#,
    ) {
        config.commands = commands;
    }
    config
}

/// Offer to create a starter project config when none exists.
fn offer_config_creation(cwd: &Utf8Path) -> anyhow::Result<()> {
    let config_path = cwd.join(".stackctl.yaml");

    // Don't prompt if running non-interactively
    if !std::io::IsTerminal::is_terminal(&std::io::stdin()) {
        return Ok(());
    }

    let create = Confirm::new("Create a starter config file?")
        .with_default(false)
        .with_help_message(&format!("Will create {config_path}"))
        .prompt();

    match create {
        Ok(true) => {
            let yaml = serde_saphyr::to_string(&starter_config())?;
            std::fs::write(&config_path, yaml)?;

            println!("  {} Created {}", "✓".green(), config_path.cyan());
        }
        Ok(false) => {
            // User declined
        }
        Err(_) => {
            // Prompt interrupted (Ctrl+C, etc.)
        }
    }

    Ok(())
}
