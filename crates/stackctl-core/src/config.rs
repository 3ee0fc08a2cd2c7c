//! Configuration loading and discovery.
//!
//! This module provides configuration file discovery by:
//! 1. Walking up from the current directory to find project config
//! 2. Loading user config from XDG config directory
//! 3. Merging with sensible defaults
//!
//! # Supported formats
//!
//! - TOML (`.toml`)
//! - YAML (`.yaml`, `.yml`)
//! - JSON (`.json`)
//!
//! # Config file locations (in order of precedence, highest first):
//! - files passed to [`ConfigLoader::with_file`] (`--config`)
//! - `.stackctl.<ext>` in current directory or any parent
//! - `stackctl.<ext>` in current directory or any parent
//! - `~/.config/stackctl/config.<ext>` (user config)
//!
//! Scalar settings are merged across all files. The `commands` tree is not
//! merged: it comes whole from the highest-precedence file that defines it,
//! so menu entries keep the order they were written in.
//!
//! # Example
//! ```no_run
//! use camino::Utf8PathBuf;
//! use stackctl_core::config::{Config, ConfigLoader};
//!
//! let cwd = std::env::current_dir().unwrap();
//! let cwd = Utf8PathBuf::try_from(cwd).expect("current directory is not valid UTF-8");
//! let config = ConfigLoader::new()
//!     .with_project_search(&cwd)
//!     .load()
//!     .unwrap();
//! ```

use camino::{Utf8Path, Utf8PathBuf};
use figment::Figment;
use figment::providers::{Format, Json, Serialized, Toml, Yaml};
use serde::{Deserialize, Serialize};

use crate::actions::ActionTree;
use crate::error::{ConfigError, ConfigResult};

/// The configuration for stackctl.
///
/// Keys are camelCase in config files (`dockerComposePath`, `makefilePath`).
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    /// Log level for the application (e.g., "debug", "info", "warn", "error").
    pub log_level: LogLevel,
    /// Directory for JSONL log files (falls back to platform defaults if unset).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<Utf8PathBuf>,
    /// Compose file offered by the "Docker Compose" menu entry.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub docker_compose_path: Option<Utf8PathBuf>,
    /// Makefile offered by the "Makefile" menu entry.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub makefile_path: Option<Utf8PathBuf>,
    /// Launcher behavior.
    pub options: LauncherOptions,
    /// The command menu tree. Loaded separately from the merged settings.
    #[serde(skip_deserializing)]
    pub commands: ActionTree,
}

impl Config {
    /// The Compose file, unless unset or empty.
    pub fn compose_file(&self) -> Option<&Utf8Path> {
        non_empty(self.docker_compose_path.as_deref())
    }

    /// The Makefile, unless unset or empty.
    pub fn makefile(&self) -> Option<&Utf8Path> {
        non_empty(self.makefile_path.as_deref())
    }

    /// SSO settings, if configured.
    pub fn sso(&self) -> Option<&SsoOptions> {
        self.options.aws.as_ref().and_then(|aws| aws.sso.as_ref())
    }
}

fn non_empty(path: Option<&Utf8Path>) -> Option<&Utf8Path> {
    path.filter(|p| !p.as_str().trim().is_empty())
}

/// `options` section.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct LauncherOptions {
    /// Name shown in the launcher banner.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// AWS integration.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aws: Option<AwsOptions>,
    /// Repository freshness check behavior.
    pub git: GitOptions,
}

/// `options.aws` section.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct AwsOptions {
    /// SSO login gate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sso: Option<SsoOptions>,
}

/// `options.aws.sso` section.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct SsoOptions {
    /// Name passed to `aws sso login --sso-session`.
    pub session: String,
    /// Require a session before starting Compose services.
    pub use_for_docker_compose: bool,
    /// Require a session before running Makefile targets.
    pub use_for_makefile: bool,
    /// Ask before logging in.
    pub ask_each_time: bool,
}

/// `options.git` section.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct GitOptions {
    /// Remote whose branch the checkout is compared to (default `origin`).
    pub remote: String,
    /// Fetch the remote branch before comparing (default `true`).
    pub fetch: bool,
    /// Refuse to run file-driven actions unless the checkout is fresh.
    pub enforce: bool,
}

impl Default for GitOptions {
    fn default() -> Self {
        Self {
            remote: "origin".to_string(),
            fetch: true,
            enforce: false,
        }
    }
}

/// Log level configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Verbose output for debugging and development.
    Debug,
    /// Standard operational information (default).
    #[default]
    Info,
    /// Warnings about potential issues.
    Warn,
    /// Errors that indicate failures.
    Error,
}

impl LogLevel {
    /// Returns the log level as a lowercase string slice.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// Supported configuration file extensions (in order of preference).
const CONFIG_EXTENSIONS: &[&str] = &["toml", "yaml", "yml", "json"];

/// Application name for XDG directory lookup and config file names.
const APP_NAME: &str = "stackctl";

/// Keys holding paths that resolve relative to the file that set them.
const PATH_KEYS: &[&str] = &["dockerComposePath", "makefilePath"];

/// Builder for loading configuration from multiple sources.
#[derive(Debug, Default)]
pub struct ConfigLoader {
    /// Starting directory for project config search.
    project_search_root: Option<Utf8PathBuf>,
    /// Whether to include user config from XDG directory.
    include_user_config: bool,
    /// Stop searching when we hit a directory containing this file/dir.
    boundary_marker: Option<String>,
    /// Explicit config files to load (for testing or programmatic use).
    explicit_files: Vec<Utf8PathBuf>,
}

impl ConfigLoader {
    /// Create a new config loader with default settings.
    pub fn new() -> Self {
        Self {
            project_search_root: None,
            include_user_config: true,
            boundary_marker: Some(".git".to_string()),
            explicit_files: Vec::new(),
        }
    }

    /// Set the starting directory for project config search.
    pub fn with_project_search<P: AsRef<Utf8Path>>(mut self, path: P) -> Self {
        self.project_search_root = Some(path.as_ref().to_path_buf());
        self
    }

    /// Set whether to include user config from `~/.config/stackctl/`.
    pub const fn with_user_config(mut self, include: bool) -> Self {
        self.include_user_config = include;
        self
    }

    /// Set a boundary marker to stop directory traversal. Default is `.git`.
    pub fn with_boundary_marker<S: Into<String>>(mut self, marker: S) -> Self {
        self.boundary_marker = Some(marker.into());
        self
    }

    /// Disable boundary marker (search all the way to filesystem root).
    pub fn without_boundary_marker(mut self) -> Self {
        self.boundary_marker = None;
        self
    }

    /// Add an explicit config file to load.
    ///
    /// Files are loaded in order, with later files taking precedence.
    /// Explicit files are loaded after discovered files.
    pub fn with_file<P: AsRef<Utf8Path>>(mut self, path: P) -> Self {
        self.explicit_files.push(path.as_ref().to_path_buf());
        self
    }

    /// Config files that will be read, lowest precedence first.
    pub fn sources(&self) -> Vec<Utf8PathBuf> {
        let mut sources = Vec::new();
        if self.include_user_config
            && let Some(user_config) = self.find_user_config()
        {
            sources.push(user_config);
        }
        if let Some(ref root) = self.project_search_root
            && let Some(project_config) = self.find_project_config(root)
        {
            sources.push(project_config);
        }
        sources.extend(self.explicit_files.iter().cloned());
        sources
    }

    /// Load configuration, merging all discovered sources.
    ///
    /// Precedence (highest to lowest):
    /// 1. Explicit files (in order added via `with_file`)
    /// 2. Project config (closest to search root)
    /// 3. User config (`~/.config/stackctl/config.<ext>`)
    /// 4. Default values
    #[tracing::instrument(skip(self), fields(search_root = ?self.project_search_root))]
    pub fn load(self) -> ConfigResult<Config> {
        tracing::debug!("loading configuration");
        let sources = self.sources();

        let figment = sources.iter().fold(
            Figment::new().merge(Serialized::defaults(Config::default())),
            |figment, file| Self::merge_file(figment, file),
        );

        let mut config: Config = figment
            .extract()
            .map_err(|e| ConfigError::Deserialize(Box::new(e)))?;

        resolve_relative_paths(&figment, &mut config);
        config.commands = load_commands(&sources)?;

        tracing::info!(
            log_level = config.log_level.as_str(),
            sources = sources.len(),
            commands = config.commands.len(),
            "configuration loaded"
        );
        Ok(config)
    }

    /// Load configuration, returning an error if no config file is found.
    pub fn load_or_error(self) -> ConfigResult<Config> {
        if self.sources().is_empty() {
            return Err(ConfigError::NotFound);
        }
        self.load()
    }

    /// Find project config by walking up from the given directory.
    fn find_project_config(&self, start: &Utf8Path) -> Option<Utf8PathBuf> {
        let mut current = Some(start.to_path_buf());

        while let Some(dir) = current {
            for ext in CONFIG_EXTENSIONS {
                let dotfile = dir.join(format!(".{APP_NAME}.{ext}"));
                if dotfile.is_file() {
                    return Some(dotfile);
                }

                let regular = dir.join(format!("{APP_NAME}.{ext}"));
                if regular.is_file() {
                    return Some(regular);
                }
            }

            // The directory holding the boundary marker is the last one searched
            if let Some(ref marker) = self.boundary_marker
                && dir.join(marker).exists()
            {
                break;
            }

            current = dir.parent().map(Utf8Path::to_path_buf);
        }

        None
    }

    /// Find user config in XDG config directory.
    fn find_user_config(&self) -> Option<Utf8PathBuf> {
        let config_dir = user_config_dir()?;
        CONFIG_EXTENSIONS
            .iter()
            .map(|ext| config_dir.join(format!("config.{ext}")))
            .find(|path| path.is_file())
    }

    /// Merge a config file into the figment, detecting format from extension.
    fn merge_file(figment: Figment, path: &Utf8Path) -> Figment {
        match ConfigFormat::of(path) {
            ConfigFormat::Toml => figment.merge(Toml::file_exact(path.as_str())),
            ConfigFormat::Yaml => figment.merge(Yaml::file_exact(path.as_str())),
            ConfigFormat::Json => figment.merge(Json::file_exact(path.as_str())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConfigFormat {
    Toml,
    Yaml,
    Json,
}

impl ConfigFormat {
    fn of(path: &Utf8Path) -> Self {
        match path.extension() {
            Some("yaml" | "yml") => Self::Yaml,
            Some("json") => Self::Json,
            _ => Self::Toml,
        }
    }
}

/// Make relative compose/make paths relative to the file that set them.
fn resolve_relative_paths(figment: &Figment, config: &mut Config) {
    for key in PATH_KEYS {
        let slot = match *key {
            "dockerComposePath" => &mut config.docker_compose_path,
            _ => &mut config.makefile_path,
        };
        let Some(path) = slot.as_ref().filter(|p| p.is_relative() && !p.as_str().is_empty()) else {
            continue;
        };
        let base = figment
            .find_metadata(key)
            .and_then(|meta| meta.source.as_ref())
            .and_then(|source| source.file_path())
            .and_then(|file| file.parent())
            .and_then(|dir| Utf8Path::from_path(dir));
        if let Some(base) = base {
            let resolved = base.join(path);
            tracing::debug!(key, %resolved, "resolved relative path");
            *slot = Some(resolved);
        }
    }
}

/// Document shape used to read just the command tree.
#[derive(Deserialize)]
struct CommandsDocument {
    #[serde(default)]
    commands: Option<ActionTree>,
}

/// Take the command tree from the highest-precedence source defining one.
fn load_commands(sources: &[Utf8PathBuf]) -> ConfigResult<ActionTree> {
    for path in sources.iter().rev() {
        if let Some(tree) = read_commands(path)? {
            tracing::debug!(%path, entries = tree.len(), "command tree loaded");
            return Ok(tree);
        }
    }
    Ok(ActionTree::default())
}

fn read_commands(path: &Utf8Path) -> ConfigResult<Option<ActionTree>> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let invalid = |message: String| ConfigError::Commands {
        path: path.to_path_buf(),
        message,
    };
    let document: CommandsDocument = match ConfigFormat::of(path) {
        ConfigFormat::Json => serde_json::from_str(&text).map_err(|e| invalid(e.to_string()))?,
        ConfigFormat::Yaml => serde_saphyr::from_str(&text).map_err(|e| invalid(e.to_string()))?,
        ConfigFormat::Toml => toml::from_str(&text).map_err(|e| invalid(e.to_string()))?,
    };
    Ok(document.commands)
}

/// Get the project directories for XDG-compliant path resolution.
///
/// Returns `None` if the home directory cannot be determined.
fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("", "", APP_NAME)
}

/// Get the user config directory path.
///
/// Returns `~/.config/stackctl/` on Linux, `~/Library/Application Support/stackctl/`
/// on macOS, and equivalent on other platforms.
pub fn user_config_dir() -> Option<Utf8PathBuf> {
    let proj_dirs = project_dirs()?;
    Utf8PathBuf::from_path_buf(proj_dirs.config_dir().to_path_buf()).ok()
}

/// Get the local data directory path (machine-specific, not synced).
pub fn user_data_local_dir() -> Option<Utf8PathBuf> {
    let proj_dirs = project_dirs()?;
    Utf8PathBuf::from_path_buf(proj_dirs.data_local_dir().to_path_buf()).ok()
}
