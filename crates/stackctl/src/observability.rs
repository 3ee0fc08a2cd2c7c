//! Logging setup.
//!
//! Stdout belongs to menus, reports and the commands the launcher starts, so
//! log events only ever go to a daily-rolled JSONL file or, failing that, to
//! stderr.

use std::fmt;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

const ENV_LOG_PATH: &str = "STACKCTL_LOG_PATH";
const ENV_LOG_DIR: &str = "STACKCTL_LOG_DIR";
const LOG_FILE_NAME: &str = concat!(env!("CARGO_PKG_NAME"), ".jsonl");

/// Where the log directory came from, highest precedence first.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Origin {
    PathVar,
    DirVar,
    Config,
    DataDir,
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::PathVar => ENV_LOG_PATH,
            Self::DirVar => ENV_LOG_DIR,
            Self::Config => "logDir",
            Self::DataDir => "data directory",
        })
    }
}

/// Inputs for choosing the log file.
#[derive(Clone, Debug, Default)]
pub struct ObservabilityConfig {
    path_var: Option<PathBuf>,
    dir_var: Option<PathBuf>,
    config_dir: Option<PathBuf>,
    data_dir: Option<PathBuf>,
}

impl ObservabilityConfig {
    /// Read the `STACKCTL_LOG_*` variables; `log_dir` is the config's `logDir`.
    pub fn from_env_with_overrides(log_dir: Option<PathBuf>) -> Self {
        Self {
            path_var: non_empty_var(ENV_LOG_PATH),
            dir_var: non_empty_var(ENV_LOG_DIR),
            config_dir: log_dir,
            data_dir: stackctl_core::config::user_data_local_dir()
                .map(|dir| dir.join("logs").into_std_path_buf()),
        }
    }

    /// The first usable candidate, in precedence order.
    fn candidates(&self) -> impl Iterator<Item = (Origin, LogTarget)> + '_ {
        let path = self
            .path_var
            .as_deref()
            .and_then(LogTarget::from_file_path)
            .map(|target| (Origin::PathVar, target));
        let dirs = [
            (Origin::DirVar, &self.dir_var),
            (Origin::Config, &self.config_dir),
            (Origin::DataDir, &self.data_dir),
        ]
        .into_iter()
        .filter_map(|(origin, dir)| dir.as_ref().map(|dir| (origin, LogTarget::in_dir(dir))));
        path.into_iter().chain(dirs)
    }

    fn resolve(&self) -> Result<(Origin, LogTarget)> {
        let mut last_error = None;
        for (origin, target) in self.candidates() {
            match target.ensure_writable() {
                Ok(()) => return Ok((origin, target)),
                Err(e) => last_error = Some(e.context(format!("log target from {origin}"))),
            }
        }
        Err(last_error.unwrap_or_else(|| anyhow!("no log directory available")))
    }
}

fn non_empty_var(name: &str) -> Option<PathBuf> {
    std::env::var_os(name)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct LogTarget {
    dir: PathBuf,
    file_name: String,
}

impl LogTarget {
    fn in_dir(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
            file_name: LOG_FILE_NAME.to_string(),
        }
    }

    fn from_file_path(path: &Path) -> Option<Self> {
        let file_name = path.file_name()?.to_str()?.to_string();
        let dir = path
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        Some(Self {
            dir: dir.to_path_buf(),
            file_name,
        })
    }

    fn ensure_writable(&self) -> Result<()> {
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("failed to create {}", self.dir.display()))?;
        let path = self.dir.join(&self.file_name);
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("failed to open {}", path.display()))?;
        Ok(())
    }

    fn writer(&self) -> (NonBlocking, WorkerGuard) {
        tracing_appender::non_blocking(tracing_appender::rolling::daily(&self.dir, &self.file_name))
    }
}

/// Keeps the background log writer alive; drop it last.
pub struct ObservabilityGuard {
    _log_guard: WorkerGuard,
}

/// Install the global subscriber.
///
/// An unusable log location is reported on stderr and logging continues
/// there instead.
pub fn init_observability(cfg: &ObservabilityConfig, env_filter: EnvFilter) -> Result<ObservabilityGuard> {
    let (origin, (writer, guard)) = match cfg.resolve() {
        Ok((origin, target)) => (Some((origin, target.dir.join(&target.file_name))), target.writer()),
        Err(err) => {
            eprintln!("Warning: {err:#}. Logging to stderr.");
            (None, tracing_appender::non_blocking(std::io::stderr()))
        }
    };

    let log_layer = tracing_subscriber::fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(false)
        .with_ansi(false)
        .with_writer(writer);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(log_layer)
        .try_init()
        .context("a global subscriber is already installed")?;

    if let Some((origin, path)) = origin {
        tracing::debug!(%origin, path = %path.display(), "logging initialized");
    }

    Ok(ObservabilityGuard { _log_guard: guard })
}

/// Level filter from the CLI flags.
///
/// `-q` wins over `-v`; without either, `RUST_LOG` and then the configured
/// level apply.
pub fn env_filter(quiet: bool, verbose: u8, default_level: &str) -> EnvFilter {
    match (quiet, verbose) {
        (true, _) => EnvFilter::new("error"),
        (false, 0) => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        (false, 1) => EnvFilter::new("debug"),
        (false, _) => EnvFilter::new("trace"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn quiet_beats_verbose() {
        assert_eq!(env_filter(true, 0, "info").to_string(), "error");
        assert_eq!(env_filter(true, 2, "debug").to_string(), "error");
    }

    #[test]
    fn verbose_maps_to_debug_and_trace() {
        assert_eq!(env_filter(false, 1, "info").to_string(), "debug");
        assert_eq!(env_filter(false, 3, "info").to_string(), "trace");
    }

    #[test]
    fn file_path_splits_into_dir_and_name() {
        let target = LogTarget::from_file_path(Path::new("/var/tmp/launch.jsonl")).unwrap();
        assert_eq!(target.dir, PathBuf::from("/var/tmp"));
        assert_eq!(target.file_name, "launch.jsonl");

        let bare = LogTarget::from_file_path(Path::new("launch.jsonl")).unwrap();
        assert_eq!(bare.dir, PathBuf::from("."));
    }

    #[test]
    fn path_variable_wins() {
        let tmp = TempDir::new().unwrap();
        let cfg = ObservabilityConfig {
            path_var: Some(tmp.path().join("explicit.jsonl")),
            dir_var: Some(tmp.path().join("dir")),
            config_dir: Some(tmp.path().join("config")),
            data_dir: None,
        };

        let (origin, target) = cfg.resolve().unwrap();

        assert_eq!(origin, Origin::PathVar);
        assert_eq!(target.file_name, "explicit.jsonl");
        assert!(tmp.path().join("explicit.jsonl").is_file());
    }

    #[test]
    fn config_dir_used_without_variables() {
        let tmp = TempDir::new().unwrap();
        let cfg = ObservabilityConfig {
            config_dir: Some(tmp.path().join("logs")),
            data_dir: Some(tmp.path().join("data")),
            ..ObservabilityConfig::default()
        };

        let (origin, target) = cfg.resolve().unwrap();

        assert_eq!(origin, Origin::Config);
        assert_eq!(target, LogTarget::in_dir(&tmp.path().join("logs")));
    }

    #[test]
    fn unwritable_candidate_falls_through() {
        let tmp = TempDir::new().unwrap();
        let blocker = tmp.path().join("not-a-dir");
        std::fs::write(&blocker, "").unwrap();
        let cfg = ObservabilityConfig {
            dir_var: Some(blocker.join("logs")),
            data_dir: Some(tmp.path().join("data")),
            ..ObservabilityConfig::default()
        };

        let (origin, _) = cfg.resolve().unwrap();

        assert_eq!(origin, Origin::DataDir);
    }

    #[test]
    fn no_candidates_is_an_error() {
        assert!(ObservabilityConfig::default().resolve().is_err());
    }
}
