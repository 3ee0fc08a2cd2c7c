//! Error types for stackctl-core

use camino::Utf8PathBuf;
use thiserror::Error;

use crate::operator::PromptError;
use crate::sso::SsoError;

/// Errors that can occur when working with configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to deserialize configuration.
    #[error("invalid configuration: {0}")]
    Deserialize(#[from] Box<figment::Error>),

    /// Configuration file not found after searching all locations.
    #[error("no configuration file found")]
    NotFound,

    /// A config file could not be read while loading the command tree.
    #[error("failed to read {path}: {source}")]
    Read {
        /// The file that could not be read.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The `commands` tree in a config file is malformed.
    #[error("invalid commands in {path}: {message}")]
    Commands {
        /// The file that defined the tree.
        path: Utf8PathBuf,
        /// Parser diagnostic.
        message: String,
    },
}

/// Result type alias using [`ConfigError`].
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors that abort a launcher action.
///
/// Operator cancellation is not an error; it surfaces as
/// [`Outcome::Cancelled`](crate::launcher::Outcome::Cancelled).
#[derive(Error, Debug)]
pub enum LaunchError {
    /// The operator interface could not prompt (e.g. no terminal attached).
    #[error(transparent)]
    Prompt(#[from] PromptError),

    /// The SSO gate could not establish a session.
    #[error(transparent)]
    Sso(#[from] SsoError),
}

/// Result alias for launcher actions.
pub type LaunchResult<T> = Result<T, LaunchError>;
