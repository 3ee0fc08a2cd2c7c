//! Core library for stackctl.
//!
//! This crate provides the launcher logic used by the `stackctl` CLI: config
//! loading, the command tree, the Compose and Makefile selectors, and the
//! checks that run before them. All terminal interaction goes through the
//! [`Operator`] trait and all child processes through [`CommandRunner`], so
//! the whole flow can be driven without a terminal.
//!
//! # Modules
//!
//! - [`actions`] - The configured command tree
//! - [`compose`] - Docker Compose file reading
//! - [`config`] - Configuration loading and management
//! - [`error`] - Error types and result aliases
//! - [`exec`] - Child process execution
//! - [`git`] - Git plumbing
//! - [`launcher`] - Root menu and selectors
//! - [`makefile`] - Makefile target discovery
//! - [`operator`] - Prompt and progress interface
//! - [`repo`] - Repository freshness check
//! - [`resolver`] - Command tree resolution
//! - [`sso`] - AWS SSO login gate
//! - [`text`] - Label helpers
//! - [`update`] - Latest-release lookup
//!
//! # Quick Start
//!
//! ```no_run
//! use stackctl_core::{Config, ConfigLoader};
//!
//! let config = ConfigLoader::new()
//!     .with_user_config(true)
//!     .load()
//!     .expect("Failed to load configuration");
//!
//! println!("Log level: {:?}", config.log_level);
//! ```
#![deny(unsafe_code)]

pub mod actions;

pub mod compose;

pub mod config;

pub mod error;

pub mod exec;

pub mod git;

pub mod launcher;

pub mod makefile;

pub mod operator;

pub mod repo;

pub mod resolver;

pub mod sso;

pub mod text;

pub mod update;

#[cfg(test)]
mod testing;

pub use config::{Config, ConfigLoader, LogLevel};

pub use error::{ConfigError, ConfigResult, LaunchError, LaunchResult};

pub use exec::{CommandRunner, SystemRunner};

pub use launcher::{Launcher, Outcome};

pub use operator::{LaunchEvent, MenuOption, Operator, Prompt, PromptError, PromptResult};
