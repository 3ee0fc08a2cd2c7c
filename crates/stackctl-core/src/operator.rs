//! The operator interface: prompts and progress reporting.
//!
//! The core never talks to the terminal directly. Prompts go through
//! [`Operator`], which returns [`Prompt::Cancelled`] when the operator backs
//! out (Esc, Ctrl-C) so cancellation is an ordinary value, not an error.
//! Progress and diagnostics are pushed as [`LaunchEvent`]s; the CLI renders
//! them with spinners and colors.

use std::fmt;

use camino::Utf8PathBuf;
use thiserror::Error;

use crate::compose::ServicePorts;
use crate::repo::RepoStatus;

/// Errors from the prompting backend (not cancellation).
#[derive(Error, Debug)]
pub enum PromptError {
    /// No interactive terminal is attached.
    #[error("an interactive terminal is required to show menus")]
    NotInteractive,

    /// The prompt backend failed.
    #[error("prompt failed: {0}")]
    Backend(String),
}

/// The operator's answer to a prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Prompt<T> {
    /// The operator answered.
    Answered(T),
    /// The operator aborted the prompt.
    Cancelled,
}

/// Result alias for prompts.
pub type PromptResult<T> = Result<Prompt<T>, PromptError>;

/// One entry of a selection prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuOption {
    /// Text shown to the operator.
    pub label: String,
    /// Secondary text (the command a leaf runs, a hint for groups).
    pub description: Option<String>,
    /// Shown but not selectable.
    pub disabled: bool,
}

impl MenuOption {
    /// An enabled option without a description.
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            description: None,
            disabled: false,
        }
    }

    /// Attach a description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Mark the option as not selectable.
    pub const fn disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }
}

/// Which per-item operation a batch runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// `docker compose pull`
    Pull,
    /// `docker compose up -d`
    Start,
    /// `make <target>`
    Make,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Pull => "pull",
            Self::Start => "start",
            Self::Make => "make",
        })
    }
}

/// Progress and diagnostics reported to the operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaunchEvent {
    /// A freshness check is starting.
    RepoCheckStarted {
        /// The backing file being checked.
        path: Utf8PathBuf,
    },
    /// A freshness check finished.
    RepoChecked {
        /// The backing file that was checked.
        path: Utf8PathBuf,
        /// The result.
        status: RepoStatus,
    },
    /// Something the operator should know about; the flow continues.
    Warning(String),
    /// Informational message.
    Notice(String),
    /// A leaf command is about to run.
    CommandStarted {
        /// The shell command.
        command: String,
    },
    /// A leaf command exited successfully.
    CommandSucceeded {
        /// The shell command.
        command: String,
    },
    /// A leaf command failed to start or exited unsuccessfully.
    CommandFailed {
        /// The shell command.
        command: String,
        /// Diagnostic text.
        error: String,
    },
    /// A choice had neither a command nor a valid group shape.
    InvalidCommand {
        /// The offending choice.
        choice: String,
    },
    /// One item of a batch is starting.
    StepStarted {
        /// The batch operation.
        step: Step,
        /// Service or target name.
        name: String,
    },
    /// One item of a batch failed; the batch continues.
    StepFailed {
        /// The batch operation.
        step: Step,
        /// Service or target name.
        name: String,
        /// Diagnostic text.
        error: String,
    },
    /// A batch is complete.
    BatchFinished {
        /// The batch operation.
        step: Step,
        /// Items that succeeded, in order.
        succeeded: Vec<String>,
        /// Items that failed, in order.
        failed: Vec<String>,
    },
    /// Published ports of the services that were started.
    ServicePorts(Vec<ServicePorts>),
    /// Checking for an existing cloud session.
    SsoCheckStarted,
    /// A valid session already exists.
    SsoAlreadyLoggedIn,
    /// Starting the interactive login flow.
    SsoLoginStarted {
        /// SSO session name.
        session: String,
    },
    /// Login succeeded.
    SsoLoggedIn,
    /// Login failed.
    SsoLoginFailed {
        /// Diagnostic text.
        error: String,
    },
}

/// Interactive front end driven by the launcher.
pub trait Operator {
    /// Single-choice prompt. Returns the index of the chosen option, which is
    /// never a disabled one.
    fn select(&mut self, message: &str, options: &[MenuOption]) -> PromptResult<usize>;

    /// Multi-choice prompt requiring at least one selection. Returns indices in
    /// menu order.
    fn multi_select(&mut self, message: &str, options: &[MenuOption]) -> PromptResult<Vec<usize>>;

    /// Yes/no prompt.
    fn confirm(&mut self, message: &str, default: bool) -> PromptResult<bool>;

    /// Report progress or a diagnostic.
    fn notify(&mut self, event: LaunchEvent);
}
