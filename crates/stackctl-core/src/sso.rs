//! AWS SSO login gate.
//!
//! Gated actions call [`SsoGate::ensure_login`] before touching anything that
//! needs cloud credentials. A session that was verified (or freshly created)
//! is remembered for the rest of the process.

use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::config::SsoOptions;
use crate::error::LaunchResult;
use crate::exec::{CommandRunner, ExecError, Invocation, StreamMode};
use crate::operator::{LaunchEvent, Operator, Prompt};

/// Errors from the SSO gate.
#[derive(Error, Debug)]
pub enum SsoError {
    /// No session name is configured.
    #[error("options.aws.sso.session is not set")]
    MissingSession,

    /// `aws sso login` could not be run or exited unsuccessfully.
    #[error("AWS SSO login for session '{session}' failed: {source}")]
    Login {
        /// The SSO session name.
        session: String,
        /// The underlying failure.
        source: ExecError,
    },
}

/// How the gate was passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SsoOutcome {
    /// A valid session already existed.
    AlreadyLoggedIn,
    /// The interactive login succeeded.
    LoggedIn,
    /// The operator declined to log in; the action continues without it.
    Declined,
    /// The operator backed out of the confirmation.
    Cancelled,
}

/// Ensures an AWS SSO session before gated actions.
#[derive(Debug, Clone)]
pub struct SsoGate {
    options: SsoOptions,
    verified: bool,
}

impl SsoGate {
    /// Create a gate for the configured session.
    pub const fn new(options: SsoOptions) -> Self {
        Self {
            options,
            verified: false,
        }
    }

    /// Whether a session has already been verified in this process.
    pub const fn is_verified(&self) -> bool {
        self.verified
    }

    /// Make sure a session exists, logging in interactively if needed.
    ///
    /// A failed login is returned as [`SsoError::Login`]; callers abort the
    /// gated action.
    #[instrument(skip_all, fields(session = %self.options.session))]
    pub fn ensure_login(
        &mut self,
        runner: &dyn CommandRunner,
        operator: &mut dyn Operator,
    ) -> LaunchResult<SsoOutcome> {
        if self.verified {
            return Ok(SsoOutcome::AlreadyLoggedIn);
        }
        let session = self.options.session.trim();
        if session.is_empty() {
            return Err(SsoError::MissingSession.into());
        }

        if self.options.ask_each_time {
            let message = format!("Log in to AWS SSO session '{session}'?");
            match operator.confirm(&message, true)? {
                Prompt::Answered(true) => {}
                Prompt::Answered(false) => {
                    info!("SSO login declined");
                    return Ok(SsoOutcome::Declined);
                }
                Prompt::Cancelled => return Ok(SsoOutcome::Cancelled),
            }
        }

        operator.notify(LaunchEvent::SsoCheckStarted);
        let identity = Invocation::new(
            "aws",
            ["sts", "get-caller-identity", "--query", "Account", "--output", "text"],
        )
        .streams(StreamMode::Ignore, StreamMode::Ignore);
        if matches!(runner.run(&identity), Ok(output) if output.success) {
            info!("AWS session already active");
            operator.notify(LaunchEvent::SsoAlreadyLoggedIn);
            self.verified = true;
            return Ok(SsoOutcome::AlreadyLoggedIn);
        }

        operator.notify(LaunchEvent::SsoLoginStarted {
            session: session.to_string(),
        });
        let login = Invocation::new("aws", ["sso", "login", "--sso-session", session]).interactive();
        match runner.run_checked(&login) {
            Ok(_) => {
                info!("AWS SSO login succeeded");
                operator.notify(LaunchEvent::SsoLoggedIn);
                self.verified = true;
                Ok(SsoOutcome::LoggedIn)
            }
            Err(source) => {
                warn!(error = %source, "AWS SSO login failed");
                operator.notify(LaunchEvent::SsoLoginFailed {
                    error: source.to_string(),
                });
                Err(SsoError::Login {
                    session: session.to_string(),
                    source,
                }
                .into())
            }
        }
    }
}
