//! Child process execution.
//!
//! Every external tool (git, docker, make, aws, user shell commands) is
//! reached through the [`CommandRunner`] trait so the launcher logic can be
//! driven by a scripted runner in tests. [`SystemRunner`] is the real one:
//! blocking `std::process`, one child at a time.

use std::fmt;
use std::process::{Command, Stdio};

use camino::{Utf8Path, Utf8PathBuf};
use thiserror::Error;
use tracing::{debug, instrument};

/// Errors from running an external command.
#[derive(Error, Debug)]
pub enum ExecError {
    /// The program could not be started (not installed, permission denied, ...).
    #[error("failed to run {program}: {source}")]
    Spawn {
        /// The program that failed to start.
        program: String,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The program ran and exited unsuccessfully.
    #[error("{command} failed{}{}", exit_suffix(.exit_code), stderr_suffix(.stderr))]
    Failed {
        /// The full command line.
        command: String,
        /// Exit code, if the process was not killed by a signal.
        exit_code: Option<i32>,
        /// Captured stderr (empty when stderr was inherited or ignored).
        stderr: String,
    },
}

fn exit_suffix(code: &Option<i32>) -> String {
    code.map_or_else(String::new, |c| format!(" with exit code {c}"))
}

fn stderr_suffix(stderr: &str) -> String {
    if stderr.is_empty() {
        String::new()
    } else {
        format!(": {stderr}")
    }
}

/// Result alias for process execution.
pub type ExecResult<T> = Result<T, ExecError>;

/// What to do with one of the child's output streams.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamMode {
    /// Share the parent's stream (the child writes straight to the terminal).
    Inherit,
    /// Collect the output into [`ExecOutput`].
    Capture,
    /// Discard the output.
    Ignore,
}

impl StreamMode {
    fn stdio(self) -> Stdio {
        match self {
            Self::Inherit => Stdio::inherit(),
            Self::Capture => Stdio::piped(),
            Self::Ignore => Stdio::null(),
        }
    }
}

/// A fully described external command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Program name or path.
    pub program: String,
    /// Arguments, passed verbatim.
    pub args: Vec<String>,
    /// Working directory; the parent's when `None`.
    pub cwd: Option<Utf8PathBuf>,
    /// Extra environment variables, on top of the parent's.
    pub env: Vec<(String, String)>,
    /// Whether stdin is shared with the child.
    pub inherit_stdin: bool,
    /// Child stdout handling.
    pub stdout: StreamMode,
    /// Child stderr handling.
    pub stderr: StreamMode,
}

impl Invocation {
    /// A command whose output is captured (stdin closed).
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            cwd: None,
            env: Vec::new(),
            inherit_stdin: false,
            stdout: StreamMode::Capture,
            stderr: StreamMode::Capture,
        }
    }

    /// A command line run through the platform shell with all three streams
    /// inherited, so interactive programs work.
    pub fn shell(command: &str) -> Self {
        let (program, flag) = if cfg!(windows) { ("cmd", "/C") } else { ("sh", "-c") };
        Self::new(program, [flag, command]).interactive()
    }

    /// Run in `dir`.
    pub fn current_dir(mut self, dir: impl AsRef<Utf8Path>) -> Self {
        self.cwd = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Set an environment variable for the child.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Set stdout and stderr handling.
    pub const fn streams(mut self, stdout: StreamMode, stderr: StreamMode) -> Self {
        self.stdout = stdout;
        self.stderr = stderr;
        self
    }

    /// Inherit stdin, stdout and stderr.
    pub const fn interactive(mut self) -> Self {
        self.inherit_stdin = true;
        self.stdout = StreamMode::Inherit;
        self.stderr = StreamMode::Inherit;
        self
    }

    /// The first argument, e.g. the git subcommand.
    pub fn subcommand(&self) -> Option<&str> {
        self.args.first().map(String::as_str)
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Result of a finished child process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecOutput {
    /// Whether the process exited with status zero.
    pub success: bool,
    /// Exit code, if any.
    pub exit_code: Option<i32>,
    /// Captured stdout (empty unless [`StreamMode::Capture`]).
    pub stdout: String,
    /// Captured stderr (empty unless [`StreamMode::Capture`]).
    pub stderr: String,
}

/// Runs external commands to completion.
pub trait CommandRunner {
    /// Run the invocation and wait for it. Only a spawn failure is an error;
    /// a non-zero exit is reported through [`ExecOutput::success`].
    fn run(&self, invocation: &Invocation) -> ExecResult<ExecOutput>;

    /// Run the invocation and turn a non-zero exit into [`ExecError::Failed`].
    fn run_checked(&self, invocation: &Invocation) -> ExecResult<ExecOutput> {
        let output = self.run(invocation)?;
        if output.success {
            Ok(output)
        } else {
            Err(ExecError::Failed {
                command: invocation.to_string(),
                exit_code: output.exit_code,
                stderr: output.stderr.trim().to_string(),
            })
        }
    }
}

/// [`CommandRunner`] backed by `std::process::Command`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    #[instrument(skip_all, fields(command = %invocation))]
    fn run(&self, invocation: &Invocation) -> ExecResult<ExecOutput> {
        let mut command = Command::new(&invocation.program);
        command
            .args(&invocation.args)
            .stdin(if invocation.inherit_stdin {
                Stdio::inherit()
            } else {
                Stdio::null()
            })
            .envs(invocation.env.iter().map(|(key, value)| (key, value)))
            .stdout(invocation.stdout.stdio())
            .stderr(invocation.stderr.stdio());
        if let Some(ref dir) = invocation.cwd {
            command.current_dir(dir.as_std_path());
        }

        let output = command.output().map_err(|source| ExecError::Spawn {
            program: invocation.program.clone(),
            source,
        })?;

        debug!(status = ?output.status.code(), "process exited");
        Ok(ExecOutput {
            success: output.status.success(),
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Full path of `program` on `PATH`, if it is installed.
pub fn locate(program: &str) -> Option<std::path::PathBuf> {
    which::which(program).ok()
}
