//! Git plumbing for the repository freshness check.
//!
//! Shells out to `git` for all operations so the user's credentials and
//! configuration apply to `fetch`. Every call runs in an explicit directory;
//! the process working directory is never consulted.

use camino::{Utf8Path, Utf8PathBuf};
use thiserror::Error;
use tracing::{debug, instrument};

use crate::exec::{CommandRunner, ExecError, Invocation};

/// Errors from git operations.
#[derive(Error, Debug)]
pub enum GitError {
    /// Failed to execute the `git` command.
    #[error("failed to run git: {0}")]
    Exec(#[from] ExecError),

    /// `git` returned a non-zero exit code.
    #[error("git {command} failed: {stderr}")]
    Command {
        /// The git subcommand that failed (e.g., "status").
        command: String,
        /// Captured stderr.
        stderr: String,
    },

    /// Not inside a git repository.
    #[error("not a git repository (or any parent up to mount point)")]
    NotARepo,
}

/// Result alias for git operations.
pub type GitResult<T> = Result<T, GitError>;

/// A git client bound to one directory.
pub struct Git<'a> {
    runner: &'a dyn CommandRunner,
    dir: Utf8PathBuf,
}

impl<'a> Git<'a> {
    /// Create a client that runs every command in `dir`.
    pub fn new(runner: &'a dyn CommandRunner, dir: impl AsRef<Utf8Path>) -> Self {
        Self {
            runner,
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// The directory commands run in.
    pub fn dir(&self) -> &Utf8Path {
        &self.dir
    }

    /// Absolute path of the repository's top-level directory.
    #[instrument(skip(self), fields(dir = %self.dir))]
    pub fn show_toplevel(&self) -> GitResult<Utf8PathBuf> {
        let output = self.git(&["rev-parse", "--show-toplevel"])?;
        let root = Utf8PathBuf::from(output.trim());
        debug!(%root, "repository root");
        Ok(root)
    }

    /// Get the current branch name.
    ///
    /// Returns `None` if in a detached HEAD state.
    #[instrument(skip(self), fields(dir = %self.dir))]
    pub fn current_branch(&self) -> GitResult<Option<String>> {
        let output = self.git(&["rev-parse", "--abbrev-ref", "HEAD"])?;
        let branch = output.trim().to_string();
        if branch == "HEAD" {
            debug!("detached HEAD");
            Ok(None)
        } else {
            debug!(%branch, "current branch");
            Ok(Some(branch))
        }
    }

    /// Check whether the working tree is clean (no uncommitted changes).
    ///
    /// Untracked files count as changes.
    #[instrument(skip(self), fields(dir = %self.dir))]
    pub fn is_clean(&self) -> GitResult<bool> {
        let output = self.git(&["status", "--porcelain"])?;
        let clean = output.trim().is_empty();
        debug!(clean, "working tree status");
        Ok(clean)
    }

    /// Update `<remote>/<branch>` from the remote.
    #[instrument(skip(self), fields(dir = %self.dir))]
    pub fn fetch(&self, remote: &str, branch: &str) -> GitResult<()> {
        self.git(&["fetch", "--quiet", remote, branch])?;
        Ok(())
    }

    /// Resolve a revision to its full commit hash.
    #[instrument(skip(self), fields(dir = %self.dir))]
    pub fn rev_parse(&self, rev: &str) -> GitResult<String> {
        let hash = self
            .git(&["rev-parse", "--verify", "--quiet", &format!("{rev}^{{commit}}")])?
            .trim()
            .to_string();
        debug!(%rev, %hash, "resolved revision");
        Ok(hash)
    }

    /// Run a git command and return its stdout.
    fn git(&self, args: &[&str]) -> GitResult<String> {
        // Credential prompts would fight the spinner for the terminal
        let invocation = Invocation::new("git", args.iter().copied())
            .current_dir(&self.dir)
            .env("GIT_TERMINAL_PROMPT", "0");
        let output = self.runner.run(&invocation)?;

        if output.success {
            Ok(output.stdout)
        } else {
            let stderr = output.stderr.trim().to_string();

            // Detect "not a git repo" specifically
            if stderr.contains("not a git repository") {
                return Err(GitError::NotARepo);
            }

            Err(GitError::Command {
                command: args.first().copied().unwrap_or_default().to_string(),
                stderr,
            })
        }
    }
}
