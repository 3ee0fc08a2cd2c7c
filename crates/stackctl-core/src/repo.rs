//! Repository freshness check.
//!
//! Before trusting a Compose file or Makefile, the launcher checks that it is
//! tracked by git, that the checkout is on a trunk branch, and that the branch
//! matches its remote counterpart with a clean working tree. The check is
//! advisory and never fails: every problem turns the matching flag off and
//! adds a diagnostic.

use camino::{Utf8Path, Utf8PathBuf};
use serde::Serialize;
use tracing::{debug, instrument, warn};

use crate::config::GitOptions;
use crate::exec::CommandRunner;
use crate::git::{Git, GitError};

/// Branch names treated as trunk.
pub const TRUNK_BRANCHES: &[&str] = &["main", "master"];

/// Result of a freshness check.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RepoStatus {
    /// The path lives inside a git work tree.
    pub in_repository: bool,
    /// The checked-out branch is `main` or `master`.
    pub is_on_trunk_branch: bool,
    /// Clean working tree and local branch equals `<remote>/<branch>`.
    pub is_synced: bool,
    /// The checked-out branch, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    /// Top-level directory of the repository.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root: Option<Utf8PathBuf>,
    /// Why a flag is off, or which sub-check failed.
    pub diagnostics: Vec<String>,
}

impl RepoStatus {
    /// All three flags are set.
    pub const fn is_fresh(&self) -> bool {
        self.in_repository && self.is_on_trunk_branch && self.is_synced
    }
}

/// Check whether `path` (a file or directory) lives in an up-to-date trunk
/// checkout.
#[instrument(skip(runner, options), fields(path = %path))]
pub fn check_repo_freshness(
    runner: &dyn CommandRunner,
    path: &Utf8Path,
    options: &GitOptions,
) -> RepoStatus {
    let mut status = RepoStatus::default();

    let dir = match std::fs::metadata(path) {
        Ok(meta) if meta.is_dir() => path.to_path_buf(),
        Ok(_) => match path.parent() {
            Some(parent) if !parent.as_str().is_empty() => parent.to_path_buf(),
            _ => Utf8PathBuf::from("."),
        },
        Err(e) => {
            status.diagnostics.push(format!("cannot access {path}: {e}"));
            return status;
        }
    };

    let root = match Git::new(runner, &dir).show_toplevel() {
        Ok(root) => root,
        Err(GitError::NotARepo) => {
            debug!(%dir, "not inside a repository");
            status.diagnostics.push(format!("{dir} is not inside a git repository"));
            return status;
        }
        Err(e) => {
            warn!(error = %e, "repository lookup failed");
            status.diagnostics.push(format!("could not query git: {e}"));
            return status;
        }
    };
    status.in_repository = true;

    let git = Git::new(runner, &root);
    status.root = Some(root);

    match git.current_branch() {
        Ok(Some(branch)) => {
            status.is_on_trunk_branch = TRUNK_BRANCHES.contains(&branch.as_str());
            if !status.is_on_trunk_branch {
                status
                    .diagnostics
                    .push(format!("on branch '{branch}', expected main or master"));
            }
            status.branch = Some(branch);
        }
        Ok(None) => status.diagnostics.push("detached HEAD, not on any branch".into()),
        Err(e) => {
            warn!(error = %e, "branch check failed");
            status.diagnostics.push(format!("error checking current branch: {e}"));
        }
    }

    status.is_synced = check_sync(&git, status.branch.as_deref(), options, &mut status.diagnostics);

    debug!(
        in_repository = status.in_repository,
        is_on_trunk_branch = status.is_on_trunk_branch,
        is_synced = status.is_synced,
        "freshness check complete"
    );
    status
}

/// Clean working tree AND `branch` == `<remote>/<branch>`.
fn check_sync(
    git: &Git<'_>,
    branch: Option<&str>,
    options: &GitOptions,
    diagnostics: &mut Vec<String>,
) -> bool {
    let clean = match git.is_clean() {
        Ok(true) => true,
        Ok(false) => {
            diagnostics.push("working tree has uncommitted changes".into());
            false
        }
        Err(e) => {
            warn!(error = %e, "status check failed");
            diagnostics.push(format!("error checking repository status: {e}"));
            false
        }
    };

    let Some(branch) = branch else {
        return false;
    };
    let remote = options.remote.as_str();

    if options.fetch
        && let Err(e) = git.fetch(remote, branch)
    {
        // Compare against whatever remote-tracking ref we already have
        warn!(error = %e, "fetch failed");
        diagnostics.push(format!("could not fetch {remote}/{branch}: {e}"));
    }

    let remote_ref = format!("{remote}/{branch}");
    let same_commit = match (git.rev_parse(branch), git.rev_parse(&remote_ref)) {
        (Ok(local), Ok(upstream)) => {
            if local != upstream {
                diagnostics.push(format!("'{branch}' differs from '{remote_ref}'"));
            }
            local == upstream
        }
        (Err(e), _) => {
            diagnostics.push(format!("cannot resolve '{branch}': {e}"));
            false
        }
        (_, Err(_)) => {
            diagnostics.push(format!("no remote-tracking branch '{remote_ref}'"));
            false
        }
    };

    clean && same_commit
}
