//! The launcher: root menu and the file-driven selectors.
//!
//! [`Launcher`] owns nothing but the SSO gate; configuration, the command
//! runner and the operator are borrowed for the duration of a session.
//! Every selector follows the same shape:
//!
//! 1. check the freshness of the repository holding the backing file,
//! 2. read the file (re-read on every run, never cached),
//! 3. ask for a selection,
//! 4. pass the SSO gate if configured,
//! 5. run one command per selected item, continuing past failures.

use camino::Utf8Path;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::actions::ActionTree;
use crate::compose::{ComposeFile, ServicePorts};
use crate::config::Config;
use crate::error::LaunchResult;
use crate::exec::{CommandRunner, Invocation};
use crate::makefile::Makefile;
use crate::operator::{LaunchEvent, MenuOption, Operator, Prompt, Step};
use crate::repo::check_repo_freshness;
use crate::resolver::{Resolution, Resolver};
use crate::sso::{SsoGate, SsoOutcome};
use crate::text::kebab_case_to_title_case;

/// Root menu prompt.
pub const ROOT_PROMPT: &str = "Please select a function:";
/// Compose service prompt.
pub const SERVICES_PROMPT: &str = "Select services to start:";
/// Makefile target prompt.
pub const TARGETS_PROMPT: &str = "Select targets to run:";
/// Pull confirmation prompt.
pub const PULL_PROMPT: &str = "Do you want to pull the latest images before starting the services?";

/// Root menu label of the Compose selector.
pub const COMPOSE_LABEL: &str = "Docker Compose";
/// Root menu label of the Makefile selector.
pub const MAKEFILE_LABEL: &str = "Makefile";

/// Fixed entries ahead of the command tree in the root menu.
const FIXED_ENTRIES: usize = 2;

/// How a launcher action ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T> {
    /// The action ran (individual items may still have failed).
    Finished(T),
    /// Nothing to do: nothing configured, nothing found or nothing selected.
    Skipped,
    /// The operator backed out of a prompt.
    Cancelled,
}

/// Per-item results of a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    /// The batch operation.
    #[serde(serialize_with = "serialize_step")]
    pub step: Step,
    /// Items that succeeded, in order.
    pub succeeded: Vec<String>,
    /// Items that failed, in order.
    pub failed: Vec<String>,
}

fn serialize_step<S: serde::Serializer>(step: &Step, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(step)
}

impl BatchReport {
    const fn new(step: Step) -> Self {
        Self {
            step,
            succeeded: Vec::new(),
            failed: Vec::new(),
        }
    }

    /// No item failed.
    pub fn all_succeeded(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Result of a Compose run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComposeReport {
    /// Pull results, if pulling was requested.
    pub pulled: Option<BatchReport>,
    /// Start results.
    pub started: BatchReport,
}

/// What the root menu dispatched to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", content = "report", rename_all = "snake_case")]
pub enum Launched {
    /// The Compose selector ran.
    Compose(ComposeReport),
    /// The Makefile selector ran.
    Make(BatchReport),
    /// A command from the tree ran.
    Command(Resolution),
}

/// Interactive launcher session.
pub struct Launcher<'a> {
    config: &'a Config,
    runner: &'a dyn CommandRunner,
    operator: &'a mut dyn Operator,
    sso: Option<SsoGate>,
}

impl<'a> Launcher<'a> {
    /// Start a session over a loaded configuration.
    pub fn new(
        config: &'a Config,
        runner: &'a dyn CommandRunner,
        operator: &'a mut dyn Operator,
    ) -> Self {
        Self {
            config,
            runner,
            operator,
            sso: config.sso().cloned().map(SsoGate::new),
        }
    }

    /// Banner text (`options.name`).
    pub fn banner(&self) -> Option<&str> {
        self.config.options.name.as_deref()
    }

    /// Root menu entries: the two selectors, then the top-level commands.
    pub fn root_options(&self) -> Vec<MenuOption> {
        let mut options = vec![
            MenuOption::new(COMPOSE_LABEL)
                .with_description("Select Docker Compose services to start")
                .disabled(self.config.compose_file().is_none()),
            MenuOption::new(MAKEFILE_LABEL)
                .with_description("Select Makefile targets to make")
                .disabled(self.config.makefile().is_none()),
        ];
        options.extend(self.config.commands.menu_options());
        options
    }

    /// Show the root menu and dispatch the choice.
    #[instrument(skip(self))]
    pub fn launch(&mut self) -> LaunchResult<Outcome<Launched>> {
        let options = self.root_options();
        if options.iter().all(|o| o.disabled) {
            self.notice(
                "Nothing to launch: configure dockerComposePath, makefilePath or commands.",
            );
            return Ok(Outcome::Skipped);
        }

        let index = match self.operator.select(ROOT_PROMPT, &options)? {
            Prompt::Answered(index) => index,
            Prompt::Cancelled => return Ok(Outcome::Cancelled),
        };

        let config = self.config;
        Ok(match index {
            0 => self.compose()?.map(Launched::Compose),
            1 => self.make()?.map(Launched::Make),
            i => match config.commands.entry(i - FIXED_ENTRIES) {
                Some((name, node)) => {
                    debug!(name, "top-level command selected");
                    let resolution = Resolver::new(self.runner, &mut *self.operator).resolve(node)?;
                    Outcome::from_resolution(resolution).map(Launched::Command)
                }
                None => Outcome::Skipped,
            },
        })
    }

    /// Select Compose services, optionally pull them, and start them.
    #[instrument(skip(self))]
    pub fn compose(&mut self) -> LaunchResult<Outcome<ComposeReport>> {
        let config = self.config;
        let Some(path) = config.compose_file() else {
            self.warning("dockerComposePath is not configured");
            return Ok(Outcome::Skipped);
        };
        if !self.check_freshness(path) {
            return Ok(Outcome::Skipped);
        }
        let file = match ComposeFile::load(path) {
            Ok(file) => file,
            Err(e) => {
                warn!(error = %e, "compose file unusable");
                self.warning(e.to_string());
                return Ok(Outcome::Skipped);
            }
        };

        let services = match self.pick(SERVICES_PROMPT, &file.service_names())? {
            Outcome::Finished(services) => services,
            Outcome::Skipped => {
                self.notice("No services selected.");
                return Ok(Outcome::Skipped);
            }
            Outcome::Cancelled => return Ok(Outcome::Cancelled),
        };

        let use_sso = config.sso().is_some_and(|s| s.use_for_docker_compose);
        if use_sso && self.pass_sso_gate()? == SsoOutcome::Cancelled {
            return Ok(Outcome::Cancelled);
        }

        let pull_first = match self.operator.confirm(PULL_PROMPT, true)? {
            Prompt::Answered(yes) => yes,
            Prompt::Cancelled => return Ok(Outcome::Cancelled),
        };

        let pulled = pull_first.then(|| self.run_batch(Step::Pull, &services, |s| file.pull(s)));
        let started = self.run_batch(Step::Start, &services, |s| file.up(s));

        let ports: Vec<ServicePorts> = started.succeeded.iter().map(|s| file.ports(s)).collect();
        if !ports.is_empty() {
            self.operator.notify(LaunchEvent::ServicePorts(ports));
        }

        Ok(Outcome::Finished(ComposeReport { pulled, started }))
    }

    /// Select Makefile targets and make them in order.
    #[instrument(skip(self))]
    pub fn make(&mut self) -> LaunchResult<Outcome<BatchReport>> {
        let config = self.config;
        let Some(path) = config.makefile() else {
            self.warning("makefilePath is not configured");
            return Ok(Outcome::Skipped);
        };
        if !self.check_freshness(path) {
            return Ok(Outcome::Skipped);
        }
        let makefile = match Makefile::load(path) {
            Ok(makefile) => makefile,
            Err(e) => {
                warn!(error = %e, "makefile unusable");
                self.warning(e.to_string());
                return Ok(Outcome::Skipped);
            }
        };
        if makefile.targets().is_empty() {
            self.warning(format!("no targets found in {}", makefile.path()));
            return Ok(Outcome::Skipped);
        }

        let targets = match self.pick(TARGETS_PROMPT, makefile.targets())? {
            Outcome::Finished(targets) => targets,
            Outcome::Skipped => {
                self.notice("No targets selected.");
                return Ok(Outcome::Skipped);
            }
            Outcome::Cancelled => return Ok(Outcome::Cancelled),
        };

        let use_sso = config.sso().is_some_and(|s| s.use_for_makefile);
        if use_sso && self.pass_sso_gate()? == SsoOutcome::Cancelled {
            return Ok(Outcome::Cancelled);
        }

        Ok(Outcome::Finished(self.run_batch(Step::Make, &targets, |t| makefile.make(t))))
    }

    /// Walk the command tree along `path` (entry names) and resolve from there.
    /// An empty path starts at the top of the tree.
    #[instrument(skip(self))]
    pub fn commands(&mut self, path: &[String]) -> LaunchResult<Outcome<Resolution>> {
        let config = self.config;
        let tree: &ActionTree = &config.commands;
        let node = match tree.walk(path) {
            Ok(node) => node,
            Err(e) => {
                self.warning(e.to_string());
                return Ok(Outcome::Skipped);
            }
        };
        let mut resolver = Resolver::new(self.runner, &mut *self.operator);
        let resolution = match node {
            Some(node) => resolver.resolve(node)?,
            None => resolver.resolve_tree(tree)?,
        };
        Ok(Outcome::from_resolution(resolution))
    }

    /// Resolve a raw choice (a command line or a JSON group).
    pub fn raw(&mut self, choice: &str) -> LaunchResult<Outcome<Resolution>> {
        let resolution = Resolver::new(self.runner, &mut *self.operator).resolve_raw(choice)?;
        Ok(Outcome::from_resolution(resolution))
    }

    /// Run the freshness check and report it. Returns whether to continue.
    fn check_freshness(&mut self, path: &Utf8Path) -> bool {
        self.operator.notify(LaunchEvent::RepoCheckStarted {
            path: path.to_path_buf(),
        });
        let status = check_repo_freshness(self.runner, path, &self.config.options.git);
        let fresh = status.is_fresh();
        self.operator.notify(LaunchEvent::RepoChecked {
            path: path.to_path_buf(),
            status,
        });

        if !fresh && self.config.options.git.enforce {
            warn!(%path, "repository is not fresh; refusing to continue");
            self.warning(format!(
                "refusing to continue: {path} is not on an up-to-date trunk branch (options.git.enforce)"
            ));
            return false;
        }
        true
    }

    /// Required multi-select over raw names shown title-cased.
    fn pick(&mut self, message: &str, names: &[String]) -> LaunchResult<Outcome<Vec<String>>> {
        if names.is_empty() {
            return Ok(Outcome::Skipped);
        }
        let options: Vec<MenuOption> = names
            .iter()
            .map(|name| MenuOption::new(kebab_case_to_title_case(name)))
            .collect();
        match self.operator.multi_select(message, &options)? {
            Prompt::Answered(indices) => {
                let selected: Vec<String> = indices
                    .into_iter()
                    .filter_map(|i| names.get(i).cloned())
                    .collect();
                if selected.is_empty() {
                    Ok(Outcome::Skipped)
                } else {
                    Ok(Outcome::Finished(selected))
                }
            }
            Prompt::Cancelled => Ok(Outcome::Cancelled),
        }
    }

    fn pass_sso_gate(&mut self) -> LaunchResult<SsoOutcome> {
        match self.sso.as_mut() {
            Some(gate) => gate.ensure_login(self.runner, &mut *self.operator),
            None => Ok(SsoOutcome::Declined),
        }
    }

    /// Run one command per item, in order, isolating failures.
    fn run_batch(
        &mut self,
        step: Step,
        items: &[String],
        invocation: impl Fn(&str) -> Invocation,
    ) -> BatchReport {
        let mut report = BatchReport::new(step);
        for item in items {
            self.operator.notify(LaunchEvent::StepStarted {
                step,
                name: item.clone(),
            });
            match self.runner.run_checked(&invocation(item)) {
                Ok(_) => report.succeeded.push(item.clone()),
                Err(e) => {
                    warn!(%step, item = %item, error = %e, "step failed");
                    self.operator.notify(LaunchEvent::StepFailed {
                        step,
                        name: item.clone(),
                        error: e.to_string(),
                    });
                    report.failed.push(item.clone());
                }
            }
        }
        info!(
            %step,
            succeeded = report.succeeded.len(),
            failed = report.failed.len(),
            "batch finished"
        );
        self.operator.notify(LaunchEvent::BatchFinished {
            step,
            succeeded: report.succeeded.clone(),
            failed: report.failed.clone(),
        });
        report
    }

    fn warning(&mut self, message: impl Into<String>) {
        self.operator.notify(LaunchEvent::Warning(message.into()));
    }

    fn notice(&mut self, message: impl Into<String>) {
        self.operator.notify(LaunchEvent::Notice(message.into()));
    }
}

impl<T> Outcome<T> {
    /// Transform the finished value.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Self::Finished(value) => Outcome::Finished(f(value)),
            Self::Skipped => Outcome::Skipped,
            Self::Cancelled => Outcome::Cancelled,
        }
    }
}

impl Outcome<Resolution> {
    fn from_resolution(resolution: Resolution) -> Self {
        match resolution {
            Resolution::Cancelled => Self::Cancelled,
            Resolution::Invalid => Self::Skipped,
            executed @ Resolution::Executed { .. } => Self::Finished(executed),
        }
    }
}
