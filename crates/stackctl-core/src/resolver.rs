//! Walks the action tree and runs the selected command.
//!
//! A group shows one prompt per level; a leaf is handed to the platform shell
//! with inherited stdio. A failing command is reported and resolution ends
//! normally.

use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::actions::{ActionNode, ActionTree};
use crate::error::LaunchResult;
use crate::exec::{CommandRunner, Invocation};
use crate::operator::{LaunchEvent, Operator, Prompt};
use crate::text::is_stringified_json;

/// Prompt shown at every group level.
pub const COMMAND_PROMPT: &str = "Please select a command:";

/// How resolution ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum Resolution {
    /// A leaf command ran.
    Executed {
        /// The shell command.
        command: String,
        /// Whether it exited successfully.
        succeeded: bool,
    },
    /// The operator backed out of a prompt.
    Cancelled,
    /// The choice was not a usable command or group.
    Invalid,
}

/// Resolves choices against the action tree.
pub struct Resolver<'a> {
    runner: &'a dyn CommandRunner,
    operator: &'a mut dyn Operator,
}

impl<'a> Resolver<'a> {
    /// Create a resolver that runs commands through `runner` and prompts via
    /// `operator`.
    pub fn new(runner: &'a dyn CommandRunner, operator: &'a mut dyn Operator) -> Self {
        Self { runner, operator }
    }

    /// Resolve a node: prompt down through groups until a leaf is chosen.
    #[instrument(skip_all)]
    pub fn resolve(&mut self, node: &ActionNode) -> LaunchResult<Resolution> {
        let mut node = node;
        loop {
            match node {
                ActionNode::Leaf(command) => return Ok(self.execute(command)),
                ActionNode::Group(tree) => match self.choose(tree)? {
                    Some(child) => node = child,
                    None => return Ok(Resolution::Cancelled),
                },
            }
        }
    }

    /// Resolve a whole tree as if it were a group.
    pub fn resolve_tree(&mut self, tree: &ActionTree) -> LaunchResult<Resolution> {
        if tree.is_empty() {
            self.operator
                .notify(LaunchEvent::Notice("No commands configured.".into()));
            return Ok(Resolution::Invalid);
        }
        match self.choose(tree)? {
            Some(child) => self.resolve(child),
            None => Ok(Resolution::Cancelled),
        }
    }

    /// Resolve a raw choice: a JSON object is a group, anything else a
    /// command line.
    #[instrument(skip(self))]
    pub fn resolve_raw(&mut self, choice: &str) -> LaunchResult<Resolution> {
        if is_stringified_json(choice) {
            return match serde_json::from_str::<ActionTree>(choice) {
                Ok(tree) if !tree.is_empty() => self.resolve(&ActionNode::Group(tree)),
                Ok(_) => Ok(self.invalid(choice)),
                Err(e) => {
                    debug!(error = %e, "raw choice is not a valid group");
                    Ok(self.invalid(choice))
                }
            };
        }
        if choice.trim().is_empty() {
            return Ok(self.invalid(choice));
        }
        Ok(self.execute(choice))
    }

    fn choose<'t>(&mut self, tree: &'t ActionTree) -> LaunchResult<Option<&'t ActionNode>> {
        let options = tree.menu_options();
        match self.operator.select(COMMAND_PROMPT, &options)? {
            Prompt::Answered(index) => Ok(tree.entry(index).map(|(name, node)| {
                debug!(name, "entry selected");
                node
            })),
            Prompt::Cancelled => {
                debug!("command selection cancelled");
                Ok(None)
            }
        }
    }

    fn invalid(&mut self, choice: &str) -> Resolution {
        warn!(choice, "invalid command format");
        self.operator.notify(LaunchEvent::InvalidCommand {
            choice: choice.to_string(),
        });
        Resolution::Invalid
    }

    fn execute(&mut self, command: &str) -> Resolution {
        info!(command, "running command");
        self.operator.notify(LaunchEvent::CommandStarted {
            command: command.to_string(),
        });

        let result = self.runner.run_checked(&Invocation::shell(command));
        let succeeded = match result {
            Ok(_) => {
                self.operator.notify(LaunchEvent::CommandSucceeded {
                    command: command.to_string(),
                });
                true
            }
            Err(e) => {
                warn!(command, error = %e, "command failed");
                self.operator.notify(LaunchEvent::CommandFailed {
                    command: command.to_string(),
                    error: e.to_string(),
                });
                false
            }
        };

        Resolution::Executed {
            command: command.to_string(),
            succeeded,
        }
    }
}
