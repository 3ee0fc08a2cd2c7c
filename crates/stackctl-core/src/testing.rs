//! Scripted collaborators for unit tests.

use std::cell::RefCell;
use std::collections::VecDeque;

use crate::exec::{CommandRunner, ExecError, ExecOutput, ExecResult, Invocation};
use crate::operator::{LaunchEvent, MenuOption, Operator, Prompt, PromptResult};

enum Reply {
    Ok(String),
    Fail(String),
    Missing,
}

/// Runner that answers from a rule list and records every invocation.
///
/// Rules match on a prefix of the rendered command line; the first match
/// wins. Unmatched commands succeed with empty output.
#[derive(Default)]
pub struct ScriptedRunner {
    rules: Vec<(String, Reply)>,
    calls: RefCell<Vec<Invocation>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(mut self, prefix: &str, stdout: &str) -> Self {
        self.rules.push((prefix.to_string(), Reply::Ok(stdout.to_string())));
        self
    }

    pub fn fail_on(mut self, prefix: &str, stderr: &str) -> Self {
        self.rules.push((prefix.to_string(), Reply::Fail(stderr.to_string())));
        self
    }

    pub fn missing(mut self, prefix: &str) -> Self {
        self.rules.push((prefix.to_string(), Reply::Missing));
        self
    }

    pub fn calls(&self) -> Vec<Invocation> {
        self.calls.borrow().clone()
    }

    pub fn lines(&self) -> Vec<String> {
        self.calls.borrow().iter().map(ToString::to_string).collect()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.lines().iter().filter(|l| l.starts_with(prefix)).count()
    }
}

impl CommandRunner for ScriptedRunner {
    fn run(&self, invocation: &Invocation) -> ExecResult<ExecOutput> {
        self.calls.borrow_mut().push(invocation.clone());
        let line = invocation.to_string();
        let reply = self
            .rules
            .iter()
            .find(|(prefix, _)| line.starts_with(prefix.as_str()))
            .map(|(_, reply)| reply);

        match reply {
            None => Ok(ExecOutput {
                success: true,
                exit_code: Some(0),
                ..ExecOutput::default()
            }),
            Some(Reply::Ok(stdout)) => Ok(ExecOutput {
                success: true,
                exit_code: Some(0),
                stdout: stdout.clone(),
                stderr: String::new(),
            }),
            Some(Reply::Fail(stderr)) => Ok(ExecOutput {
                success: false,
                exit_code: Some(1),
                stdout: String::new(),
                stderr: stderr.clone(),
            }),
            Some(Reply::Missing) => Err(ExecError::Spawn {
                program: invocation.program.clone(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
            }),
        }
    }
}

#[derive(Debug, Clone)]
pub enum Answer {
    /// Pick the option with this label.
    Pick(&'static str),
    /// Pick these labels in a multi-select.
    PickMany(Vec<&'static str>),
    Confirm(bool),
    Cancel,
}

/// Operator that replays queued answers and records prompts and events.
#[derive(Default)]
pub struct ScriptedOperator {
    answers: VecDeque<Answer>,
    pub prompts: Vec<(String, Vec<MenuOption>)>,
    pub events: Vec<LaunchEvent>,
}

impl ScriptedOperator {
    pub fn new(answers: impl IntoIterator<Item = Answer>) -> Self {
        Self {
            answers: answers.into_iter().collect(),
            ..Self::default()
        }
    }

    fn next(&mut self, message: &str) -> Answer {
        self.answers
            .pop_front()
            .unwrap_or_else(|| panic!("no scripted answer for prompt {message:?}"))
    }

    fn index_of(options: &[MenuOption], label: &str) -> usize {
        options
            .iter()
            .position(|o| o.label == label)
            .unwrap_or_else(|| panic!("no option labelled {label:?}"))
    }
}

impl Operator for ScriptedOperator {
    fn select(&mut self, message: &str, options: &[MenuOption]) -> PromptResult<usize> {
        self.prompts.push((message.to_string(), options.to_vec()));
        match self.next(message) {
            Answer::Pick(label) => {
                let index = Self::index_of(options, label);
                assert!(!options[index].disabled, "picked disabled option {label:?}");
                Ok(Prompt::Answered(index))
            }
            Answer::Cancel => Ok(Prompt::Cancelled),
            other => panic!("unexpected answer {other:?} for select {message:?}"),
        }
    }

    fn multi_select(&mut self, message: &str, options: &[MenuOption]) -> PromptResult<Vec<usize>> {
        self.prompts.push((message.to_string(), options.to_vec()));
        match self.next(message) {
            Answer::PickMany(labels) => Ok(Prompt::Answered(
                labels
                    .into_iter()
                    .map(|label| Self::index_of(options, label))
                    .collect(),
            )),
            Answer::Cancel => Ok(Prompt::Cancelled),
            other => panic!("unexpected answer {other:?} for multi-select {message:?}"),
        }
    }

    fn confirm(&mut self, message: &str, _default: bool) -> PromptResult<bool> {
        self.prompts.push((message.to_string(), Vec::new()));
        match self.next(message) {
            Answer::Confirm(yes) => Ok(Prompt::Answered(yes)),
            Answer::Cancel => Ok(Prompt::Cancelled),
            other => panic!("unexpected answer {other:?} for confirm {message:?}"),
        }
    }

    fn notify(&mut self, event: LaunchEvent) {
        self.events.push(event);
    }
}
