//! Terminal front end for the launcher.
//!
//! Prompts use inquire; progress is rendered with indicatif spinners and
//! owo-colors. Spinners only run while nothing else writes to the terminal
//! (repository and identity checks); commands that inherit stdio get plain
//! status lines instead.

use std::fmt;
use std::io::IsTerminal;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use inquire::error::InquireError;
use inquire::list_option::ListOption;
use inquire::validator::Validation;
use inquire::{Confirm, MultiSelect, Select};
use owo_colors::OwoColorize;
use stackctl_core::operator::{LaunchEvent, MenuOption, Operator, Prompt, PromptError, PromptResult, Step};
use stackctl_core::repo::RepoStatus;
use tracing::debug;

/// One menu entry, as rendered by inquire.
#[derive(Clone)]
struct Choice {
    index: usize,
    label: String,
    description: Option<String>,
    disabled: bool,
}

impl fmt::Display for Choice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.disabled {
            return write!(f, "{}", format!("{} (not configured)", self.label).dimmed());
        }
        match &self.description {
            Some(description) => write!(f, "{}  {}", self.label, description.dimmed()),
            None => f.write_str(&self.label),
        }
    }
}

/// Every option in menu order; disabled ones stay visible.
fn choices(options: &[MenuOption]) -> Vec<Choice> {
    options
        .iter()
        .enumerate()
        .map(|(index, option)| Choice {
            index,
            label: option.label.clone(),
            description: option.description.clone(),
            disabled: option.disabled,
        })
        .collect()
}

fn first_enabled(choices: &[Choice]) -> Option<usize> {
    choices.iter().position(|choice| !choice.disabled)
}

/// Map inquire's result onto the prompt protocol.
fn answer<T>(result: Result<T, InquireError>) -> PromptResult<T> {
    match result {
        Ok(value) => Ok(Prompt::Answered(value)),
        Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => {
            debug!("prompt cancelled");
            Ok(Prompt::Cancelled)
        }
        Err(InquireError::NotTTY) => Err(PromptError::NotInteractive),
        Err(e) => Err(PromptError::Backend(e.to_string())),
    }
}

fn spinner(message: String) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("  {spinner:.cyan} {msg}") {
        spinner.set_style(
            style.tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "✓"]),
        );
    }
    spinner.set_message(message);
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner
}

/// [`Operator`] backed by the user's terminal.
#[derive(Default)]
pub struct TerminalOperator {
    quiet: bool,
    spinner: Option<ProgressBar>,
}

impl TerminalOperator {
    /// Create an operator; `quiet` hides informational output.
    pub const fn new(quiet: bool) -> Self {
        Self {
            quiet,
            spinner: None,
        }
    }

    fn ensure_terminal() -> Result<(), PromptError> {
        if std::io::stdin().is_terminal() {
            Ok(())
        } else {
            Err(PromptError::NotInteractive)
        }
    }

    fn start_spinner(&mut self, message: String) {
        self.stop_spinner();
        if !self.quiet {
            self.spinner = Some(spinner(message));
        }
    }

    fn stop_spinner(&mut self) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_and_clear();
        }
    }

    fn info(&self, line: impl fmt::Display) {
        if !self.quiet {
            println!("{line}");
        }
    }

    fn render_repo_status(&self, path: &camino::Utf8Path, status: &RepoStatus) {
        if status.is_fresh() {
            let branch = status.branch.as_deref().unwrap_or_default();
            self.info(format_args!(
                "  {} {} {}",
                "✓".green(),
                path.cyan(),
                format!("is up to date with its remote ({branch})").dimmed()
            ));
            return;
        }
        eprintln!(
            "  {} {} {}",
            "⚠".yellow(),
            path.cyan(),
            "may not be current:".yellow()
        );
        let flags = [
            (status.in_repository, "tracked by git"),
            (status.is_on_trunk_branch, "on main or master"),
            (status.is_synced, "clean and in sync with the remote"),
        ];
        for (ok, label) in flags {
            if ok {
                eprintln!("      {} {}", "✓".green(), label.dimmed());
            } else {
                eprintln!("      {} {}", "✗".red(), label);
            }
        }
        for diagnostic in &status.diagnostics {
            eprintln!("      {}", diagnostic.dimmed());
        }
    }
}

impl Drop for TerminalOperator {
    fn drop(&mut self) {
        self.stop_spinner();
    }
}

impl Operator for TerminalOperator {
    fn select(&mut self, message: &str, options: &[MenuOption]) -> PromptResult<usize> {
        self.stop_spinner();
        Self::ensure_terminal()?;
        let choices = choices(options);
        let Some(mut cursor) = first_enabled(&choices) else {
            return Ok(Prompt::Cancelled);
        };
        loop {
            let prompt = Select::new(message, choices.clone())
                .with_page_size(12)
                .with_starting_cursor(cursor);
            match answer(prompt.prompt())? {
                Prompt::Answered(choice) if choice.disabled => {
                    eprintln!("{} {} is not configured", "⚠".yellow(), choice.label.bold());
                    cursor = choice.index;
                }
                Prompt::Answered(choice) => return Ok(Prompt::Answered(choice.index)),
                Prompt::Cancelled => return Ok(Prompt::Cancelled),
            }
        }
    }

    fn multi_select(&mut self, message: &str, options: &[MenuOption]) -> PromptResult<Vec<usize>> {
        self.stop_spinner();
        Self::ensure_terminal()?;
        let choices = choices(options);
        if first_enabled(&choices).is_none() {
            return Ok(Prompt::Answered(Vec::new()));
        }
        let prompt = MultiSelect::new(message, choices)
            .with_page_size(12)
            .with_help_message("space to toggle, enter to confirm")
            .with_validator(|selected: &[ListOption<&Choice>]| {
                if selected.is_empty() {
                    Ok(Validation::Invalid("Select at least one entry".into()))
                } else if let Some(option) = selected.iter().find(|option| option.value.disabled) {
                    Ok(Validation::Invalid(
                        format!("{} is not configured", option.value.label).into(),
                    ))
                } else {
                    Ok(Validation::Valid)
                }
            });
        let picked = answer(prompt.prompt())?;
        Ok(match picked {
            Prompt::Answered(mut chosen) => {
                chosen.sort_by_key(|choice| choice.index);
                Prompt::Answered(chosen.into_iter().map(|choice| choice.index).collect())
            }
            Prompt::Cancelled => Prompt::Cancelled,
        })
    }

    fn confirm(&mut self, message: &str, default: bool) -> PromptResult<bool> {
        self.stop_spinner();
        Self::ensure_terminal()?;
        answer(Confirm::new(message).with_default(default).prompt())
    }

    fn notify(&mut self, event: LaunchEvent) {
        match event {
            LaunchEvent::RepoCheckStarted { path } => {
                self.start_spinner(format!("Checking repository status of {path}..."));
            }
            LaunchEvent::RepoChecked { path, status } => {
                self.stop_spinner();
                self.render_repo_status(&path, &status);
            }
            LaunchEvent::Warning(message) => {
                self.stop_spinner();
                eprintln!("{} {}", "⚠".yellow(), message.yellow());
            }
            LaunchEvent::Notice(message) => {
                self.stop_spinner();
                self.info(message.bold());
            }
            LaunchEvent::CommandStarted { command } => {
                self.info(format_args!("{} {}", "Running command:".yellow(), command.cyan()));
            }
            LaunchEvent::CommandSucceeded { command } => {
                debug!(%command, "command finished");
            }
            LaunchEvent::CommandFailed { command, error } => {
                eprintln!("{} {}", "✗ Command execution failed:".red(), command);
                eprintln!("  {}", error.dimmed());
            }
            LaunchEvent::InvalidCommand { choice } => {
                eprintln!("{} {}", "Invalid command format:".red(), choice.dimmed());
            }
            LaunchEvent::StepStarted { step, name } => {
                let verb = match step {
                    Step::Pull => "Pulling",
                    Step::Start => "Starting",
                    Step::Make => "Making",
                };
                self.info(format_args!("  {} {}", verb.dimmed(), name.bold()));
            }
            LaunchEvent::StepFailed { step, name, error } => {
                eprintln!("  {} {} {}", "✗".red(), format!("{step} {name} failed:").red(), error);
            }
            LaunchEvent::BatchFinished {
                step,
                succeeded,
                failed,
            } => {
                if failed.is_empty() {
                    self.info(format_args!(
                        "{} {step}: {}",
                        "✓".green(),
                        succeeded.join(", ")
                    ));
                } else {
                    eprintln!(
                        "{} {step}: {} succeeded, {} failed ({})",
                        "⚠".yellow(),
                        succeeded.len(),
                        failed.len(),
                        failed.join(", ").red()
                    );
                }
            }
            LaunchEvent::ServicePorts(services) => {
                self.info(format_args!("\n{}", "📡 Service ports:".bold()));
                for service in services {
                    let ports = if service.ports.is_empty() {
                        "none published".dimmed().to_string()
                    } else {
                        service.ports.join(", ")
                    };
                    self.info(format_args!("    ✅ {}: {ports}", service.service.bold()));
                }
            }
            LaunchEvent::SsoCheckStarted => {
                self.start_spinner("Ensuring AWS login...".yellow().to_string());
            }
            LaunchEvent::SsoAlreadyLoggedIn => {
                self.stop_spinner();
                self.info(format_args!("{} {}", "✓".green(), "AWS is already logged in.".bold()));
            }
            LaunchEvent::SsoLoginStarted { session } => {
                self.stop_spinner();
                self.info(format_args!(
                    "{} {}",
                    "Logging into AWS SSO session".yellow(),
                    session.cyan()
                ));
            }
            LaunchEvent::SsoLoggedIn => {
                self.info(format_args!(
                    "{} {}",
                    "✓".green(),
                    "Successfully logged into AWS SSO.".bold()
                ));
            }
            LaunchEvent::SsoLoginFailed { error } => {
                eprintln!("{} {}", "✗ Failed to log into AWS SSO:".red(), error);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_options_stay_visible_in_menu_order() {
        let options = vec![
            MenuOption::new("Docker Compose").disabled(true),
            MenuOption::new("Makefile"),
            MenuOption::new("Say Hello").with_description("echo hello"),
        ];

        let choices = choices(&options);

        assert_eq!(choices.len(), 3);
        assert!(choices[0].disabled);
        assert!(choices[0].to_string().contains("Docker Compose (not configured)"));
        assert_eq!(choices[2].index, 2);
        assert_eq!(choices[2].label, "Say Hello");
        assert_eq!(first_enabled(&choices), Some(1));
    }

    #[test]
    fn all_disabled_has_no_starting_entry() {
        let options = vec![
            MenuOption::new("Docker Compose").disabled(true),
            MenuOption::new("Makefile").disabled(true),
        ];
        assert_eq!(first_enabled(&choices(&options)), None);
    }

    #[test]
    fn cancellation_is_not_an_error() {
        assert!(matches!(
            answer::<bool>(Err(InquireError::OperationCanceled)),
            Ok(Prompt::Cancelled)
        ));
        assert!(matches!(
            answer::<bool>(Err(InquireError::OperationInterrupted)),
            Ok(Prompt::Cancelled)
        ));
    }

    #[test]
    fn missing_terminal_is_reported() {
        assert!(matches!(
            answer::<bool>(Err(InquireError::NotTTY)),
            Err(PromptError::NotInteractive)
        ));
    }

    #[test]
    fn plain_choice_renders_label() {
        let choice = Choice {
            index: 0,
            label: "Build".into(),
            description: None,
            disabled: false,
        };
        assert_eq!(choice.to_string(), "Build");
    }
}
