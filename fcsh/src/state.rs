//! Compiler shell state machine.
//!
//! Pure: no I/O, no async. The driver feeds it compile requests and
//! classified output events and performs the [`Action`]s it returns.
//!
//! ```text
//! NotStarted --spawned--> Starting --prompt--> AwaitingCommand
//!                            |                    |      ^
//!                            | prompt with        |      |
//!                            | pending compile    |      | prompt
//!                            v                    v      |
//!                           Busy <--compile request------+
//! ```

use crate::classifier::OutputEvent;
use crate::types::SessionState;

/// Side effect requested by a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Clear the user-visible log before a new command.
    ClearLog,
    /// Write a command line to the shell.
    Send(String),
    /// Resolve the outstanding compile.
    Complete(CompileOutcome),
}

/// How a command finished, as inferred from its output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompileOutcome {
    Succeeded { target_id: Option<String> },
    Failed { errors: Vec<String> },
}

/// A compile request that cannot be accepted in the current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    #[error("previous operation not yet complete")]
    Busy,
    #[error("compiler shell is not running")]
    NotStarted,
}

/// A target created by the shell, with the command that created it.
#[derive(Debug, Clone, PartialEq, Eq)]
struct CompileTarget {
    id: String,
    command: String,
}

#[derive(Debug)]
pub struct ShellMachine {
    state: SessionState,
    target: Option<CompileTarget>,
    /// Startup command of a compile requested before the first prompt.
    pending: Option<String>,
    /// Startup command of the compile currently running.
    running: Option<String>,
    /// Whether this incarnation has run any command yet.
    submitted_any: bool,
    had_errors: bool,
    errors: Vec<String>,
}

impl Default for ShellMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl ShellMachine {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: SessionState::NotStarted,
            target: None,
            pending: None,
            running: None,
            submitted_any: false,
            had_errors: false,
            errors: Vec::new(),
        }
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    #[must_use]
    pub fn target_id(&self) -> Option<&str> {
        self.target.as_ref().map(|t| t.id.as_str())
    }

    #[cfg(test)]
    fn had_errors(&self) -> bool {
        self.had_errors
    }

    /// A new shell process was spawned.
    pub fn spawned(&mut self) {
        if self.state != SessionState::NotStarted {
            tracing::warn!(state = self.state.label(), "Shell spawned over a live session");
        }
        *self = Self::new();
        self.state = SessionState::Starting;
    }

    /// Accept a compile request.
    ///
    /// Before the first prompt the request is parked and submitted as soon as
    /// the shell is ready. While idle the command is submitted immediately.
    pub fn request_compile(&mut self, startup_command: &str) -> Result<Vec<Action>, Rejection> {
        match self.state {
            SessionState::NotStarted => Err(Rejection::NotStarted),
            SessionState::Starting if self.pending.is_some() => Err(Rejection::Busy),
            SessionState::Starting => {
                self.pending = Some(startup_command.to_string());
                Ok(Vec::new())
            }
            SessionState::AwaitingCommand => {
                // Before the first command the log only holds the banner.
                let mut actions = Vec::new();
                if self.submitted_any {
                    actions.push(Action::ClearLog);
                }
                actions.push(self.submit(startup_command.to_string()));
                Ok(actions)
            }
            SessionState::Busy => Err(Rejection::Busy),
        }
    }

    /// Apply one classified output event.
    pub fn on_event(&mut self, event: OutputEvent) -> Vec<Action> {
        match event {
            OutputEvent::Prompt => self.on_prompt(),
            OutputEvent::TargetAssigned(id) => {
                if let Some(command) = &self.running {
                    tracing::debug!(target_id = %id, "Compile target assigned");
                    self.target = Some(CompileTarget {
                        id,
                        command: command.clone(),
                    });
                }
                Vec::new()
            }
            OutputEvent::ErrorLine(line) => {
                if self.state == SessionState::Busy {
                    self.had_errors = true;
                    self.errors.push(line);
                }
                Vec::new()
            }
        }
    }

    /// The shell process went away. Returns whether a compile was
    /// outstanding and is now lost.
    pub fn exited(&mut self) -> bool {
        let in_flight = self.state == SessionState::Busy || self.pending.is_some();
        *self = Self::new();
        in_flight
    }

    fn on_prompt(&mut self) -> Vec<Action> {
        match self.state {
            SessionState::Starting => {
                self.state = SessionState::AwaitingCommand;
                match self.pending.take() {
                    Some(command) => vec![self.submit(command)],
                    None => Vec::new(),
                }
            }
            SessionState::Busy => {
                self.state = SessionState::AwaitingCommand;
                self.running = None;
                let errors = std::mem::take(&mut self.errors);
                let outcome = if std::mem::replace(&mut self.had_errors, false) {
                    CompileOutcome::Failed { errors }
                } else {
                    CompileOutcome::Succeeded {
                        target_id: self.target_id().map(ToString::to_string),
                    }
                };
                vec![Action::Complete(outcome)]
            }
            SessionState::AwaitingCommand | SessionState::NotStarted => {
                tracing::trace!(state = self.state.label(), "Ignoring unsolicited prompt");
                Vec::new()
            }
        }
    }

    /// Move to `Busy` and produce the command line to send.
    ///
    /// An existing target is recompiled by id only when it was created by
    /// the same startup command; otherwise the startup command is sent again
    /// so the shell creates a fresh target.
    fn submit(&mut self, startup_command: String) -> Action {
        let line = match &self.target {
            Some(target) if target.command == startup_command => {
                format!("compile {}", target.id)
            }
            _ => {
                self.target = None;
                startup_command.clone()
            }
        };
        self.state = SessionState::Busy;
        self.running = Some(startup_command);
        self.submitted_any = true;
        self.had_errors = false;
        self.errors.clear();
        Action::Send(line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MXMLC: &str = "mxmlc -debug=true src/Main.mxml";

    fn started() -> ShellMachine {
        let mut m = ShellMachine::new();
        m.spawned();
        m
    }

    /// Drive a machine through startup and its first compile.
    fn first_compile_done() -> ShellMachine {
        let mut m = started();
        m.request_compile(MXMLC).unwrap();
        m.on_event(OutputEvent::Prompt);
        m.on_event(OutputEvent::TargetAssigned("1".to_string()));
        m.on_event(OutputEvent::Prompt);
        m
    }

    #[test]
    fn test_request_before_spawn_is_rejected() {
        let mut m = ShellMachine::new();
        assert_eq!(m.request_compile(MXMLC), Err(Rejection::NotStarted));
    }

    #[test]
    fn test_startup_prompt_submits_pending_command() {
        let mut m = started();
        assert_eq!(m.state(), SessionState::Starting);
        assert!(m.request_compile(MXMLC).unwrap().is_empty());

        let actions = m.on_event(OutputEvent::Prompt);
        assert_eq!(actions, vec![Action::Send(MXMLC.to_string())]);
        assert_eq!(m.state(), SessionState::Busy);
    }

    #[test]
    fn test_startup_prompt_without_request_waits() {
        let mut m = started();
        assert!(m.on_event(OutputEvent::Prompt).is_empty());
        assert_eq!(m.state(), SessionState::AwaitingCommand);

        // The banner is not cleared for the first command.
        let actions = m.request_compile(MXMLC).unwrap();
        assert_eq!(actions, vec![Action::Send(MXMLC.to_string())]);
        assert_eq!(m.state(), SessionState::Busy);
    }

    #[test]
    fn test_second_prompt_completes_with_target() {
        let mut m = started();
        m.request_compile(MXMLC).unwrap();
        m.on_event(OutputEvent::Prompt);
        m.on_event(OutputEvent::TargetAssigned("7".to_string()));

        let actions = m.on_event(OutputEvent::Prompt);
        assert_eq!(
            actions,
            vec![Action::Complete(CompileOutcome::Succeeded {
                target_id: Some("7".to_string())
            })]
        );
        assert_eq!(m.state(), SessionState::AwaitingCommand);
        assert_eq!(m.target_id(), Some("7"));
    }

    #[test]
    fn test_idle_request_recompiles_target_by_id() {
        let mut m = first_compile_done();
        let actions = m.request_compile(MXMLC).unwrap();
        assert_eq!(
            actions,
            vec![Action::ClearLog, Action::Send("compile 1".to_string())]
        );
        assert_eq!(m.state(), SessionState::Busy);
    }

    #[test]
    fn test_changed_startup_command_creates_new_target() {
        let mut m = first_compile_done();
        let release = "mxmlc -debug=false src/Main.mxml";
        let actions = m.request_compile(release).unwrap();
        assert_eq!(
            actions,
            vec![Action::ClearLog, Action::Send(release.to_string())]
        );
        assert_eq!(m.target_id(), None);
    }

    #[test]
    fn test_request_without_target_resends_startup_command() {
        let mut m = started();
        m.request_compile(MXMLC).unwrap();
        m.on_event(OutputEvent::Prompt);
        // No assignment: the startup command itself was rejected by the shell.
        m.on_event(OutputEvent::ErrorLine("Error: bad option".to_string()));
        m.on_event(OutputEvent::Prompt);

        let actions = m.request_compile(MXMLC).unwrap();
        assert_eq!(actions[1], Action::Send(MXMLC.to_string()));
    }

    #[test]
    fn test_busy_rejects_request() {
        let mut m = first_compile_done();
        m.request_compile(MXMLC).unwrap();
        assert_eq!(m.request_compile(MXMLC), Err(Rejection::Busy));
        assert_eq!(m.state(), SessionState::Busy);
    }

    #[test]
    fn test_pending_startup_rejects_second_request() {
        let mut m = started();
        m.request_compile(MXMLC).unwrap();
        assert_eq!(m.request_compile(MXMLC), Err(Rejection::Busy));
    }

    #[test]
    fn test_error_flag_lasts_for_one_command() {
        let mut m = first_compile_done();
        m.request_compile(MXMLC).unwrap();
        m.on_event(OutputEvent::ErrorLine("Error: boom".to_string()));
        assert!(m.had_errors());

        let actions = m.on_event(OutputEvent::Prompt);
        assert_eq!(
            actions,
            vec![Action::Complete(CompileOutcome::Failed {
                errors: vec!["Error: boom".to_string()]
            })]
        );
        assert!(!m.had_errors());

        m.request_compile(MXMLC).unwrap();
        let actions = m.on_event(OutputEvent::Prompt);
        assert_eq!(
            actions,
            vec![Action::Complete(CompileOutcome::Succeeded {
                target_id: Some("1".to_string())
            })]
        );
    }

    #[test]
    fn test_errors_while_idle_do_not_taint_next_compile() {
        let mut m = first_compile_done();
        m.on_event(OutputEvent::ErrorLine("Error: stray".to_string()));
        assert!(!m.had_errors());
    }

    #[test]
    fn test_unsolicited_prompt_is_ignored() {
        let mut m = first_compile_done();
        assert!(m.on_event(OutputEvent::Prompt).is_empty());
        assert_eq!(m.state(), SessionState::AwaitingCommand);
    }

    #[test]
    fn test_exit_while_busy_reports_lost_compile() {
        let mut m = first_compile_done();
        m.request_compile(MXMLC).unwrap();
        assert!(m.exited());
        assert_eq!(m.state(), SessionState::NotStarted);
        assert_eq!(m.target_id(), None);
    }

    #[test]
    fn test_exit_while_idle() {
        let mut m = first_compile_done();
        assert!(!m.exited());
    }
}
