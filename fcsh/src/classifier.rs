//! Recognises protocol markers in fcsh output.
//!
//! The shell has no structured acknowledgement: readiness, target ids and
//! failures are all inferred from the console text it prints for humans.

use crate::codec::{LineTokenizer, Token};

/// stdout prefix announcing a newly created compile target.
pub const ASSIGNED_PREFIX: &str = "fcsh: Assigned ";

/// stderr prefix of a compiler error.
pub const ERROR_PREFIX: &str = "Error: ";

/// Marker between a source location and its column in a diagnostic line,
/// e.g. `/src/Main.as(12): col: 5 Error: ...`.
pub const COLUMN_MARKER: &str = "): col: ";

/// A protocol-significant occurrence in shell output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputEvent {
    /// The shell printed its prompt and is waiting for a command.
    Prompt,
    /// The shell created a compile target with this id.
    TargetAssigned(String),
    /// A line on stderr reported a compiler error.
    ErrorLine(String),
}

/// Extract the compile-target id from an assignment line.
///
/// `"fcsh: Assigned 7 as the compile target id"` yields `"7"`.
#[must_use]
pub fn assigned_target_id(line: &str) -> Option<&str> {
    let rest = line.strip_prefix(ASSIGNED_PREFIX)?;
    let id = rest.split(' ').next()?;
    if id.is_empty() || !id.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(id)
}

/// Whether a stderr line reports an error.
///
/// fcsh reports errors two ways: a bare `Error: ...` line for configuration
/// and command problems, and `path(line): col: N Error: ...` for source
/// diagnostics. Diagnostics of other kinds (`Warning: ...`) are not errors.
#[must_use]
pub fn is_error_line(line: &str) -> bool {
    if line.starts_with(ERROR_PREFIX) {
        return true;
    }
    let Some(marker) = line.find(COLUMN_MARKER) else {
        return false;
    };
    let after_marker = &line[marker + COLUMN_MARKER.len()..];
    after_marker
        .split_once(' ')
        .is_some_and(|(_, kind)| kind.starts_with(ERROR_PREFIX))
}

fn classify_stdout_line(line: &str) -> Option<OutputEvent> {
    assigned_target_id(line).map(|id| OutputEvent::TargetAssigned(id.to_string()))
}

fn classify_stderr_line(line: String) -> Option<OutputEvent> {
    is_error_line(&line).then_some(OutputEvent::ErrorLine(line))
}

/// Per-shell classifier holding one tokenizer for each output stream.
#[derive(Debug, Default)]
pub struct OutputClassifier {
    stdout: LineTokenizer,
    stderr: LineTokenizer,
}

impl OutputClassifier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Classify a chunk of stdout text.
    ///
    /// A prompt means the command's output is complete, so any partial
    /// stderr line is classified before the prompt event is returned.
    pub fn stdout(&mut self, text: &str) -> Vec<OutputEvent> {
        let mut events = Vec::new();
        for token in self.stdout.push(text) {
            match token {
                Token::Line(line) => events.extend(classify_stdout_line(&line)),
                Token::Prompt => {
                    if let Some(partial) = self.stderr.flush() {
                        events.extend(classify_stderr_line(partial));
                    }
                    events.push(OutputEvent::Prompt);
                }
            }
        }
        events
    }

    /// Classify a chunk of stderr text.
    ///
    /// A prompt on stderr is not a readiness signal; it is kept as text.
    pub fn stderr(&mut self, text: &str) -> Vec<OutputEvent> {
        self.stderr
            .push(text)
            .into_iter()
            .filter_map(|token| match token {
                Token::Line(line) => classify_stderr_line(line),
                Token::Prompt => None,
            })
            .collect()
    }

    /// Classify whatever is left once both streams have closed.
    pub fn finish(&mut self) -> Vec<OutputEvent> {
        let mut events = Vec::new();
        if let Some(partial) = self.stderr.flush() {
            events.extend(classify_stderr_line(partial));
        }
        if let Some(partial) = self.stdout.flush() {
            events.extend(classify_stdout_line(&partial));
        }
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assigned_target_id_extracts_number() {
        assert_eq!(
            assigned_target_id("fcsh: Assigned 7 as the compile target id"),
            Some("7")
        );
        assert_eq!(assigned_target_id("fcsh: Assigned 12 as the compile target id"), Some("12"));
    }

    #[test]
    fn test_assigned_target_id_rejects_other_lines() {
        assert_eq!(assigned_target_id("Loading configuration file"), None);
        assert_eq!(assigned_target_id("fcsh: Assigned  as the compile target id"), None);
        assert_eq!(assigned_target_id("fcsh: Assigned x as the compile target id"), None);
    }

    #[test]
    fn test_error_prefix_is_error() {
        assert!(is_error_line("Error: a target file must be specified"));
        assert!(!is_error_line("  Error: indented is not a start-of-line error"));
    }

    #[test]
    fn test_column_diagnostics() {
        assert!(is_error_line(
            "/ws/src/Main.as(12): col: 5 Error: Access of undefined property foo."
        ));
        assert!(!is_error_line(
            "/ws/src/Main.as(12): col: 5 Warning: variable 'x' has no type declaration."
        ));
        assert!(!is_error_line("/ws/src/Main.as(12): col: 5"));
    }

    #[test]
    fn test_stdout_prompt_and_assignment() {
        let mut c = OutputClassifier::new();
        let events = c.stdout("fcsh: Assigned 7 as the compile target id\nLoading...\n(fcsh) ");
        assert_eq!(
            events,
            vec![
                OutputEvent::TargetAssigned("7".to_string()),
                OutputEvent::Prompt
            ]
        );
    }

    #[test]
    fn test_stdout_error_text_is_not_an_error() {
        let mut c = OutputClassifier::new();
        assert!(c.stdout("Error: only stderr counts\n").is_empty());
    }

    #[test]
    fn test_stderr_errors_across_chunks() {
        let mut c = OutputClassifier::new();
        assert!(c.stderr("/ws/src/Main.as(3): col: 5 Err").is_empty());
        let events = c.stderr("or: Type was not found.\n");
        assert_eq!(
            events,
            vec![OutputEvent::ErrorLine(
                "/ws/src/Main.as(3): col: 5 Error: Type was not found.".to_string()
            )]
        );
    }

    #[test]
    fn test_prompt_flushes_partial_stderr_first() {
        let mut c = OutputClassifier::new();
        assert!(c.stderr("Error: no newline").is_empty());
        let events = c.stdout("(fcsh) ");
        assert_eq!(
            events,
            vec![
                OutputEvent::ErrorLine("Error: no newline".to_string()),
                OutputEvent::Prompt
            ]
        );
    }

    #[test]
    fn test_finish_classifies_leftovers() {
        let mut c = OutputClassifier::new();
        c.stderr("Error: Unable to access jarfile");
        assert_eq!(
            c.finish(),
            vec![OutputEvent::ErrorLine(
                "Error: Unable to access jarfile".to_string()
            )]
        );
    }
}
