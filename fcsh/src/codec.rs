//! Text framing for the compiler shell's console protocol.
//!
//! fcsh writes single-byte console text with no reliable line termination:
//! its prompt is printed without a trailing newline and pipe reads may split
//! output anywhere, including in the middle of the prompt. [`LineTokenizer`]
//! buffers partial lines across reads and yields complete lines and prompt
//! occurrences.

/// Literal text fcsh prints once it is ready to accept the next command.
pub const PROMPT: &str = "(fcsh) ";

/// A partial line longer than this is emitted as-is so a shell that never
/// prints a newline cannot grow the buffer without bound.
const MAX_PENDING_BYTES: usize = 64 * 1024;

/// Decode raw console bytes as ISO-8859-1.
///
/// Every byte maps to exactly one `char`, so a read boundary can never split
/// a character and no input is rejected.
#[must_use]
pub fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().copied().map(char::from).collect()
}

/// One unit of shell output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// A complete line without its terminator.
    Line(String),
    /// One occurrence of [`PROMPT`].
    Prompt,
}

/// Splits a stream of text chunks into lines and prompts.
///
/// A prompt is recognised wherever it occurs before the next newline, so the
/// text `"done\n(fcsh) "` yields `Line("done")` then `Prompt`, and a prompt
/// delivered as `"(fc"` + `"sh) "` yields a single `Prompt` once the second
/// chunk arrives. Text preceding a prompt on the same line is emitted as a
/// line of its own.
#[derive(Debug, Default)]
pub struct LineTokenizer {
    pending: String,
}

impl LineTokenizer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `text` and return every token it completes.
    pub fn push(&mut self, text: &str) -> Vec<Token> {
        self.pending.push_str(text);
        let mut tokens = Vec::new();

        loop {
            let newline = self.pending.find('\n');
            let prompt = self.pending.find(PROMPT);
            match (newline, prompt) {
                (Some(nl), Some(at)) if at < nl => self.take_prompt(at, &mut tokens),
                (Some(nl), _) => self.take_line(nl, &mut tokens),
                (None, Some(at)) => self.take_prompt(at, &mut tokens),
                (None, None) => break,
            }
        }

        if self.pending.len() > MAX_PENDING_BYTES {
            let keep = partial_prompt_len(&self.pending);
            let rest = self.pending.split_off(self.pending.len() - keep);
            tokens.push(Token::Line(std::mem::replace(&mut self.pending, rest)));
        }
        tokens
    }

    /// Take whatever partial line is buffered.
    pub fn flush(&mut self) -> Option<String> {
        if self.pending.is_empty() {
            return None;
        }
        Some(std::mem::take(&mut self.pending))
    }

    #[cfg(test)]
    fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    fn take_line(&mut self, newline: usize, tokens: &mut Vec<Token>) {
        let mut line: String = self.pending.drain(..=newline).collect();
        line.pop();
        if line.ends_with('\r') {
            line.pop();
        }
        tokens.push(Token::Line(line));
    }

    fn take_prompt(&mut self, at: usize, tokens: &mut Vec<Token>) {
        let before: String = self.pending.drain(..at).collect();
        if !before.is_empty() {
            tokens.push(Token::Line(before));
        }
        self.pending.drain(..PROMPT.len());
        tokens.push(Token::Prompt);
    }
}

/// Length of the longest suffix of `text` that could start a prompt.
fn partial_prompt_len(text: &str) -> usize {
    (1..PROMPT.len())
        .rev()
        .find(|&n| text.ends_with(&PROMPT[..n]))
        .unwrap_or(0)
}
