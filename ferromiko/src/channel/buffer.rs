//! Prompt buffer with terminal control sequence stripping.
//!
//! Incoming chunks are fed through a `vte` parser so that escape sequences
//! (colors, cursor movement, OSC titles) never reach the text used for prompt
//! matching. The parser is kept across chunks, which means an escape sequence
//! split over two reads is still removed.

use std::fmt;

use regex::Regex;
use vte::{Parser, Perform};

use super::patterns::prompt_line;

/// Accumulated, ANSI-stripped shell output.
///
/// Prompt detection runs against the entire accumulated buffer, so a match
/// can only be satisfied by text that has arrived so far.
pub struct PatternBuffer {
    /// The accumulated text.
    text: String,

    /// Escape-sequence parser, persistent across chunks.
    parser: Parser,
}

impl PatternBuffer {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self {
            text: String::with_capacity(4096),
            parser: Parser::new(),
        }
    }

    /// Extend the buffer with new data, stripping ANSI escape codes.
    pub fn extend(&mut self, data: &[u8]) {
        let mut printable = Printable {
            out: &mut self.text,
        };
        self.parser.advance(&mut printable, data);
    }

    /// Search the whole buffer for the pattern.
    pub fn search(&self, pattern: &Regex) -> Option<regex::Match<'_>> {
        pattern.find(&self.text)
    }

    /// Return the trimmed prompt line if the pattern matches.
    ///
    /// The prompt line runs from the start of the line containing the match
    /// up to the end of the match.
    pub fn find_prompt(&self, pattern: &Regex) -> Option<String> {
        self.search(pattern)
            .map(|m| prompt_line(&self.text, m.start(), m.end()).to_string())
    }

    /// Take ownership of the buffer contents and reset.
    pub fn take(&mut self) -> String {
        std::mem::take(&mut self.text)
    }

    /// Get the buffer contents.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Get the current buffer length in bytes.
    pub fn len(&self) -> usize {
        self.text.len()
    }

    /// Check if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Clear the buffer. Parser state is kept.
    pub fn clear(&mut self) {
        self.text.clear();
    }
}

impl Default for PatternBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for PatternBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PatternBuffer")
            .field("text", &self.text)
            .finish_non_exhaustive()
    }
}

/// `vte` performer that keeps printable characters and line control only.
struct Printable<'a> {
    out: &'a mut String,
}

impl Perform for Printable<'_> {
    fn print(&mut self, c: char) {
        self.out.push(c);
    }

    fn execute(&mut self, byte: u8) {
        if matches!(byte, b'\n' | b'\r' | b'\t') {
            self.out.push(byte as char);
        }
    }
}
