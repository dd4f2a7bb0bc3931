//! Prompt patterns and output normalization helpers.

use once_cell::sync::Lazy;
use regex::Regex;

/// Pattern shared by every vendor profile: a trailing run of non-space
/// characters ending in `#`, `>`, `$` or `%`.
pub const DEFAULT_PROMPT_PATTERN: &str = r"\S*[#>$%]\s*$";

/// Default configuration error pattern.
pub const DEFAULT_ERROR_PATTERN: &str = r"(?i)(?:Invalid|Incomplete|Ambiguous) command";

/// Compiled [`DEFAULT_PROMPT_PATTERN`].
pub static DEFAULT_PROMPT: Lazy<Regex> =
    Lazy::new(|| Regex::new(DEFAULT_PROMPT_PATTERN).expect("default prompt pattern is valid"));

/// The prompt the session currently synchronizes on.
///
/// A `PromptState` is never mutated: each detection builds a new value and
/// replaces the old one wholesale, so the base prompt and the pattern derived
/// from it cannot drift apart.
#[derive(Debug, Clone)]
pub struct PromptState {
    /// Literal prompt string last detected (may be empty in degraded mode).
    base: String,

    /// Active match pattern.
    pattern: Regex,
}

impl PromptState {
    /// Generic state: no literal prompt known, match on a vendor default.
    pub fn generic(pattern: &Regex) -> Self {
        Self {
            base: String::new(),
            pattern: pattern.clone(),
        }
    }

    /// Match exactly this prompt at the end of the output.
    pub fn literal(base: impl Into<String>) -> Result<Self, regex::Error> {
        let base = base.into();
        let pattern = Regex::new(&format!(r"{}\s*$", regex::escape(&base)))?;
        Ok(Self { base, pattern })
    }

    /// Match a prompt that starts with `base` and ends in a prompt terminator.
    ///
    /// Used when the stored prompt was truncated and no longer carries the
    /// device's terminator character.
    pub fn prefix(base: impl Into<String>) -> Result<Self, regex::Error> {
        let base = base.into();
        let pattern = Regex::new(&format!(r"{}\S*[#>$%]\s*$", regex::escape(&base)))?;
        Ok(Self { base, pattern })
    }

    /// Same pattern, new captured base prompt.
    pub fn with_base(&self, base: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            pattern: self.pattern.clone(),
        }
    }

    /// The literal prompt string.
    pub fn base(&self) -> &str {
        &self.base
    }

    /// The active pattern.
    pub fn pattern(&self) -> &Regex {
        &self.pattern
    }

    /// Whether the base prompt is usable for synchronization.
    pub fn is_discovered(&self) -> bool {
        self.base.chars().count() > 1
    }
}

/// Slice of `text` from the start of the line holding `start` to `end`, trimmed.
pub fn prompt_line(text: &str, start: usize, end: usize) -> &str {
    let line_start = line_start(text, start);
    text[line_start..end].trim()
}

fn line_start(text: &str, pos: usize) -> usize {
    text[..pos].rfind('\n').map_or(0, |i| i + 1)
}

/// Remove the echoed command line from the start of the output.
pub fn strip_command_echo(output: &str, command: &str) -> String {
    match Regex::new(&format!(r"^{}\s*\r?\n", regex::escape(command))) {
        Ok(echo) => echo.replace(output, "").into_owned(),
        Err(_) => output.to_string(),
    }
}

/// Remove the prompt line matched by `pattern` from the output.
pub fn strip_trailing_prompt(output: &str, pattern: &Regex) -> String {
    match pattern.find(output) {
        Some(m) => {
            let start = line_start(output, m.start());
            let mut stripped = String::with_capacity(output.len());
            stripped.push_str(&output[..start]);
            stripped.push_str(&output[m.end()..]);
            stripped
        }
        None => output.to_string(),
    }
}

/// Last non-empty line of the output, trimmed.
pub fn last_line(output: &str) -> &str {
    output
        .lines()
        .map(str::trim)
        .rfind(|line| !line.is_empty())
        .unwrap_or("")
}
