//! Channel layer for prompt matching over the shell byte stream.
//!
//! This module handles the read side of a session: accumulating output,
//! stripping terminal control sequences, and resolving "has the device
//! finished responding" by regex match against the buffer.

mod buffer;
mod patterns;
mod pty;

pub use buffer::PatternBuffer;
pub use patterns::{
    DEFAULT_ERROR_PATTERN, DEFAULT_PROMPT, DEFAULT_PROMPT_PATTERN, PromptState, last_line,
    prompt_line, strip_command_echo, strip_trailing_prompt,
};
pub use pty::{PtyChannel, ReadMatch, deadline_after};
