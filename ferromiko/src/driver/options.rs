//! Per-call options for commands, configuration batches and commits.

use std::time::Duration;

use crate::error::{DriverError, Result};

/// Largest accepted delay factor.
pub(crate) const MAX_DELAY_FACTOR: f64 = 100.0;

/// Default read timeout for XR commits.
pub const DEFAULT_COMMIT_TIMEOUT: Duration = Duration::from_secs(120);

/// Options for [`Session::send_command_with`](super::Session::send_command_with).
#[derive(Debug, Clone)]
pub struct SendCommandOptions {
    /// Regex to wait for instead of the session prompt.
    pub expect_string: Option<String>,

    /// Remove the trailing prompt from the output.
    pub strip_prompt: bool,

    /// Remove the echoed command line from the output.
    pub strip_command: bool,

    /// Multiplier for this call's settle delay and read timeout.
    pub delay_factor: f64,
}

impl Default for SendCommandOptions {
    fn default() -> Self {
        Self {
            expect_string: None,
            strip_prompt: true,
            strip_command: true,
            delay_factor: 1.0,
        }
    }
}

impl SendCommandOptions {
    /// Default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for `pattern` instead of the session prompt.
    pub fn expect_string(mut self, pattern: impl Into<String>) -> Self {
        self.expect_string = Some(pattern.into());
        self
    }

    /// Keep or strip the trailing prompt.
    pub fn strip_prompt(mut self, strip: bool) -> Self {
        self.strip_prompt = strip;
        self
    }

    /// Keep or strip the echoed command.
    pub fn strip_command(mut self, strip: bool) -> Self {
        self.strip_command = strip;
        self
    }

    /// Scale this call's delays.
    pub fn delay_factor(mut self, factor: f64) -> Self {
        self.delay_factor = factor;
        self
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if !(self.delay_factor > 0.0 && self.delay_factor <= MAX_DELAY_FACTOR) {
            return Err(DriverError::InvalidConfig {
                message: format!(
                    "delay factor must be in (0, {}], got {}",
                    MAX_DELAY_FACTOR, self.delay_factor
                ),
            }
            .into());
        }
        Ok(())
    }
}

/// Options for [`Session::send_config`](super::Session::send_config).
#[derive(Debug, Clone)]
pub struct ConfigOptions {
    /// Regex that marks a command as rejected (defaults to the profile's).
    pub error_pattern: Option<String>,

    /// Command used to enter configuration mode (defaults to the profile's).
    pub config_mode_command: Option<String>,

    /// Enter configuration mode before the batch.
    pub enter_config_mode: bool,

    /// Leave configuration mode (and any escalation made for the batch)
    /// afterwards.
    pub exit_config_mode: bool,
}

impl Default for ConfigOptions {
    fn default() -> Self {
        Self {
            error_pattern: None,
            config_mode_command: None,
            enter_config_mode: true,
            exit_config_mode: true,
        }
    }
}

impl ConfigOptions {
    /// Default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the error pattern.
    pub fn error_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.error_pattern = Some(pattern.into());
        self
    }

    /// Override the config-mode entry command.
    pub fn config_mode_command(mut self, command: impl Into<String>) -> Self {
        self.config_mode_command = Some(command.into());
        self
    }

    /// Enter configuration mode before the batch.
    pub fn enter_config_mode(mut self, enter: bool) -> Self {
        self.enter_config_mode = enter;
        self
    }

    /// Leave configuration mode after the batch.
    pub fn exit_config_mode(mut self, exit: bool) -> Self {
        self.exit_config_mode = exit;
        self
    }
}

/// Options for [`Session::commit`](super::Session::commit).
///
/// `confirm` needs `confirm_delay` and the reverse; `comment` cannot be
/// combined with `confirm`.
#[derive(Debug, Clone)]
pub struct CommitOptions {
    /// Commit with automatic rollback unless confirmed.
    pub confirm: bool,

    /// Seconds before an unconfirmed commit rolls back.
    pub confirm_delay: Option<u32>,

    /// Commit comment.
    pub comment: Option<String>,

    /// Commit label.
    pub label: Option<String>,

    /// How long to wait for the commit to finish.
    pub read_timeout: Duration,
}

impl Default for CommitOptions {
    fn default() -> Self {
        Self {
            confirm: false,
            confirm_delay: None,
            comment: None,
            label: None,
            read_timeout: DEFAULT_COMMIT_TIMEOUT,
        }
    }
}

impl CommitOptions {
    /// Plain `commit`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Commit with rollback after `delay` seconds unless confirmed.
    pub fn confirmed(mut self, delay: u32) -> Self {
        self.confirm = true;
        self.confirm_delay = Some(delay);
        self
    }

    /// Attach a comment.
    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into()).filter(|c| !c.is_empty());
        self
    }

    /// Attach a label.
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into()).filter(|l| !l.is_empty());
        self
    }

    /// Override the commit read timeout.
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }
}
