//! Vendor profile: the per-family strategy record.
//!
//! A profile is selected once when a session is dispatched and stays fixed
//! for the session's lifetime. Behavior that differs between families
//! (prompt truncation, config-mode detection, commit protocol, batch flow)
//! is carried as data and plain functions rather than through a type
//! hierarchy.

use std::time::Duration;

use regex::Regex;

use super::device_type::DeviceType;
use crate::channel::{DEFAULT_ERROR_PATTERN, DEFAULT_PROMPT};

/// Decides from a base prompt whether the device is in configuration mode.
pub type ConfigModeCheck = fn(&VendorProfile, &str) -> bool;

/// Config-mode check used by most families: the config prompt pattern
/// matches the base prompt.
pub fn default_config_mode_check(profile: &VendorProfile, prompt: &str) -> bool {
    profile
        .config_prompt_pattern
        .as_ref()
        .is_some_and(|pattern| pattern.is_match(prompt))
}

/// How privilege escalation is requested.
#[derive(Debug, Clone)]
pub struct EnableMethod {
    /// Command that starts escalation (e.g. `enable`).
    pub command: String,

    /// Pattern of the password challenge.
    pub password_prompt: Regex,

    /// Command that drops the escalation (e.g. `disable`).
    pub exit_command: String,
}

/// Work done right after the shell opens, before prompt discovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPreparation {
    /// Disable paging if the profile has a paging command.
    DisablePaging,

    /// Wait `settle` (delay-factor scaled), wake the CLI with a bare newline,
    /// read to the prompt, then disable paging.
    WakeThenDisablePaging { settle: Duration },
}

/// What `commit()` does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitProtocol {
    /// Nothing to commit; returns an empty string.
    None,

    /// Cisco XR two-phase commit with confirmation dialogs.
    CiscoXr,
}

/// How `send_config()` runs a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigBatch {
    /// Optional enable, optional config entry, commands, optional exits.
    Standard,

    /// Always enter config mode, run commands, commit, then exit.
    /// The enter/exit options are ignored.
    CommitThenExit,
}

/// How `exit_config_mode()` leaves configuration mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitConfigStyle {
    /// Write the exit command and read to the prompt.
    Plain,

    /// Answer `no` if the device asks about uncommitted changes.
    DeclineUncommitted,
}

/// Configuration-mode commands for families that have one.
#[derive(Debug, Clone)]
pub struct ConfigModeCommands {
    /// Default command to enter configuration mode.
    pub enter: String,

    /// Default command to leave configuration mode.
    pub exit: String,
}

/// Per-family parameters and behavior overrides.
#[derive(Debug, Clone)]
pub struct VendorProfile {
    /// Device family this profile serves.
    pub device_type: DeviceType,

    /// Prompt pattern used before a literal prompt is known.
    pub prompt_pattern: Regex,

    /// Configuration-mode prompt pattern (None: no config mode).
    pub config_prompt_pattern: Option<Regex>,

    /// Configuration-mode commands (None: no config mode).
    pub config_commands: Option<ConfigModeCommands>,

    /// Command that disables output paging.
    pub paging_command: Option<String>,

    /// Pattern that marks a configuration command as failed.
    pub error_pattern: Regex,

    /// Privilege escalation (None: no enable concept).
    pub enable: Option<EnableMethod>,

    /// Keep at most this many characters of a discovered prompt.
    pub prompt_truncation: Option<usize>,

    /// Config-mode detection.
    pub config_mode_check: ConfigModeCheck,

    /// Session preparation step.
    pub preparation: SessionPreparation,

    /// Commit semantics.
    pub commit: CommitProtocol,

    /// Configuration batch flow.
    pub config_batch: ConfigBatch,

    /// Exit-config flow.
    pub exit_config: ExitConfigStyle,

    /// Terminal width for PTY.
    pub terminal_width: u32,

    /// Terminal height for PTY.
    pub terminal_height: u32,
}

impl VendorProfile {
    /// Base profile: default prompt, Cisco-style config mode, no paging
    /// command, no commit.
    pub fn generic(device_type: DeviceType) -> Self {
        Self {
            device_type,
            prompt_pattern: DEFAULT_PROMPT.clone(),
            config_prompt_pattern: Some(
                Regex::new(r"\(config.*\)#\s*$").expect("config prompt pattern is valid"),
            ),
            config_commands: Some(ConfigModeCommands {
                enter: "configure terminal".to_string(),
                exit: "end".to_string(),
            }),
            paging_command: None,
            error_pattern: Regex::new(DEFAULT_ERROR_PATTERN).expect("error pattern is valid"),
            enable: Some(EnableMethod {
                command: "enable".to_string(),
                password_prompt: Regex::new(r"(?i)password:").expect("password pattern is valid"),
                exit_command: "disable".to_string(),
            }),
            prompt_truncation: None,
            config_mode_check: default_config_mode_check,
            preparation: SessionPreparation::DisablePaging,
            commit: CommitProtocol::None,
            config_batch: ConfigBatch::Standard,
            exit_config: ExitConfigStyle::Plain,
            terminal_width: 511,
            terminal_height: 24,
        }
    }

    /// Set the configuration prompt pattern.
    pub fn with_config_prompt(mut self, pattern: &str) -> Result<Self, regex::Error> {
        self.config_prompt_pattern = Some(Regex::new(pattern)?);
        Ok(self)
    }

    /// Set the configuration enter/exit commands.
    pub fn with_config_commands(mut self, enter: impl Into<String>, exit: impl Into<String>) -> Self {
        self.config_commands = Some(ConfigModeCommands {
            enter: enter.into(),
            exit: exit.into(),
        });
        self
    }

    /// Remove configuration mode entirely.
    pub fn without_config_mode(mut self) -> Self {
        self.config_prompt_pattern = None;
        self.config_commands = None;
        self
    }

    /// Set the paging-disable command.
    pub fn with_paging_command(mut self, command: impl Into<String>) -> Self {
        self.paging_command = Some(command.into());
        self
    }

    /// Set the configuration error pattern.
    pub fn with_error_pattern(mut self, pattern: &str) -> Result<Self, regex::Error> {
        self.error_pattern = Regex::new(pattern)?;
        Ok(self)
    }

    /// Set the privilege escalation method.
    pub fn with_enable(
        mut self,
        command: impl Into<String>,
        password_prompt: &str,
        exit_command: impl Into<String>,
    ) -> Result<Self, regex::Error> {
        self.enable = Some(EnableMethod {
            command: command.into(),
            password_prompt: Regex::new(password_prompt)?,
            exit_command: exit_command.into(),
        });
        Ok(self)
    }

    /// Remove privilege escalation.
    pub fn without_enable(mut self) -> Self {
        self.enable = None;
        self
    }

    /// Truncate discovered prompts to `max` characters.
    pub fn with_prompt_truncation(mut self, max: usize) -> Self {
        self.prompt_truncation = Some(max);
        self
    }

    /// Override config-mode detection.
    pub fn with_config_mode_check(mut self, check: ConfigModeCheck) -> Self {
        self.config_mode_check = check;
        self
    }

    /// Set the session preparation step.
    pub fn with_preparation(mut self, preparation: SessionPreparation) -> Self {
        self.preparation = preparation;
        self
    }

    /// Set the commit protocol.
    pub fn with_commit(mut self, commit: CommitProtocol) -> Self {
        self.commit = commit;
        self
    }

    /// Set the configuration batch flow.
    pub fn with_config_batch(mut self, batch: ConfigBatch) -> Self {
        self.config_batch = batch;
        self
    }

    /// Set the exit-config flow.
    pub fn with_exit_config(mut self, style: ExitConfigStyle) -> Self {
        self.exit_config = style;
        self
    }

    /// Set terminal dimensions.
    pub fn with_terminal_size(mut self, width: u32, height: u32) -> Self {
        self.terminal_width = width;
        self.terminal_height = height;
        self
    }

    /// Whether this family has a configuration mode.
    pub fn has_config_mode(&self) -> bool {
        self.config_commands.is_some() && self.config_prompt_pattern.is_some()
    }

    /// Run the profile's config-mode detection on a prompt.
    pub fn is_config_prompt(&self, prompt: &str) -> bool {
        (self.config_mode_check)(self, prompt)
    }

    /// Apply prompt truncation.
    ///
    /// Returns the (possibly shortened) prompt and whether characters were
    /// removed.
    pub fn truncate_prompt(&self, prompt: &str) -> (String, bool) {
        match self.prompt_truncation {
            Some(max) if prompt.chars().count() > max => (prompt.chars().take(max).collect(), true),
            _ => (prompt.to_string(), false),
        }
    }
}
