//! Configuration batches and commits.

use log::{debug, info};
use regex::Regex;

use super::options::{CommitOptions, ConfigOptions, SendCommandOptions};
use super::session::{Session, compile};
use crate::error::{DriverError, Result};
use crate::platform::{CommitProtocol, ConfigBatch, vendors::cisco_xr};

impl Session {
    /// Send a batch of configuration commands.
    ///
    /// Standard flow: escalate if a secret is set and the session is not
    /// privileged, enter config mode (unless disabled or the family has
    /// none), send each line, then leave config mode and any escalation made
    /// here. Each line's output is checked against the error pattern; the
    /// first match aborts the batch with [`DriverError::CommandFailed`].
    /// Lines already sent are not rolled back.
    ///
    /// XR always enters config mode, commits the batch and exits; the
    /// enter/exit options are ignored there.
    ///
    /// Returns the raw output of the batch lines, concatenated as received.
    /// Mode transitions around the batch are not part of it on the
    /// standard flow; XR includes its config, commit and exit exchanges.
    pub async fn send_config<S: AsRef<str>>(
        &mut self,
        commands: &[S],
        options: &ConfigOptions,
    ) -> Result<String> {
        self.ensure_connected()?;

        let error_pattern = match &options.error_pattern {
            Some(pattern) => compile(pattern)?,
            None => self.profile.error_pattern.clone(),
        };

        info!("{}: sending {} config line(s)", self.label(), commands.len());
        match self.profile.config_batch {
            ConfigBatch::CommitThenExit => cisco_xr::send_config(self, commands, &error_pattern).await,
            ConfigBatch::Standard => self.send_config_batch(commands, options, &error_pattern).await,
        }
    }

    /// Send newline-separated configuration text; blank lines are skipped.
    pub async fn send_config_str(&mut self, commands: &str, options: &ConfigOptions) -> Result<String> {
        let lines = config_lines(commands);
        self.send_config(&lines, options).await
    }

    /// Commit staged configuration.
    ///
    /// Families without a candidate configuration return an empty string.
    pub async fn commit(&mut self, options: &CommitOptions) -> Result<String> {
        match self.profile.commit {
            CommitProtocol::CiscoXr => cisco_xr::commit(self, options).await,
            CommitProtocol::None => {
                self.ensure_connected()?;
                debug!("{}: {} has no commit step", self.label(), self.device_type());
                Ok(String::new())
            }
        }
    }

    async fn send_config_batch<S: AsRef<str>>(
        &mut self,
        commands: &[S],
        options: &ConfigOptions,
        error_pattern: &Regex,
    ) -> Result<String> {
        let mut escalated = false;
        if self.descriptor.has_secret() && self.profile.enable.is_some() && !self.check_enable_mode() {
            self.enable().await?;
            escalated = true;
        }

        if options.enter_config_mode && self.profile.has_config_mode() {
            let command = options.config_mode_command.as_deref();
            self.config_mode(command, None).await?;
        }

        let expect = match (&self.profile.config_prompt_pattern, self.check_config_mode()) {
            (Some(config_prompt), true) => config_prompt.clone(),
            _ => self.profile.prompt_pattern.clone(),
        };
        let output = self.run_config_lines(commands, &expect, error_pattern).await?;

        if options.exit_config_mode {
            if self.check_config_mode() {
                self.exit_config_mode(None, None).await?;
            }
            if escalated {
                self.exit_enable_mode(None).await?;
            }
        }

        Ok(output)
    }

    /// Send each line, waiting for `expect`, and stop at the first line
    /// whose output matches `error_pattern`.
    pub(crate) async fn run_config_lines<S: AsRef<str>>(
        &mut self,
        commands: &[S],
        expect: &Regex,
        error_pattern: &Regex,
    ) -> Result<String> {
        let options = SendCommandOptions::new().strip_prompt(false).strip_command(false);
        let mut output = String::new();

        for command in commands {
            let command = command.as_ref();
            let reply = self.send_command_until(command, expect, &options).await?;

            if error_pattern.is_match(&reply) {
                return Err(DriverError::CommandFailed {
                    command: command.to_string(),
                    output: reply,
                }
                .into());
            }

            output.push_str(&reply);
        }

        Ok(output)
    }
}

/// Split configuration text into non-blank lines.
pub(crate) fn config_lines(text: &str) -> Vec<&str> {
    text.lines()
        .map(|line| line.trim_end_matches('\r'))
        .filter(|line| !line.trim().is_empty())
        .collect()
}
