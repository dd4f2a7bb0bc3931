//! Prompt-synchronized session over one interactive shell.

use std::time::Duration;

use log::{Level, debug, info, warn};
use regex::Regex;
use secrecy::ExposeSecret;

use super::builder::DeviceDescriptor;
use super::options::SendCommandOptions;
use super::privilege::Mode;
use crate::channel::{
    PromptState, PtyChannel, ReadMatch, last_line, strip_command_echo, strip_trailing_prompt,
};
use crate::error::{ChannelError, DriverError, Result};
use crate::platform::{DeviceType, SessionPreparation, VendorProfile};
use crate::transport::{ShellHandle, SshTransport};

/// Pause between writing a command and reading its output.
const SETTLE_DELAY: Duration = Duration::from_millis(50);

/// Pause after the prompt-probe newline.
const PROBE_SETTLE: Duration = Duration::from_millis(300);

/// Window drained while probing for the prompt.
const PROBE_WINDOW: Duration = Duration::from_millis(1500);

/// A live CLI session with one device.
///
/// The session owns the shell, the current prompt state and the mode
/// indicator. All operations take `&mut self`: one write/read cycle at a
/// time, and no cycle can start while another is pending.
///
/// ```rust,no_run
/// use ferromiko::{DeviceDescriptor, Session, platform::vendors};
///
/// # async fn example() -> Result<(), ferromiko::Error> {
/// let device = DeviceDescriptor::builder("192.0.2.1")
///     .username("admin")
///     .password("admin")
///     .device_type("cisco_ios")
///     .build()?;
///
/// let mut session = Session::new(device, vendors::cisco_ios::profile());
/// session.connect().await?;
/// let version = session.send_command("show version").await?;
/// println!("{}", version);
/// session.disconnect().await?;
/// # Ok(())
/// # }
/// ```
pub struct Session {
    pub(super) descriptor: DeviceDescriptor,
    pub(super) profile: VendorProfile,

    /// SSH connection (None when disconnected or driven by a raw shell).
    transport: Option<SshTransport>,

    /// Interactive shell (None when disconnected).
    channel: Option<PtyChannel>,

    /// Current prompt; replaced wholesale, never edited.
    pub(super) prompt: PromptState,

    pub(super) mode: Mode,

    /// Level for wire-level log lines.
    wire_level: Level,

    /// `user@host:port` tag for log lines.
    label: String,
}

impl Session {
    /// Create an unconnected session bound to a vendor profile.
    pub fn new(descriptor: DeviceDescriptor, profile: VendorProfile) -> Self {
        let wire_level = if descriptor.debug() {
            Level::Debug
        } else {
            Level::Trace
        };
        let label = descriptor.label();
        let prompt = PromptState::generic(&profile.prompt_pattern);

        Self {
            descriptor,
            profile,
            transport: None,
            channel: None,
            prompt,
            mode: Mode::Disconnected,
            wire_level,
            label,
        }
    }

    /// Connect, prepare the CLI and discover the prompt.
    ///
    /// On any failure after the shell opened, the session is closed again
    /// before the error is returned.
    pub async fn connect(&mut self) -> Result<()> {
        if self.channel.is_some() {
            return Err(DriverError::AlreadyConnected.into());
        }

        let config = self.descriptor.ssh_config(&self.profile)?;
        info!("{}: connecting", self.label);

        let transport = SshTransport::connect(config).await?;
        let shell = match transport.open_shell().await {
            Ok(channel) => ShellHandle::spawn(channel),
            Err(e) => {
                if let Err(close_err) = transport.close().await {
                    debug!("{}: close after shell failure: {}", self.label, close_err);
                }
                return Err(e);
            }
        };

        self.transport = Some(transport);
        self.open(shell).await
    }

    /// Run session setup over an already-open shell.
    pub(crate) async fn open(&mut self, shell: ShellHandle) -> Result<()> {
        self.attach(shell);

        if let Err(e) = self.prepare_and_discover().await {
            warn!("{}: session setup failed: {}", self.label, e);
            if let Err(close_err) = self.disconnect().await {
                debug!("{}: close after setup failure: {}", self.label, close_err);
            }
            return Err(e);
        }

        info!(
            "{}: connected, prompt {:?}, mode {:?}",
            self.label,
            self.prompt.base(),
            self.mode
        );
        Ok(())
    }

    /// Bind a shell without running any setup.
    pub(crate) fn attach(&mut self, shell: ShellHandle) {
        self.channel = Some(PtyChannel::new(shell, self.wire_level));
        self.prompt = PromptState::generic(&self.profile.prompt_pattern);
        self.mode = Mode::Normal;
    }

    async fn prepare_and_discover(&mut self) -> Result<()> {
        self.prepare().await?;
        self.set_base_prompt().await
    }

    /// Vendor session preparation: optional wake-up, then paging off.
    async fn prepare(&mut self) -> Result<()> {
        if let SessionPreparation::WakeThenDisablePaging { settle } = self.profile.preparation {
            tokio::time::sleep(self.scale(settle)).await;
            self.write_line("")?;
            let pattern = self.profile.prompt_pattern.clone();
            let timeout = self.read_timeout();
            self.read_until_prompt(&pattern, timeout).await?;
        }

        if let Some(command) = self.profile.paging_command.clone() {
            match self.send_command(&command).await {
                Ok(_) => debug!("{}: paging disabled", self.label),
                Err(e) if e.is_read_timeout() => {
                    warn!("{}: {:?} did not return a prompt: {}", self.label, command, e)
                }
                Err(e) => return Err(e),
            }
        }

        Ok(())
    }

    /// Discover the prompt and rebuild the active pattern from it.
    ///
    /// The profile's truncation applies here. A truncated prompt no longer
    /// ends in the device's terminator, so it is matched as a prefix.
    pub(crate) async fn set_base_prompt(&mut self) -> Result<()> {
        let prompt = self.find_prompt().await?;
        if prompt.is_empty() {
            return Ok(());
        }

        self.mode = self.mode_from_prompt(&prompt);

        let (base, truncated) = self.profile.truncate_prompt(&prompt);
        let state = if truncated {
            debug!("{}: prompt truncated to {:?}", self.label, base);
            PromptState::prefix(base)
        } else {
            PromptState::literal(base)
        };
        self.prompt = state.map_err(ChannelError::from)?;
        Ok(())
    }

    /// Return the device prompt.
    ///
    /// A usable cached prompt is returned without I/O. Otherwise a bare
    /// newline is written and the last non-empty line that comes back is
    /// taken as the prompt. If nothing usable arrives the session falls back
    /// to the profile's generic pattern and an empty string is returned.
    pub async fn find_prompt(&mut self) -> Result<String> {
        self.ensure_connected()?;

        if self.prompt.is_discovered() {
            return Ok(self.prompt.base().to_string());
        }

        match self.probe_prompt().await {
            Ok(line) if line.chars().count() > 1 => match PromptState::literal(line.as_str()) {
                Ok(state) => {
                    debug!("{}: found prompt {:?}", self.label, line);
                    self.prompt = state;
                    Ok(line)
                }
                Err(e) => Ok(self.fall_back_to_generic(&e.to_string())),
            },
            Ok(line) => Ok(self.fall_back_to_generic(&format!("no prompt in {:?}", line))),
            Err(e) => Ok(self.fall_back_to_generic(&e.to_string())),
        }
    }

    async fn probe_prompt(&mut self) -> Result<String> {
        self.write_line("")?;
        tokio::time::sleep(self.scale(PROBE_SETTLE)).await;
        let output = self.read_until_timeout(PROBE_WINDOW).await?;
        Ok(last_line(&output).to_string())
    }

    fn fall_back_to_generic(&mut self, reason: &str) -> String {
        warn!(
            "{}: prompt discovery failed ({}), using generic prompt pattern",
            self.label, reason
        );
        self.prompt = PromptState::generic(&self.profile.prompt_pattern);
        String::new()
    }

    /// Read until `pattern` matches, capturing the matched prompt line as
    /// the new base prompt.
    ///
    /// Returns everything collected, including the prompt.
    pub async fn read_until_prompt(&mut self, pattern: &Regex, timeout: Duration) -> Result<String> {
        let matched = self.read_match(pattern, timeout).await?;
        self.prompt = self.prompt.with_base(matched.prompt);
        Ok(matched.output)
    }

    /// Collect whatever the device sends during `window`.
    pub async fn read_until_timeout(&mut self, window: Duration) -> Result<String> {
        self.channel_mut()?.read_for(window).await
    }

    /// Send a command with default options and return its output.
    pub async fn send_command(&mut self, command: &str) -> Result<String> {
        self.send_command_with(command, &SendCommandOptions::default())
            .await
    }

    /// Send a command and return its output.
    ///
    /// Waits for `expect_string` if given, otherwise for the session
    /// prompt, for `read_timeout x delay_factor`. The echoed command and
    /// the trailing prompt are stripped as the options ask.
    pub async fn send_command_with(
        &mut self,
        command: &str,
        options: &SendCommandOptions,
    ) -> Result<String> {
        options.validate()?;
        let pattern = match &options.expect_string {
            Some(expect) => compile(expect)?,
            None => self.prompt.pattern().clone(),
        };
        self.send_command_until(command, &pattern, options).await
    }

    /// Send a command and wait for an already-compiled pattern.
    pub(crate) async fn send_command_until(
        &mut self,
        command: &str,
        pattern: &Regex,
        options: &SendCommandOptions,
    ) -> Result<String> {
        let settle = scaled(self.scale(SETTLE_DELAY), options.delay_factor);
        let timeout = scaled(self.read_timeout(), options.delay_factor);

        debug!("{}: send_command {:?}", self.label, command);
        self.discard_pending()?;
        self.write_line(command)?;
        tokio::time::sleep(settle).await;

        let mut output = self.read_until_prompt(pattern, timeout).await?;
        if options.strip_command {
            output = strip_command_echo(&output, command);
        }
        if options.strip_prompt {
            output = strip_trailing_prompt(&output, pattern);
        }
        Ok(output.trim().to_string())
    }

    /// Close the shell and the SSH connection.
    ///
    /// Safe to call more than once.
    pub async fn disconnect(&mut self) -> Result<()> {
        if let Some(mut channel) = self.channel.take() {
            channel.close().await;
        }

        let result = match self.transport.take() {
            Some(transport) => transport.close().await,
            None => Ok(()),
        };

        if self.mode != Mode::Disconnected {
            info!("{}: disconnected", self.label);
        }
        self.mode = Mode::Disconnected;
        self.prompt = PromptState::generic(&self.profile.prompt_pattern);
        result
    }

    /// Whether a shell is attached and writable, and the SSH connection
    /// (if any) is still up.
    pub fn is_connected(&self) -> bool {
        self.channel.as_ref().is_some_and(PtyChannel::is_open)
            && self.transport.as_ref().is_none_or(SshTransport::is_alive)
    }

    /// Last detected prompt (empty before discovery or in degraded mode).
    pub fn base_prompt(&self) -> &str {
        self.prompt.base()
    }

    /// Pattern currently used to detect the prompt.
    pub fn prompt_pattern(&self) -> &Regex {
        self.prompt.pattern()
    }

    /// Current CLI mode.
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Vendor profile in use.
    pub fn profile(&self) -> &VendorProfile {
        &self.profile
    }

    /// Device family.
    pub fn device_type(&self) -> DeviceType {
        self.profile.device_type
    }

    /// Descriptor this session was built from.
    pub fn descriptor(&self) -> &DeviceDescriptor {
        &self.descriptor
    }

    pub(crate) fn label(&self) -> &str {
        &self.label
    }

    pub(super) fn transport(&self) -> Option<&SshTransport> {
        self.transport.as_ref()
    }

    pub(crate) fn read_timeout(&self) -> Duration {
        self.descriptor.read_timeout()
    }

    /// Scale a built-in delay by the global delay factor.
    pub(crate) fn scale(&self, delay: Duration) -> Duration {
        scaled(delay, self.descriptor.global_delay_factor())
    }

    pub(crate) fn ensure_connected(&self) -> Result<()> {
        match self.channel {
            Some(_) => Ok(()),
            None => Err(DriverError::NotConnected.into()),
        }
    }

    fn channel_mut(&mut self) -> Result<&mut PtyChannel> {
        self.channel
            .as_mut()
            .ok_or_else(|| DriverError::NotConnected.into())
    }

    pub(crate) fn write_line(&mut self, line: &str) -> Result<()> {
        self.channel_mut()?.write_line(line)
    }

    /// Write the enable secret without logging it.
    pub(crate) fn write_secret(&mut self) -> Result<()> {
        let channel = self.channel.as_mut().ok_or(DriverError::NotConnected)?;
        let secret = self.descriptor.secret().ok_or_else(|| DriverError::InvalidConfig {
            message: "no enable secret configured".to_string(),
        })?;
        channel.write_hidden_line(secret.expose_secret())
    }

    pub(crate) fn discard_pending(&mut self) -> Result<()> {
        self.channel_mut()?.discard_pending();
        Ok(())
    }

    /// Read until `pattern` without touching the base prompt.
    ///
    /// Used for dialogs (password challenges, confirmations) whose matched
    /// line is not a prompt.
    pub(crate) async fn read_match(&mut self, pattern: &Regex, timeout: Duration) -> Result<ReadMatch> {
        self.channel_mut()?.read_until(pattern, timeout).await
    }

    /// Adopt a prompt line seen after a mode change.
    ///
    /// Rebuilds the literal pattern and re-derives the mode from it.
    pub(crate) fn adopt_prompt(&mut self, line: &str) -> Result<Mode> {
        self.prompt = PromptState::literal(line).map_err(ChannelError::from)?;
        self.mode = self.mode_from_prompt(line);
        debug!("{}: prompt {:?}, mode {:?}", self.label, line, self.mode);
        Ok(self.mode)
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if self.channel.is_some() {
            warn!("{}: session dropped without disconnect()", self.label);
        }
    }
}

/// `delay x factor`, saturating at `Duration::MAX`.
fn scaled(delay: Duration, factor: f64) -> Duration {
    Duration::try_from_secs_f64(delay.as_secs_f64() * factor).unwrap_or(Duration::MAX)
}

/// Compile a caller-supplied pattern.
pub(crate) fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| ChannelError::from(e).into())
}
