//! CLI mode tracking and mode transitions.
//!
//! Modes form a short ladder: `Normal` -> `Enable` -> `Config`. Config mode
//! implies enable mode on families that escalate before configuration. The
//! mode is re-derived from the prompt after every transition, and each
//! transition verifies it landed where it meant to.

use log::{debug, info};

use super::session::{Session, compile};
use crate::error::{DriverError, Result};
use crate::platform::{ExitConfigStyle, vendors::cisco_xr};

/// Returned by [`Session::enable`] when escalation needs a secret and none
/// was configured.
pub const NO_SECRET_MESSAGE: &str = "No secret provided. Cannot enter enable mode.";

/// CLI mode of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Unprivileged exec mode.
    Normal,
    /// Privileged exec mode (`#` prompt).
    Enable,
    /// Configuration mode.
    Config,
    /// No shell attached.
    Disconnected,
}

impl Session {
    /// Whether the session is privileged.
    pub fn check_enable_mode(&self) -> bool {
        matches!(self.mode, Mode::Enable | Mode::Config)
    }

    /// Whether the session is in configuration mode.
    pub fn check_config_mode(&self) -> bool {
        self.mode == Mode::Config
    }

    /// Infer the mode a prompt line indicates.
    pub(crate) fn mode_from_prompt(&self, prompt: &str) -> Mode {
        if self.profile.has_config_mode() && self.profile.is_config_prompt(prompt) {
            Mode::Config
        } else if prompt.contains('#') {
            Mode::Enable
        } else {
            Mode::Normal
        }
    }

    /// Enter privileged mode.
    ///
    /// A no-op when already privileged or when the family has no enable
    /// concept. Without a configured secret this returns
    /// [`NO_SECRET_MESSAGE`] instead of attempting the password exchange.
    pub async fn enable(&mut self) -> Result<String> {
        self.ensure_connected()?;

        let Some(method) = self.profile.enable.clone() else {
            debug!("{}: {} has no enable mode", self.label(), self.device_type());
            return Ok(String::new());
        };
        if self.check_enable_mode() {
            return Ok(String::new());
        }
        if !self.descriptor.has_secret() {
            return Ok(NO_SECRET_MESSAGE.to_string());
        }

        info!("{}: entering enable mode", self.label());
        let timeout = self.read_timeout();

        self.discard_pending()?;
        self.write_line(&method.command)?;
        let mut output = self.read_match(&method.password_prompt, timeout).await?.output;

        self.write_secret()?;
        let pattern = self.profile.prompt_pattern.clone();
        let reply = self.read_match(&pattern, timeout).await?;
        output.push_str(&reply.output);

        if !matches!(self.adopt_prompt(&reply.prompt)?, Mode::Enable | Mode::Config) {
            return Err(DriverError::ModeTransition {
                action: "enter enable mode".to_string(),
                prompt: reply.prompt,
            }
            .into());
        }
        Ok(output)
    }

    /// Leave privileged mode (default command from the profile, e.g.
    /// `disable`). A no-op unless the session is in enable mode.
    pub async fn exit_enable_mode(&mut self, command: Option<&str>) -> Result<String> {
        self.ensure_connected()?;

        let Some(method) = self.profile.enable.clone() else {
            return Ok(String::new());
        };
        if self.mode != Mode::Enable {
            return Ok(String::new());
        }

        let command = command.unwrap_or(method.exit_command.as_str());
        info!("{}: leaving enable mode", self.label());

        self.discard_pending()?;
        self.write_line(command)?;
        let pattern = self.profile.prompt_pattern.clone();
        let reply = self.read_match(&pattern, self.read_timeout()).await?;

        if self.adopt_prompt(&reply.prompt)? != Mode::Normal {
            return Err(DriverError::ModeTransition {
                action: "exit enable mode".to_string(),
                prompt: reply.prompt,
            }
            .into());
        }
        Ok(reply.output)
    }

    /// Enter configuration mode.
    ///
    /// `command` overrides the profile's entry command and `expect` the
    /// config prompt pattern. A no-op when already in configuration mode.
    pub async fn config_mode(&mut self, command: Option<&str>, expect: Option<&str>) -> Result<String> {
        self.ensure_connected()?;

        let (Some(commands), Some(config_prompt)) = (
            self.profile.config_commands.clone(),
            self.profile.config_prompt_pattern.clone(),
        ) else {
            return Err(DriverError::UnsupportedOperation {
                operation: format!("configuration mode on {}", self.device_type()),
            }
            .into());
        };
        if self.check_config_mode() {
            return Ok(String::new());
        }

        let pattern = match expect {
            Some(expect) => compile(expect)?,
            None => config_prompt,
        };
        let command = command.unwrap_or(commands.enter.as_str());
        info!("{}: entering configuration mode", self.label());

        self.discard_pending()?;
        self.write_line(command)?;
        let reply = self.read_match(&pattern, self.read_timeout()).await?;

        if self.adopt_prompt(&reply.prompt)? != Mode::Config {
            return Err(DriverError::ModeTransition {
                action: "enter configuration mode".to_string(),
                prompt: reply.prompt,
            }
            .into());
        }
        Ok(reply.output)
    }

    /// Leave configuration mode.
    ///
    /// A no-op when not in configuration mode. On XR an "uncommitted
    /// changes" question is answered `no`.
    pub async fn exit_config_mode(&mut self, command: Option<&str>, expect: Option<&str>) -> Result<String> {
        match self.profile.exit_config {
            ExitConfigStyle::DeclineUncommitted => cisco_xr::exit_config_mode(self, command, expect).await,
            ExitConfigStyle::Plain => self.exit_config_plain(command, expect).await,
        }
    }

    async fn exit_config_plain(&mut self, command: Option<&str>, expect: Option<&str>) -> Result<String> {
        self.ensure_connected()?;

        let Some(commands) = self.profile.config_commands.clone() else {
            return Err(DriverError::UnsupportedOperation {
                operation: format!("configuration mode on {}", self.device_type()),
            }
            .into());
        };
        if !self.check_config_mode() {
            return Ok(String::new());
        }

        let pattern = match expect {
            Some(expect) => compile(expect)?,
            None => self.profile.prompt_pattern.clone(),
        };
        let command = command.unwrap_or(commands.exit.as_str());
        info!("{}: leaving configuration mode", self.label());

        self.discard_pending()?;
        self.write_line(command)?;
        let reply = self.read_match(&pattern, self.read_timeout()).await?;

        if self.adopt_prompt(&reply.prompt)? == Mode::Config {
            return Err(DriverError::ModeTransition {
                action: "exit configuration mode".to_string(),
                prompt: reply.prompt,
            }
            .into());
        }
        Ok(reply.output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::vendors;
    use crate::testing::{
        descriptor, descriptor_with_secret, mock_device, open_session, respond_with_prompt,
    };

    /// IOS-like device that tracks its own mode.
    fn ios_device(secret: &'static str) -> impl FnMut(&str) -> Option<String> + Send + 'static {
        let mut prompt = "router>".to_string();
        let mut awaiting_secret = false;
        move |line| {
            if awaiting_secret {
                awaiting_secret = false;
                if line == secret {
                    prompt = "router#".to_string();
                    return Some(format!("\r\n{}", prompt));
                }
                return Some(format!("\r\n% Access denied\r\n\r\n{}", prompt));
            }
            match line {
                "enable" => {
                    awaiting_secret = true;
                    Some("enable\r\nPassword: ".to_string())
                }
                "disable" => {
                    prompt = "router>".to_string();
                    Some(format!("disable\r\n{}", prompt))
                }
                "configure terminal" => {
                    prompt = "router(config)#".to_string();
                    Some(format!(
                        "configure terminal\r\nEnter configuration commands, one per line.  End with CNTL/Z.\r\n{}",
                        prompt
                    ))
                }
                "end" => {
                    prompt = "router#".to_string();
                    Some(format!("end\r\n{}", prompt))
                }
                other => Some(format!("{}\r\n{}", other, prompt)),
            }
        }
    }

    #[tokio::test]
    async fn test_enable_without_secret_returns_message() {
        let (shell, device) = mock_device(ios_device("s3cret"));
        let mut session = open_session(descriptor("cisco_ios"), vendors::cisco_ios::profile(), shell)
            .await
            .unwrap();
        assert_eq!(session.mode(), Mode::Normal);

        let writes_before = device.writes().len();
        assert_eq!(session.enable().await.unwrap(), NO_SECRET_MESSAGE);
        assert_eq!(device.writes().len(), writes_before);
        session.disconnect().await.unwrap();
    }

    #[tokio::test]
    async fn test_enable_and_exit() {
        let (shell, device) = mock_device(ios_device("s3cret"));
        let mut session = open_session(
            descriptor_with_secret("cisco_ios", "s3cret"),
            vendors::cisco_ios::profile(),
            shell,
        )
        .await
        .unwrap();

        session.enable().await.unwrap();
        assert_eq!(session.mode(), Mode::Enable);
        assert_eq!(session.base_prompt(), "router#");
        assert!(device.writes().contains(&"s3cret".to_string()));

        // Already enabled: no I/O
        let writes = device.writes().len();
        assert_eq!(session.enable().await.unwrap(), "");
        assert_eq!(device.writes().len(), writes);

        session.exit_enable_mode(None).await.unwrap();
        assert_eq!(session.mode(), Mode::Normal);
        assert_eq!(session.base_prompt(), "router>");
        session.disconnect().await.unwrap();
    }

    #[tokio::test]
    async fn test_enable_wrong_secret_fails_transition() {
        let (shell, _device) = mock_device(ios_device("s3cret"));
        let mut session = open_session(
            descriptor_with_secret("cisco_ios", "wrong"),
            vendors::cisco_ios::profile(),
            shell,
        )
        .await
        .unwrap();

        let err = session.enable().await.unwrap_err();
        assert!(err.is_mode_transition());
        assert_eq!(
            err.to_string(),
            "Driver error: Failed to enter enable mode (prompt: 'router>')"
        );
        session.disconnect().await.unwrap();
    }

    #[tokio::test]
    async fn test_config_mode_round_trip() {
        let (shell, _device) = mock_device(ios_device("s3cret"));
        let mut session = open_session(
            descriptor_with_secret("cisco_ios", "s3cret"),
            vendors::cisco_ios::profile(),
            shell,
        )
        .await
        .unwrap();
        session.enable().await.unwrap();

        session.config_mode(None, None).await.unwrap();
        assert!(session.check_config_mode());
        assert_eq!(session.base_prompt(), "router(config)#");

        // Second call is a no-op
        assert_eq!(session.config_mode(None, None).await.unwrap(), "");

        session.exit_config_mode(None, None).await.unwrap();
        assert_eq!(session.mode(), Mode::Enable);
        assert_eq!(session.base_prompt(), "router#");
        session.disconnect().await.unwrap();
    }

    #[tokio::test]
    async fn test_exit_config_mode_not_reached() {
        let (shell, device) = mock_device(|line| match line {
            "configure terminal" => Some(format!("{}\r\nrouter(config)#", line)),
            "end" => Some("end\r\n% Configuration locked\r\nrouter(config)#".to_string()),
            other => Some(format!("{}\r\nrouter#", other)),
        });
        let mut session = open_session(descriptor("cisco_ios"), vendors::cisco_ios::profile(), shell)
            .await
            .unwrap();
        session.config_mode(None, None).await.unwrap();

        let err = session.exit_config_mode(None, None).await.unwrap_err();
        assert!(err.is_mode_transition());
        assert_eq!(
            err.to_string(),
            "Driver error: Failed to exit configuration mode (prompt: 'router(config)#')"
        );
        assert!(session.check_config_mode());
        assert_eq!(device.writes().last().unwrap(), "end");
        session.disconnect().await.unwrap();
    }

    #[tokio::test]
    async fn test_exit_enable_mode_not_reached() {
        let (shell, device) = mock_device(respond_with_prompt("router#"));
        let mut session = open_session(
            descriptor_with_secret("cisco_ios", "s3cret"),
            vendors::cisco_ios::profile(),
            shell,
        )
        .await
        .unwrap();
        assert_eq!(session.mode(), Mode::Enable);

        let err = session.exit_enable_mode(None).await.unwrap_err();
        assert!(err.is_mode_transition());
        assert_eq!(
            err.to_string(),
            "Driver error: Failed to exit enable mode (prompt: 'router#')"
        );
        assert_eq!(session.mode(), Mode::Enable);
        assert_eq!(device.writes().last().unwrap(), "disable");
        session.disconnect().await.unwrap();
    }

    #[tokio::test]
    async fn test_config_mode_not_reached() {
        let (shell, _device) = mock_device(respond_with_prompt("router#"));
        let mut session = open_session(descriptor("cisco_ios"), vendors::cisco_ios::profile(), shell)
            .await
            .unwrap();

        let err = session
            .config_mode(Some("configure bogus"), Some(r"#\s*$"))
            .await
            .unwrap_err();
        assert!(err.is_mode_transition());
        assert!(err.to_string().contains("Failed to enter configuration mode"));
        session.disconnect().await.unwrap();
    }

    #[tokio::test]
    async fn test_linux_has_no_config_mode() {
        let (shell, _device) = mock_device(respond_with_prompt("user@host:~$"));
        let mut session = open_session(descriptor("linux"), vendors::linux::profile(), shell)
            .await
            .unwrap();

        let err = session.config_mode(None, None).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Driver error: Unsupported operation: configuration mode on linux"
        );
        session.disconnect().await.unwrap();
    }

    #[tokio::test]
    async fn test_junos_enable_is_noop() {
        let (shell, device) = mock_device(respond_with_prompt("admin@mx1>"));
        let mut session = open_session(
            descriptor_with_secret("juniper_junos", "s3cret"),
            vendors::juniper::profile(),
            shell,
        )
        .await
        .unwrap();

        let writes = device.writes().len();
        assert_eq!(session.enable().await.unwrap(), "");
        assert_eq!(device.writes().len(), writes);
        session.disconnect().await.unwrap();
    }
}
