//! Scoped sessions and the operation names used by orchestration input.

use std::fmt;
use std::str::FromStr;

use futures_util::future::BoxFuture;
use log::warn;

use super::builder::DeviceDescriptor;
use super::config::config_lines;
use super::dispatch;
use super::options::ConfigOptions;
use super::session::Session;
use crate::error::{DriverError, Error, Result};

/// Connect, run `task`, and disconnect whatever the task returned.
///
/// If both the task and the disconnect fail, the task's error is returned.
///
/// ```rust,no_run
/// use ferromiko::{DeviceDescriptor, with_connection};
///
/// # async fn example() -> Result<(), ferromiko::Error> {
/// let device = DeviceDescriptor::builder("192.0.2.1")
///     .username("admin")
///     .password("admin")
///     .device_type("cisco_nxos")
///     .build()?;
///
/// let version = with_connection(device, |session| {
///     Box::pin(async move { session.send_command("show version").await })
/// })
/// .await?;
/// # Ok(())
/// # }
/// ```
pub async fn with_connection<T, F>(descriptor: DeviceDescriptor, task: F) -> Result<T>
where
    F: for<'s> FnOnce(&'s mut Session) -> BoxFuture<'s, Result<T>>,
{
    let session = dispatch::connect(descriptor).await?;
    run_scoped(session, task).await
}

pub(crate) async fn run_scoped<T, F>(mut session: Session, task: F) -> Result<T>
where
    F: for<'s> FnOnce(&'s mut Session) -> BoxFuture<'s, Result<T>>,
{
    let result = task(&mut session).await;

    match (result, session.disconnect().await) {
        (Ok(value), Ok(())) => Ok(value),
        (Ok(_), Err(e)) => Err(e),
        (Err(e), Ok(())) => Err(e),
        (Err(e), Err(close_err)) => {
            warn!("{}: disconnect after failed task: {}", session.label(), close_err);
            Err(e)
        }
    }
}

/// Session operation named by orchestration input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    SendCommand,
    SendConfig,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::SendCommand => "send_command",
            Operation::SendConfig => "send_config",
        }
    }

    /// Run this operation with `commands` on an open session.
    ///
    /// `send_command` sends the text as one command. `send_config` splits
    /// it on newlines and sends the non-blank lines as one batch with
    /// default options.
    pub async fn execute(&self, session: &mut Session, commands: &str) -> Result<String> {
        match self {
            Operation::SendCommand => session.send_command(commands).await,
            Operation::SendConfig => {
                let lines = config_lines(commands);
                session.send_config(&lines, &ConfigOptions::default()).await
            }
        }
    }
}

impl FromStr for Operation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "send_command" => Ok(Operation::SendCommand),
            "send_config" => Ok(Operation::SendConfig),
            other => Err(DriverError::UnsupportedOperation {
                operation: other.to_string(),
            }
            .into()),
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
