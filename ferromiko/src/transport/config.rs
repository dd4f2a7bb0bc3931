//! Transport settings derived from a device descriptor.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use serde::Deserialize;

/// What to do with the server's host key.
///
/// Deserializes from `"strict"`, `"accept_new"` or `"disabled"`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HostKeyVerification {
    /// Only hosts already listed in known_hosts are reachable.
    Strict,

    /// Unlisted hosts are recorded on first contact; a key that differs
    /// from the recorded one is refused.
    #[default]
    AcceptNew,

    /// No checks. Lab devices that are re-imaged often.
    Disabled,
}

/// Everything [`SshTransport::connect`](super::SshTransport::connect) needs.
///
/// Built by the driver from a [`DeviceDescriptor`](crate::DeviceDescriptor)
/// and the vendor profile; the terminal size comes from the profile.
#[derive(Debug)]
pub struct SshConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub auth: AuthMethod,

    /// Budget for TCP connect, key exchange and authentication together.
    pub timeout: Duration,

    /// PTY columns requested for the interactive shell.
    pub terminal_width: u32,

    /// PTY rows requested for the interactive shell.
    pub terminal_height: u32,

    pub host_key_verification: HostKeyVerification,

    /// Overrides `~/.ssh/known_hosts`.
    pub known_hosts_path: Option<PathBuf>,
}

impl SshConfig {
    /// `host:port`, used as the log tag for the connection.
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Credential presented to the device.
///
/// A key file wins over a password when a descriptor carries both.
#[derive(Debug)]
pub enum AuthMethod {
    Password(SecretString),

    /// OpenSSH or PEM private key on disk.
    PrivateKey {
        path: PathBuf,
        passphrase: Option<SecretString>,
    },
}
