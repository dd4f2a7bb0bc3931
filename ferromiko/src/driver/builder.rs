//! Device descriptor and its builder.

use std::path::{Path, PathBuf};
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer};

use super::options::MAX_DELAY_FACTOR;
use crate::error::{DriverError, Result, TransportError};
use crate::platform::{DeviceType, VendorProfile};
use crate::transport::config::{AuthMethod, HostKeyVerification, SshConfig};

const DEFAULT_PORT: u16 = 22;
const DEFAULT_CONN_TIMEOUT: Duration = Duration::from_millis(20_000);
const DEFAULT_READ_TIMEOUT: Duration = Duration::from_millis(10_000);

/// Upper bound for the connect and read timeouts.
const MAX_TIMEOUT: Duration = Duration::from_secs(86_400);

/// Everything needed to reach and drive one device.
///
/// Immutable once built. Construct it with [`DeviceDescriptor::builder`] or
/// deserialize it from orchestration input:
///
/// ```rust
/// use ferromiko::DeviceDescriptor;
///
/// # fn example() -> Result<(), ferromiko::Error> {
/// let device = DeviceDescriptor::builder("192.0.2.1")
///     .username("admin")
///     .password("admin")
///     .secret("enable-secret")
///     .device_type("cisco_ios")
///     .build()?;
/// assert_eq!(device.port(), 22);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Deserialize)]
#[serde(try_from = "DescriptorBuilder")]
pub struct DeviceDescriptor {
    host: String,
    port: u16,
    username: String,
    password: Option<SecretString>,
    private_key_path: Option<PathBuf>,
    passphrase: Option<SecretString>,
    secret: Option<SecretString>,
    device_type: DeviceType,
    conn_timeout: Duration,
    read_timeout: Duration,
    global_delay_factor: f64,
    debug: bool,
    host_key_verification: HostKeyVerification,
    known_hosts_path: Option<PathBuf>,
}

impl DeviceDescriptor {
    /// Start building a descriptor for `host`.
    pub fn builder(host: impl Into<String>) -> DescriptorBuilder {
        DescriptorBuilder::new(host)
    }

    /// Target host.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// SSH port.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Login user.
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Device family.
    pub fn device_type(&self) -> DeviceType {
        self.device_type
    }

    /// TCP connect, handshake and authentication budget.
    pub fn conn_timeout(&self) -> Duration {
        self.conn_timeout
    }

    /// Default prompt read timeout.
    pub fn read_timeout(&self) -> Duration {
        self.read_timeout
    }

    /// Multiplier applied to built-in delays.
    pub fn global_delay_factor(&self) -> f64 {
        self.global_delay_factor
    }

    /// Whether wire-level logging is raised to debug.
    pub fn debug(&self) -> bool {
        self.debug
    }

    /// Whether an enable secret was supplied.
    pub fn has_secret(&self) -> bool {
        self.secret.is_some()
    }

    pub(crate) fn secret(&self) -> Option<&SecretString> {
        self.secret.as_ref()
    }

    /// `user@host:port`, used to tag log lines.
    pub fn label(&self) -> String {
        format!("{}@{}:{}", self.username, self.host, self.port)
    }

    /// Transport configuration for this device.
    ///
    /// Fails before any network I/O when no credential is usable.
    pub(crate) fn ssh_config(&self, profile: &VendorProfile) -> Result<SshConfig> {
        let auth = if let Some(path) = &self.private_key_path {
            if !path.exists() {
                return Err(TransportError::KeyFileNotFound { path: path.clone() }.into());
            }
            AuthMethod::PrivateKey {
                path: path.clone(),
                passphrase: self.passphrase.as_ref().map(copy_secret),
            }
        } else if let Some(password) = &self.password {
            AuthMethod::Password(copy_secret(password))
        } else {
            return Err(TransportError::NoAuthMethod.into());
        };

        Ok(SshConfig {
            host: self.host.clone(),
            port: self.port,
            username: self.username.clone(),
            auth,
            timeout: self.conn_timeout,
            terminal_width: profile.terminal_width,
            terminal_height: profile.terminal_height,
            host_key_verification: self.host_key_verification,
            known_hosts_path: self.known_hosts_path.clone(),
        })
    }
}

fn copy_secret(secret: &SecretString) -> SecretString {
    SecretString::from(secret.expose_secret().to_owned())
}

/// Builder for [`DeviceDescriptor`].
///
/// Field names accept both snake_case and camelCase when deserialized.
/// Timeouts are given in milliseconds, and empty secrets count as absent.
#[derive(Debug, Deserialize)]
pub struct DescriptorBuilder {
    host: String,

    #[serde(default = "default_port")]
    port: u16,

    #[serde(default)]
    username: Option<String>,

    #[serde(default, deserialize_with = "optional_secret")]
    password: Option<SecretString>,

    #[serde(default, alias = "privateKeyPath", alias = "key_file", alias = "keyFile")]
    private_key_path: Option<PathBuf>,

    #[serde(default, deserialize_with = "optional_secret")]
    passphrase: Option<SecretString>,

    #[serde(default, deserialize_with = "optional_secret")]
    secret: Option<SecretString>,

    #[serde(default, alias = "deviceType")]
    device_type: Option<String>,

    #[serde(
        rename = "conn_timeout_ms",
        alias = "connTimeoutMs",
        default = "default_conn_timeout",
        deserialize_with = "duration_ms"
    )]
    conn_timeout: Duration,

    #[serde(
        rename = "read_timeout_ms",
        alias = "readTimeoutMs",
        default = "default_read_timeout",
        deserialize_with = "duration_ms"
    )]
    read_timeout: Duration,

    #[serde(default = "default_delay_factor", alias = "globalDelayFactor")]
    global_delay_factor: f64,

    #[serde(default)]
    debug: bool,

    #[serde(default, alias = "hostKeyVerification")]
    host_key_verification: HostKeyVerification,

    #[serde(default, alias = "knownHostsPath")]
    known_hosts_path: Option<PathBuf>,
}

impl DescriptorBuilder {
    /// New builder with defaults (port 22, 20s connect, 10s read, factor 1).
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_PORT,
            username: None,
            password: None,
            private_key_path: None,
            passphrase: None,
            secret: None,
            device_type: None,
            conn_timeout: DEFAULT_CONN_TIMEOUT,
            read_timeout: DEFAULT_READ_TIMEOUT,
            global_delay_factor: 1.0,
            debug: false,
            host_key_verification: HostKeyVerification::default(),
            known_hosts_path: None,
        }
    }

    /// Set the SSH port.
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the login user.
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Authenticate with a password.
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(SecretString::from(password.into()));
        self
    }

    /// Authenticate with a private key file.
    pub fn private_key(mut self, path: impl Into<PathBuf>) -> Self {
        self.private_key_path = Some(path.into());
        self
    }

    /// Passphrase for an encrypted private key.
    pub fn passphrase(mut self, passphrase: impl Into<String>) -> Self {
        self.passphrase = Some(SecretString::from(passphrase.into()));
        self
    }

    /// Enable secret.
    pub fn secret(mut self, secret: impl Into<String>) -> Self {
        self.secret = Some(SecretString::from(secret.into()));
        self
    }

    /// Device type identifier (e.g. `cisco_xr`); checked by `build()`.
    pub fn device_type(mut self, device_type: impl Into<String>) -> Self {
        self.device_type = Some(device_type.into());
        self
    }

    /// Connection timeout.
    pub fn conn_timeout(mut self, timeout: Duration) -> Self {
        self.conn_timeout = timeout;
        self
    }

    /// Default read timeout.
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Global delay factor.
    pub fn global_delay_factor(mut self, factor: f64) -> Self {
        self.global_delay_factor = factor;
        self
    }

    /// Raise wire-level logging to debug.
    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Host key verification mode.
    pub fn host_key_verification(mut self, mode: HostKeyVerification) -> Self {
        self.host_key_verification = mode;
        self
    }

    /// Custom known_hosts file.
    pub fn known_hosts_path(mut self, path: impl AsRef<Path>) -> Self {
        self.known_hosts_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Validate and build the descriptor.
    ///
    /// An unknown device type fails here with
    /// [`PlatformError::UnsupportedDeviceType`](crate::error::PlatformError),
    /// before anything touches the network.
    pub fn build(self) -> Result<DeviceDescriptor> {
        if self.host.trim().is_empty() {
            return Err(invalid("host is required"));
        }

        let username = self
            .username
            .filter(|u| !u.is_empty())
            .ok_or_else(|| invalid("username is required"))?;

        let device_type: DeviceType = self
            .device_type
            .as_deref()
            .ok_or_else(|| invalid("device type is required"))?
            .parse()?;

        if !(self.global_delay_factor > 0.0 && self.global_delay_factor <= MAX_DELAY_FACTOR) {
            return Err(invalid(&format!(
                "global delay factor must be in (0, {}], got {}",
                MAX_DELAY_FACTOR, self.global_delay_factor
            )));
        }

        for (name, timeout) in [("conn", self.conn_timeout), ("read", self.read_timeout)] {
            if timeout.is_zero() || timeout > MAX_TIMEOUT {
                return Err(invalid(&format!(
                    "{} timeout must be between 1ms and {:?}, got {:?}",
                    name, MAX_TIMEOUT, timeout
                )));
            }
        }

        Ok(DeviceDescriptor {
            host: self.host,
            port: self.port,
            username,
            password: self.password,
            private_key_path: self.private_key_path,
            passphrase: self.passphrase,
            secret: self.secret,
            device_type,
            conn_timeout: self.conn_timeout,
            read_timeout: self.read_timeout,
            global_delay_factor: self.global_delay_factor,
            debug: self.debug,
            host_key_verification: self.host_key_verification,
            known_hosts_path: self.known_hosts_path,
        })
    }
}

impl TryFrom<DescriptorBuilder> for DeviceDescriptor {
    type Error = crate::Error;

    fn try_from(builder: DescriptorBuilder) -> Result<Self> {
        builder.build()
    }
}

fn invalid(message: &str) -> crate::Error {
    DriverError::InvalidConfig {
        message: message.to_string(),
    }
    .into()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_conn_timeout() -> Duration {
    DEFAULT_CONN_TIMEOUT
}

fn default_read_timeout() -> Duration {
    DEFAULT_READ_TIMEOUT
}

fn default_delay_factor() -> f64 {
    1.0
}

fn duration_ms<'de, D>(deserializer: D) -> std::result::Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    u64::deserialize(deserializer).map(Duration::from_millis)
}

fn optional_secret<'de, D>(deserializer: D) -> std::result::Result<Option<SecretString>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<String> = Option::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.is_empty()).map(SecretString::from))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::vendors;

    #[test]
    fn test_builder_defaults() {
        let device = DeviceDescriptor::builder("10.0.0.1")
            .username("admin")
            .password("pw")
            .device_type("cisco_ios")
            .build()
            .unwrap();

        assert_eq!(device.port(), 22);
        assert_eq!(device.conn_timeout(), Duration::from_secs(20));
        assert_eq!(device.read_timeout(), Duration::from_secs(10));
        assert_eq!(device.global_delay_factor(), 1.0);
        assert!(!device.debug());
        assert!(!device.has_secret());
        assert_eq!(device.label(), "admin@10.0.0.1:22");
    }

    #[test]
    fn test_builder_rejects_unknown_device_type() {
        let err = DeviceDescriptor::builder("10.0.0.1")
            .username("admin")
            .password("pw")
            .device_type("vyos")
            .build()
            .unwrap_err();
        assert_eq!(err.to_string(), "Platform error: Unsupported device type: vyos");
    }

    #[test]
    fn test_builder_rejects_bad_delay_factor() {
        let err = DeviceDescriptor::builder("10.0.0.1")
            .username("admin")
            .password("pw")
            .device_type("linux")
            .global_delay_factor(0.0)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("global delay factor"));
    }

    #[test]
    fn test_builder_rejects_huge_delay_factor() {
        let err = DeviceDescriptor::builder("10.0.0.1")
            .username("admin")
            .password("pw")
            .device_type("cisco_ios")
            .global_delay_factor(1e300)
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            crate::Error::Driver(DriverError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_builder_rejects_out_of_range_timeouts() {
        let err = DeviceDescriptor::builder("10.0.0.1")
            .username("admin")
            .password("pw")
            .device_type("cisco_ios")
            .read_timeout(Duration::MAX)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("read timeout must be between"));

        let err = DeviceDescriptor::builder("10.0.0.1")
            .username("admin")
            .password("pw")
            .device_type("cisco_ios")
            .conn_timeout(Duration::ZERO)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("conn timeout must be between"));
    }

    #[test]
    fn test_deserialize_rejects_overflowing_timeout() {
        let json = r#"{"host": "h", "username": "u", "password": "p",
            "device_type": "cisco_ios", "read_timeout_ms": 18446744073709551615}"#;
        let err = serde_json::from_str::<DeviceDescriptor>(json).unwrap_err();
        assert!(err.to_string().contains("read timeout must be between"));
    }

    #[test]
    fn test_builder_requires_username() {
        let err = DeviceDescriptor::builder("10.0.0.1")
            .password("pw")
            .device_type("linux")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("username is required"));
    }

    #[test]
    fn test_no_auth_method() {
        let device = DeviceDescriptor::builder("10.0.0.1")
            .username("admin")
            .device_type("cisco_ios")
            .build()
            .unwrap();
        let err = device.ssh_config(&vendors::cisco_ios::profile()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Transport error: Authentication method required: please provide either a password or SSH key."
        );
    }

    #[test]
    fn test_missing_key_file() {
        let device = DeviceDescriptor::builder("10.0.0.1")
            .username("admin")
            .private_key("/nonexistent/ferromiko/id_ed25519")
            .device_type("linux")
            .build()
            .unwrap();
        let err = device.ssh_config(&vendors::linux::profile()).unwrap_err();
        assert!(err.to_string().contains("Key file not found at path"));
    }

    #[test]
    fn test_ssh_config_uses_profile_terminal() {
        let device = DeviceDescriptor::builder("10.0.0.1")
            .port(2222)
            .username("admin")
            .password("pw")
            .device_type("cisco_xr")
            .build()
            .unwrap();
        let config = device.ssh_config(&vendors::cisco_xr::profile()).unwrap();
        assert_eq!(config.socket_addr(), "10.0.0.1:2222");
        assert_eq!(config.terminal_width, 511);
        assert!(matches!(config.auth, AuthMethod::Password(_)));
    }

    #[test]
    fn test_deserialize_camel_case() {
        let json = r#"{
            "host": "192.0.2.10",
            "username": "netops",
            "password": "pw",
            "secret": "",
            "deviceType": "juniper_junos",
            "connTimeoutMs": 5000,
            "readTimeoutMs": 30000,
            "globalDelayFactor": 2,
            "debug": true
        }"#;
        let device: DeviceDescriptor = serde_json::from_str(json).unwrap();
        assert_eq!(device.device_type(), DeviceType::JuniperJunos);
        assert_eq!(device.conn_timeout(), Duration::from_secs(5));
        assert_eq!(device.read_timeout(), Duration::from_secs(30));
        assert_eq!(device.global_delay_factor(), 2.0);
        assert!(device.debug());
        assert!(!device.has_secret());
    }

    #[test]
    fn test_deserialize_snake_case_defaults() {
        let json = r#"{"host": "h", "username": "u", "password": "p", "device_type": "linux_ssh"}"#;
        let device: DeviceDescriptor = serde_json::from_str(json).unwrap();
        assert_eq!(device.device_type(), DeviceType::Linux);
        assert_eq!(device.port(), 22);
        assert_eq!(device.read_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_deserialize_unknown_device_type() {
        let json = r#"{"host": "h", "username": "u", "password": "p", "device_type": "foo"}"#;
        let err = serde_json::from_str::<DeviceDescriptor>(json).unwrap_err();
        assert!(err.to_string().contains("Unsupported device type: foo"));
    }
}
