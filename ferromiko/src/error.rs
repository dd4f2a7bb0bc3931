//! Error types for ferromiko.
//!
//! Errors are layered the same way the session is: transport (connect and
//! authenticate), channel (reading the byte stream), driver (mode transitions,
//! configuration batches, commits) and platform (device type resolution).
//! Every variant renders to a human-readable message, since callers usually
//! surface the text as-is.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Main error type for ferromiko operations.
#[derive(Error, Debug)]
pub enum Error {
    /// SSH transport-level errors
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Channel operation errors
    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    /// Driver-level errors
    #[error("Driver error: {0}")]
    Driver(#[from] DriverError),

    /// Platform/vendor errors
    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),
}

impl Error {
    /// True if no prompt match arrived within the read window.
    pub fn is_read_timeout(&self) -> bool {
        matches!(self, Error::Channel(ChannelError::PatternTimeout { .. }))
    }

    /// True if a configuration command was rejected by the device.
    pub fn is_command_failure(&self) -> bool {
        matches!(self, Error::Driver(DriverError::CommandFailed { .. }))
    }

    /// True if a mode transition did not land in the expected mode.
    pub fn is_mode_transition(&self) -> bool {
        matches!(self, Error::Driver(DriverError::ModeTransition { .. }))
    }
}

/// Transport layer errors (SSH connection, authentication).
#[derive(Error, Debug)]
pub enum TransportError {
    /// Failed to connect to host
    #[error("Connection failed to {host}:{port}: {source}")]
    ConnectionFailed {
        host: String,
        port: u16,
        #[source]
        source: io::Error,
    },

    /// SSH handshake or protocol error
    #[error("SSH error: {0}")]
    Ssh(#[from] russh::Error),

    /// Authentication failed
    #[error("Authentication failed for user '{user}'")]
    AuthenticationFailed { user: String },

    /// Neither a password nor a private key was supplied
    #[error("Authentication method required: please provide either a password or SSH key.")]
    NoAuthMethod,

    /// The configured private key file does not exist
    #[error("Key file not found at path: {}", path.display())]
    KeyFileNotFound { path: PathBuf },

    /// SSH key error
    #[error("SSH key error: {0}")]
    Key(String),

    /// Host is not present in known_hosts (strict verification)
    #[error("Host key for {host}:{port} is not in known_hosts")]
    HostKeyUnknown { host: String, port: u16 },

    /// Host key differs from the one recorded in known_hosts
    #[error("Host key for {host}:{port} changed (known_hosts line {line})")]
    HostKeyChanged { host: String, port: u16, line: usize },

    /// known_hosts could not be read or written
    #[error("known_hosts error: {0}")]
    KnownHosts(String),

    /// SFTP subsystem error
    #[error("SFTP operation failed: {0}")]
    Sftp(String),

    /// Operation timed out
    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Channel layer errors (prompt matching over the shell byte stream).
#[derive(Error, Debug)]
pub enum ChannelError {
    /// No prompt match arrived within the allotted window
    #[error("Read timeout ({}ms) looking for prompt: {pattern}", timeout.as_millis())]
    PatternTimeout {
        pattern: String,
        timeout: Duration,
        /// Output collected before the deadline, possibly partial.
        received: String,
    },

    /// Channel closed unexpectedly
    #[error("Channel closed")]
    Closed,

    /// Invalid regex pattern
    #[error("Invalid regex pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}

/// Driver layer errors (command execution, mode transitions, commits).
#[derive(Error, Debug)]
pub enum DriverError {
    /// Session not connected
    #[error("Connection not established")]
    NotConnected,

    /// Session already connected
    #[error("Session already connected")]
    AlreadyConnected,

    /// A configuration command matched the error pattern
    #[error("Configuration failed: Error while sending command: \"{command}\"\nOutput: {output}")]
    CommandFailed { command: String, output: String },

    /// A mode transition did not reach the expected mode
    #[error("Failed to {action} (prompt: '{prompt}')")]
    ModeTransition { action: String, prompt: String },

    /// The device rejected a commit
    #[error("Commit failed with the following errors:\n\n{output}")]
    CommitFailed { output: String },

    /// Mutually exclusive or incomplete commit options
    #[error("Invalid arguments supplied to XR commit: {message}")]
    InvalidCommitOptions { message: String },

    /// Operation not available for this device family or caller request
    #[error("Unsupported operation: {operation}")]
    UnsupportedOperation { operation: String },

    /// Local source file for an upload does not exist
    #[error("Source file not found: {}", path.display())]
    SourceNotFound { path: PathBuf },

    /// Invalid configuration in the descriptor or options
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },
}

/// Platform/vendor definition errors.
#[derive(Error, Debug)]
pub enum PlatformError {
    /// Device type identifier has no vendor profile
    #[error("Unsupported device type: {name}")]
    UnsupportedDeviceType { name: String },
}

/// Result type alias using ferromiko's Error.
pub type Result<T> = std::result::Result<T, Error>;
