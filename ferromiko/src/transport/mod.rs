//! SSH transport layer wrapping russh.
//!
//! This module provides the low-level SSH connection management:
//! connection setup, authentication, the interactive shell byte channel,
//! and the SFTP subsystem used for file transfer.

pub mod config;
mod shell;
mod ssh;

pub use config::{AuthMethod, HostKeyVerification, SshConfig};
pub use shell::ShellHandle;
pub use ssh::SshTransport;
