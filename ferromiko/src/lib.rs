//! # Ferromiko
//!
//! Async prompt-driven SSH session engine for network device automation.
//!
//! Ferromiko opens an interactive shell on a device, synchronizes every
//! command on the device prompt, and drives the CLI through its modes
//! (exec, enable, configuration) the way netmiko does.
//!
//! ## Features
//!
//! - Async SSH connections via russh
//! - Vendor profiles for Cisco IOS, IOS-XR, NX-OS, Juniper Junos and Linux
//! - Prompt discovery with per-vendor truncation (IOS-XR)
//! - Enable / configuration mode transitions verified against the prompt
//! - Configuration batches that stop at the first rejected line
//! - IOS-XR two-phase commit with confirmed, label and comment variants
//! - SFTP file transfer on the same connection
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ferromiko::{ConfigOptions, DeviceDescriptor};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), ferromiko::Error> {
//!     let device = DeviceDescriptor::builder("192.0.2.1")
//!         .username("admin")
//!         .password("secret")
//!         .device_type("cisco_ios")
//!         .build()?;
//!
//!     let mut session = ferromiko::connect(device).await?;
//!
//!     let output = session.send_command("show ip interface brief").await?;
//!     println!("{}", output);
//!
//!     session
//!         .send_config(&["interface Loopback0", "description managed"], &ConfigOptions::default())
//!         .await?;
//!
//!     session.disconnect().await?;
//!     Ok(())
//! }
//! ```

pub mod channel;
pub mod driver;
pub mod error;
pub mod platform;
pub mod transport;

#[cfg(test)]
mod testing;

// Re-export main types for convenience
pub use driver::{
    CommitOptions, ConfigOptions, DescriptorBuilder, DeviceDescriptor, Mode, Operation,
    SendCommandOptions, Session, TransferDirection, connect, with_connection,
};
pub use error::{Error, Result};
pub use platform::{DeviceType, VendorProfile};
pub use transport::{AuthMethod, HostKeyVerification, SshConfig};
