//! Session layer: prompt synchronization, modes, configuration and commits.
//!
//! A [`Session`] is bound to one [`VendorProfile`](crate::platform::VendorProfile)
//! chosen from the descriptor's device type. Every operation is a
//! write-then-read cycle that completes when the device prompt (or an
//! explicit expect pattern) shows up at the end of the output.

mod builder;
mod config;
mod dispatch;
mod options;
mod privilege;
mod scoped;
mod session;
mod transfer;

pub use builder::{DescriptorBuilder, DeviceDescriptor};
pub use dispatch::{connect, session_for};
pub use options::{CommitOptions, ConfigOptions, DEFAULT_COMMIT_TIMEOUT, SendCommandOptions};
pub use privilege::{Mode, NO_SECRET_MESSAGE};
pub use scoped::{Operation, with_connection};
pub use session::Session;
pub use transfer::TransferDirection;

pub(crate) use session::compile;
