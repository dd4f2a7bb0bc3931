//! Vendor profiles for the supported device families.
//!
//! A [`VendorProfile`] is an immutable record of per-family parameters
//! (prompt shapes, paging, error pattern, escalation) and behavior
//! selectors (preparation, config-mode check, commit protocol, batch flow).
//! Profiles are resolved from a device-type identifier through the
//! [`registry`].

mod definition;
mod device_type;
pub mod registry;
pub mod vendors;

pub use definition::{
    CommitProtocol, ConfigBatch, ConfigModeCheck, ConfigModeCommands, EnableMethod,
    ExitConfigStyle, SessionPreparation, VendorProfile, default_config_mode_check,
};
pub use device_type::DeviceType;
pub use registry::{ProfileConstructor, resolve};
