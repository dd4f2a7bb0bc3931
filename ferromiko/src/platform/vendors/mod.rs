//! Built-in vendor profiles.

pub mod cisco_ios;
pub mod cisco_nxos;
pub mod cisco_xr;
pub mod juniper;
pub mod linux;
