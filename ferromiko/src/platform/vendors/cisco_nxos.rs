//! Cisco NX-OS profile.

use crate::platform::{DeviceType, VendorProfile};

/// Create the Cisco NX-OS profile.
pub fn profile() -> VendorProfile {
    VendorProfile::generic(DeviceType::CiscoNxos).with_paging_command("terminal length 0")
}
