//! Cisco IOS / IOS-XE profile.

use crate::platform::{DeviceType, VendorProfile};

/// Create the Cisco IOS profile.
pub fn profile() -> VendorProfile {
    VendorProfile::generic(DeviceType::CiscoIos).with_paging_command("terminal length 0")
}
