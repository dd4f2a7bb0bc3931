//! Device-type registry: resolves identifiers to profile constructors.

use std::collections::HashMap;

use once_cell::sync::Lazy;

use super::definition::VendorProfile;
use super::device_type::DeviceType;
use super::vendors;
use crate::error::{PlatformError, Result};

/// Builds a fresh vendor profile.
pub type ProfileConstructor = fn() -> VendorProfile;

/// Built-in profiles keyed by canonical identifier.
static REGISTRY: Lazy<HashMap<&'static str, ProfileConstructor>> = Lazy::new(|| {
    DeviceType::ALL
        .into_iter()
        .map(|device_type| (device_type.as_str(), constructor(device_type)))
        .collect()
});

/// Profile constructor for a known device type.
pub fn constructor(device_type: DeviceType) -> ProfileConstructor {
    match device_type {
        DeviceType::CiscoIos => vendors::cisco_ios::profile,
        DeviceType::CiscoXr => vendors::cisco_xr::profile,
        DeviceType::CiscoNxos => vendors::cisco_nxos::profile,
        DeviceType::JuniperJunos => vendors::juniper::profile,
        DeviceType::Linux => vendors::linux::profile,
    }
}

/// Resolve a device-type identifier.
///
/// Unknown identifiers fail with [`PlatformError::UnsupportedDeviceType`].
/// No network I/O happens here.
pub fn resolve(name: &str) -> Result<ProfileConstructor> {
    let device_type: DeviceType = name.parse()?;
    REGISTRY
        .get(device_type.as_str())
        .copied()
        .ok_or_else(|| {
            PlatformError::UnsupportedDeviceType {
                name: name.to_string(),
            }
            .into()
        })
}

/// Identifiers of every registered profile.
pub fn names() -> impl Iterator<Item = &'static str> {
    REGISTRY.keys().copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_device_type_resolves() {
        for device_type in DeviceType::ALL {
            let profile = resolve(device_type.as_str()).unwrap()();
            assert_eq!(profile.device_type, device_type);
        }
    }

    #[test]
    fn test_alias_resolves_to_linux() {
        let profile = resolve("linux_ssh").unwrap()();
        assert_eq!(profile.device_type, DeviceType::Linux);
    }

    #[test]
    fn test_unknown_identifier() {
        let err = resolve("hp_comware").err().unwrap();
        assert_eq!(
            err.to_string(),
            "Platform error: Unsupported device type: hp_comware"
        );
    }

    #[test]
    fn test_names() {
        let mut names: Vec<_> = names().collect();
        names.sort_unstable();
        assert_eq!(
            names,
            ["cisco_ios", "cisco_nxos", "cisco_xr", "juniper_junos", "linux"]
        );
    }
}
