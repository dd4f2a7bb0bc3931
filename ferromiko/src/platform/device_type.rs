//! Supported device-type identifiers.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use crate::error::PlatformError;

/// Device family a session talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub enum DeviceType {
    CiscoIos,
    CiscoXr,
    CiscoNxos,
    JuniperJunos,
    Linux,
}

impl DeviceType {
    /// Every supported device type.
    pub const ALL: [DeviceType; 5] = [
        DeviceType::CiscoIos,
        DeviceType::CiscoXr,
        DeviceType::CiscoNxos,
        DeviceType::JuniperJunos,
        DeviceType::Linux,
    ];

    /// Canonical identifier (e.g. `cisco_xr`).
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceType::CiscoIos => "cisco_ios",
            DeviceType::CiscoXr => "cisco_xr",
            DeviceType::CiscoNxos => "cisco_nxos",
            DeviceType::JuniperJunos => "juniper_junos",
            DeviceType::Linux => "linux",
        }
    }
}

impl FromStr for DeviceType {
    type Err = PlatformError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "cisco_ios" => Ok(DeviceType::CiscoIos),
            "cisco_xr" => Ok(DeviceType::CiscoXr),
            "cisco_nxos" => Ok(DeviceType::CiscoNxos),
            "juniper_junos" => Ok(DeviceType::JuniperJunos),
            "linux" | "linux_ssh" => Ok(DeviceType::Linux),
            other => Err(PlatformError::UnsupportedDeviceType {
                name: other.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for DeviceType {
    type Error = PlatformError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_names() {
        for device_type in DeviceType::ALL {
            assert_eq!(device_type.as_str().parse::<DeviceType>().unwrap(), device_type);
        }
    }

    #[test]
    fn test_linux_ssh_alias() {
        assert_eq!("linux_ssh".parse::<DeviceType>().unwrap(), DeviceType::Linux);
    }

    #[test]
    fn test_unknown_type() {
        let err = "arista_eos".parse::<DeviceType>().unwrap_err();
        assert!(matches!(
            err,
            PlatformError::UnsupportedDeviceType { ref name } if name == "arista_eos"
        ));
    }
}
