//! Linux host profile.
//!
//! Plain shells have no configuration mode. Configuration batches run
//! straight at the shell prompt, and privilege escalation goes through
//! `sudo`.

use crate::platform::{DeviceType, VendorProfile};

/// Create the Linux profile.
pub fn profile() -> VendorProfile {
    VendorProfile::generic(DeviceType::Linux)
        .without_config_mode()
        .with_error_pattern("command not found|No such file or directory|Permission denied")
        .and_then(|p| p.with_enable("sudo -s", r"[Pp]assword", "exit"))
        .expect("linux patterns are valid")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linux_profile() {
        let profile = profile();
        assert!(!profile.has_config_mode());
        assert!(profile.paging_command.is_none());
        assert!(profile.prompt_pattern.is_match("user@host:~$ "));
        assert!(profile.prompt_pattern.is_match("root@host:~# "));
    }

    #[test]
    fn test_linux_error_pattern() {
        let profile = profile();
        assert!(profile.error_pattern.is_match("bash: foo: command not found"));
        assert!(profile.error_pattern.is_match("cat: /x: No such file or directory"));
        assert!(profile.error_pattern.is_match("touch: /etc/x: Permission denied"));
        assert!(!profile.error_pattern.is_match("total 0"));
    }

    #[test]
    fn test_linux_escalation() {
        let enable = profile().enable.unwrap();
        assert_eq!(enable.command, "sudo -s");
        assert!(enable.password_prompt.is_match("[sudo] password for admin: "));
    }
}
