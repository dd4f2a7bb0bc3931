//! Juniper JunOS profile.

use crate::platform::{DeviceType, VendorProfile};

/// Error messages JunOS prints for rejected configuration lines.
const JUNOS_ERRORS: &str = r"unknown command|syntax error|error:|missing argument|is ambiguous";

/// Create the Juniper JunOS profile.
///
/// Operational mode prompts end in `>`, configuration mode in `#`.
/// JunOS has no enable concept, and commits are left to the caller's
/// own `commit` lines in the batch.
///
/// Leaving with `exit configuration-mode` while the candidate holds
/// uncommitted changes makes JunOS ask "Exit with uncommitted changes?
/// [yes,no]". That question is not answered here, so a batch that stages
/// changes without a `commit` line ends in a read timeout. Include
/// `commit` (or `rollback`) as the last line, or pass
/// `exit_config_mode(false)` and leave config mode yourself.
pub fn profile() -> VendorProfile {
    VendorProfile::generic(DeviceType::JuniperJunos)
        .with_config_prompt(r"#\s*$")
        .and_then(|p| p.with_error_pattern(JUNOS_ERRORS))
        .expect("junos patterns are valid")
        .with_config_commands("configure", "exit configuration-mode")
        .with_paging_command("set cli screen-length 0")
        .without_enable()
}
