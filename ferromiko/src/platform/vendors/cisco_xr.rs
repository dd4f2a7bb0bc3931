//! Cisco IOS-XR profile and its two-phase commit protocol.
//!
//! XR stages configuration in a candidate that only takes effect on
//! `commit`. The commit can raise two dialogs:
//!
//! - a large-changeset confirmation (`... [confirm]`), answered `y`
//! - a conflict with commits from other sessions
//!   (`Do you wish to proceed with this commit anyway? [no]`), answered `no`,
//!   after which the commit is reported as failed
//!
//! Leaving config mode with staged changes prompts about uncommitted
//! changes; that question is answered `no` so nothing is applied by
//! accident.
//!
//! Prompts look like `RP/0/RSP0/CPU0:NAME#` and are truncated to 31
//! characters at discovery.

use std::time::Duration;

use log::{info, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use tokio::time::Instant;

use crate::channel::{deadline_after, strip_command_echo};
use crate::driver::{CommitOptions, Mode, Session};
use crate::error::{DriverError, Result};
use crate::platform::{
    CommitProtocol, ConfigBatch, DeviceType, ExitConfigStyle, SessionPreparation, VendorProfile,
};

/// Discovered prompts are cut to this many characters.
pub const PROMPT_TRUNCATION: usize = 31;

/// Reply marker of a failed commit.
const ERROR_MARKER: &str = "Failed to";

/// Reply marker of a conflict with other configuration sessions.
const CONFLICT_MARKER: &str = "One or more commits have occurred from other";

/// Reply marker of the large-changeset confirmation.
const LARGE_CONFIG_MARKER: &str = "onfirm";

/// Question asked when other sessions committed in the meantime.
const PROCEED_MARKER: &str = "Do you wish to proceed";

static COMMIT_REPLY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:#\s*$|onfirm|Do you wish to proceed)").expect("commit reply pattern is valid")
});

static HASH_PROMPT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"#\s*$").expect("hash prompt pattern is valid"));

static UNCOMMITTED_OR_PROMPT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:Uncommitted|#\s*$)").expect("exit pattern is valid"));

/// Create the Cisco IOS-XR profile.
pub fn profile() -> VendorProfile {
    VendorProfile::generic(DeviceType::CiscoXr)
        .with_config_prompt(r"\(config[^)]*\)#\s*$")
        .expect("xr config prompt pattern is valid")
        .with_paging_command("terminal length 0")
        .with_prompt_truncation(PROMPT_TRUNCATION)
        .with_config_mode_check(config_mode_check)
        .with_preparation(SessionPreparation::WakeThenDisablePaging {
            settle: Duration::from_millis(500),
        })
        .with_commit(CommitProtocol::CiscoXr)
        .with_config_batch(ConfigBatch::CommitThenExit)
        .with_exit_config(ExitConfigStyle::DeclineUncommitted)
}

/// XR config-mode check.
///
/// `(admin)` is removed first so the admin exec prompt `...(admin)#` is not
/// mistaken for a config prompt.
pub fn config_mode_check(_profile: &VendorProfile, prompt: &str) -> bool {
    prompt.replace("(admin)", "").contains(")#")
}

/// Build the commit command line, validating the option combination.
pub fn commit_command(options: &CommitOptions) -> Result<String> {
    let invalid = |message: &str| -> crate::Error {
        DriverError::InvalidCommitOptions {
            message: message.to_string(),
        }
        .into()
    };

    let comment = options.comment.as_deref().filter(|c| !c.is_empty());
    let label = options.label.as_deref().filter(|l| !l.is_empty());

    if options.confirm && options.confirm_delay.is_none() {
        return Err(invalid("confirm requires confirm_delay"));
    }
    if options.confirm_delay.is_some() && !options.confirm {
        return Err(invalid("confirm_delay requires confirm"));
    }
    if comment.is_some() && options.confirm {
        return Err(invalid("comment and confirm are mutually exclusive"));
    }

    let confirmed = options.confirm_delay.filter(|_| options.confirm);
    let command = match (label, comment, confirmed) {
        (Some(label), Some(comment), _) => format!("commit label {} comment {}", label, comment),
        (Some(label), None, Some(delay)) => format!("commit label {} confirmed {}", label, delay),
        (Some(label), None, None) => format!("commit label {}", label),
        (None, _, Some(delay)) => format!("commit confirmed {}", delay),
        (None, Some(comment), None) => format!("commit comment {}", comment),
        (None, None, None) => "commit".to_string(),
    };
    Ok(command)
}

/// Commit the candidate configuration.
///
/// Options are validated before anything is written. Enters config mode if
/// needed and stays there afterwards.
pub(crate) async fn commit(session: &mut Session, options: &CommitOptions) -> Result<String> {
    let command = commit_command(options)?;
    session.ensure_connected()?;

    let mut output = session.config_mode(None, None).await?;
    let deadline = deadline_after(options.read_timeout);

    info!("{}: {}", session.label(), command);
    session.discard_pending()?;
    session.write_line(&command)?;
    let reply = read_commit_reply(session, &command, deadline).await?;
    output.push_str(&reply);

    if reply.contains(CONFLICT_MARKER) || reply.contains(PROCEED_MARKER) {
        warn!("{}: commit conflicts with other sessions, declining", session.label());
        session.write_line("no")?;
        let pattern = config_prompt(session);
        let tail = session.read_match(&pattern, remaining(deadline)).await?;
        output.push_str(&tail.output);
        return Err(DriverError::CommitFailed { output }.into());
    }

    if reply.contains(LARGE_CONFIG_MARKER) {
        info!("{}: confirming large commit", session.label());
        session.write_line("y")?;
        let tail = session.read_match(&HASH_PROMPT, remaining(deadline)).await?;
        output.push_str(&tail.output);
    }

    if output.contains(ERROR_MARKER) {
        return Err(DriverError::CommitFailed { output }.into());
    }
    Ok(output)
}

/// Read the reply to the commit command with the echo removed.
///
/// The echoed command can itself contain a marker (`commit confirmed 60`
/// holds `onfirm`), so a match only counts once the echo line is complete
/// and the marker appears in what follows it.
async fn read_commit_reply(session: &mut Session, command: &str, deadline: Instant) -> Result<String> {
    let mut raw = String::new();
    loop {
        let chunk = session.read_match(&COMMIT_REPLY, remaining(deadline)).await?;
        raw.push_str(&chunk.output);

        let echo_pending = !raw.contains('\n') && command.starts_with(raw.trim());
        let reply = strip_command_echo(&raw, command);
        if !echo_pending && COMMIT_REPLY.is_match(&reply) {
            return Ok(reply);
        }
    }
}

/// Leave config mode, declining to commit staged changes.
pub(crate) async fn exit_config_mode(
    session: &mut Session,
    command: Option<&str>,
    expect: Option<&str>,
) -> Result<String> {
    session.ensure_connected()?;
    if !session.check_config_mode() {
        return Ok(String::new());
    }

    let command = command.unwrap_or("end");
    let timeout = session.read_timeout();

    session.discard_pending()?;
    session.write_line(command)?;
    let first = session.read_match(&UNCOMMITTED_OR_PROMPT, timeout).await?;
    let mut output = first.output;

    let prompt = if output.contains("Uncommitted") {
        warn!("{}: discarding uncommitted changes", session.label());
        session.write_line("no")?;
        let pattern = match expect {
            Some(expect) => crate::driver::compile(expect)?,
            None => session.profile().prompt_pattern.clone(),
        };
        let tail = session.read_match(&pattern, timeout).await?;
        output.push_str(&tail.output);
        tail.prompt
    } else {
        first.prompt
    };

    if session.adopt_prompt(&prompt)? == Mode::Config {
        return Err(DriverError::ModeTransition {
            action: "exit configuration mode".to_string(),
            prompt,
        }
        .into());
    }
    Ok(output)
}

/// XR configuration batch: config mode, commands, commit, exit.
///
/// Always enters and leaves config mode; the batch is committed before
/// leaving.
pub(crate) async fn send_config<S: AsRef<str>>(
    session: &mut Session,
    commands: &[S],
    error_pattern: &Regex,
) -> Result<String> {
    let mut output = session.config_mode(None, None).await?;

    let pattern = config_prompt(session);
    output.push_str(&session.run_config_lines(commands, &pattern, error_pattern).await?);
    output.push_str(&commit(session, &CommitOptions::default()).await?);
    output.push_str(&exit_config_mode(session, None, None).await?);
    Ok(output)
}

fn config_prompt(session: &Session) -> Regex {
    session
        .profile()
        .config_prompt_pattern
        .clone()
        .unwrap_or_else(|| HASH_PROMPT.clone())
}

fn remaining(deadline: Instant) -> Duration {
    deadline.saturating_duration_since(Instant::now())
}
