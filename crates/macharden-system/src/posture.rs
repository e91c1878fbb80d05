//! Read-only posture checks with no apply path: System Integrity Protection
//! and FileVault.

use macharden_core::{ProbeResult, ProbeState};

use crate::parse::parse_switch;
use crate::runner::CommandRunner;

const FILEVAULT_SETTINGS_URL: &str =
    "x-apple.systempreferences:com.apple.preference.security?FileVault";

/// `csrutil status`. SIP can only be changed from recovery mode.
pub fn integrity_protection(runner: &dyn CommandRunner) -> ProbeResult {
    read_status(runner, "csrutil", &["status"])
}

/// `fdesetup status`. In-progress encryption reports as `unknown`.
pub fn disk_encryption(runner: &dyn CommandRunner) -> ProbeResult {
    read_status(runner, "fdesetup", &["status"])
}

/// Open the FileVault settings pane for the operator. Never toggles encryption.
pub fn open_encryption_settings(runner: &dyn CommandRunner) -> bool {
    match runner.run("open", &[FILEVAULT_SETTINGS_URL]) {
        Ok(out) if out.success() => true,
        Ok(out) => {
            tracing::warn!(detail = %out.detail(), "Could not open FileVault settings");
            false
        }
        Err(e) => {
            tracing::warn!(error = %e, "Could not open FileVault settings");
            false
        }
    }
}

fn read_status(runner: &dyn CommandRunner, program: &str, args: &[&str]) -> ProbeResult {
    match runner.run(program, args) {
        Ok(out) if out.success() => {
            let text = out.stdout.trim().to_string();
            let first_line = text.lines().next().unwrap_or_default();
            ProbeResult::new(parse_switch(first_line), text)
        }
        Ok(out) => ProbeResult::new(ProbeState::Unknown, out.detail()),
        Err(e) => ProbeResult::unknown(e.to_string()),
    }
}
