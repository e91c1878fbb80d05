//! Sharing services: Screen Sharing (launchd) and Remote Management (ARD).
//!
//! The policy only ever asks these to turn off, and only when the probe says
//! they are running. The enable paths exist so `apply` is total.

use std::sync::Arc;

use macharden_core::reconcile::SubsystemControl;
use macharden_core::{CollaboratorError, ProbeResult, ProbeState, Subsystem, Switch};

use super::require;
use crate::runner::{run_checked, CommandRunner};

const LAUNCHCTL: &str = "launchctl";
const SCREENSHARING_TARGET: &str = "system/com.apple.screensharing";
const SCREENSHARING_PLIST: &str = "/System/Library/LaunchDaemons/com.apple.screensharing.plist";

pub const KICKSTART: &str =
    "/System/Library/CoreServices/RemoteManagement/ARDAgent.app/Contents/Resources/kickstart";

pub struct ScreenSharingControl {
    runner: Arc<dyn CommandRunner>,
}

impl ScreenSharingControl {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }
}

impl SubsystemControl for ScreenSharingControl {
    fn subsystem(&self) -> Subsystem {
        Subsystem::ScreenSharing
    }

    fn check_available(&self) -> Result<(), CollaboratorError> {
        require(self.runner.as_ref(), LAUNCHCTL)
    }

    /// Loaded in the system domain means active.
    fn probe(&self) -> ProbeResult {
        match self.runner.run(LAUNCHCTL, &["print", SCREENSHARING_TARGET]) {
            Ok(out) if out.success() => ProbeResult::new(ProbeState::Enabled, "service loaded"),
            Ok(out) if out.combined().contains("Could not find service") => {
                ProbeResult::new(ProbeState::Disabled, "service not loaded")
            }
            Ok(out) => ProbeResult::unknown(out.detail()),
            Err(e) => ProbeResult::unknown(e.to_string()),
        }
    }

    fn apply(&self, target: Switch) -> Result<String, CollaboratorError> {
        let runner = self.runner.as_ref();
        match target {
            Switch::Off => {
                // disable persists across reboots, bootout stops the running job
                run_checked(runner, LAUNCHCTL, &["disable", SCREENSHARING_TARGET])?;
                run_checked(runner, LAUNCHCTL, &["bootout", SCREENSHARING_TARGET])?;
                Ok("Screen Sharing disabled and unloaded".to_string())
            }
            Switch::On => {
                run_checked(runner, LAUNCHCTL, &["enable", SCREENSHARING_TARGET])?;
                run_checked(runner, LAUNCHCTL, &["bootstrap", "system", SCREENSHARING_PLIST])?;
                Ok("Screen Sharing enabled and loaded".to_string())
            }
        }
    }
}

pub struct RemoteManagementControl {
    runner: Arc<dyn CommandRunner>,
}

impl RemoteManagementControl {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }
}

impl SubsystemControl for RemoteManagementControl {
    fn subsystem(&self) -> Subsystem {
        Subsystem::RemoteManagement
    }

    fn check_available(&self) -> Result<(), CollaboratorError> {
        require(self.runner.as_ref(), KICKSTART)
    }

    /// Active when an ARDAgent process is running. pgrep exits 1 on no match.
    fn probe(&self) -> ProbeResult {
        match self.runner.run("pgrep", &["-x", "ARDAgent"]) {
            Ok(out) if out.success() => ProbeResult::new(ProbeState::Enabled, "ARDAgent running"),
            Ok(out) if out.code == Some(1) => {
                ProbeResult::new(ProbeState::Disabled, "ARDAgent not running")
            }
            Ok(out) => ProbeResult::unknown(out.detail()),
            Err(e) => ProbeResult::unknown(e.to_string()),
        }
    }

    fn apply(&self, target: Switch) -> Result<String, CollaboratorError> {
        let args: &[&str] = match target {
            Switch::Off => &["-deactivate", "-configure", "-access", "-off"],
            Switch::On => &["-activate", "-configure", "-access", "-on", "-restart", "-agent"],
        };
        run_checked(self.runner.as_ref(), KICKSTART, args)?;
        Ok(format!("Remote Management turned {}", target.as_arg()))
    }
}
