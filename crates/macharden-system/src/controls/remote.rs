//! Remote access switches: Remote Login (SSH), Remote Apple Events, and
//! wake-on-network.

use std::sync::Arc;

use macharden_core::reconcile::SubsystemControl;
use macharden_core::{CollaboratorError, ProbeResult, Subsystem, Switch};

use super::{probe_switch, require};
use crate::parse::parse_womp;
use crate::runner::{run_checked, CommandRunner};

const SYSTEMSETUP: &str = "systemsetup";
const PMSET: &str = "pmset";

pub struct RemoteLoginControl {
    runner: Arc<dyn CommandRunner>,
}

impl RemoteLoginControl {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }
}

impl SubsystemControl for RemoteLoginControl {
    fn subsystem(&self) -> Subsystem {
        Subsystem::RemoteLogin
    }

    fn check_available(&self) -> Result<(), CollaboratorError> {
        require(self.runner.as_ref(), SYSTEMSETUP)
    }

    fn probe(&self) -> ProbeResult {
        probe_switch(self.runner.as_ref(), SYSTEMSETUP, &["-getremotelogin"])
    }

    /// `-f` skips the interactive "really turn off?" confirmation.
    fn apply(&self, target: Switch) -> Result<String, CollaboratorError> {
        run_checked(
            self.runner.as_ref(),
            SYSTEMSETUP,
            &["-f", "-setremotelogin", target.as_arg()],
        )?;
        Ok(format!("Remote Login turned {}", target.as_arg()))
    }
}

pub struct RemoteAppleEventsControl {
    runner: Arc<dyn CommandRunner>,
}

impl RemoteAppleEventsControl {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }
}

impl SubsystemControl for RemoteAppleEventsControl {
    fn subsystem(&self) -> Subsystem {
        Subsystem::RemoteAppleEvents
    }

    fn check_available(&self) -> Result<(), CollaboratorError> {
        require(self.runner.as_ref(), SYSTEMSETUP)
    }

    fn probe(&self) -> ProbeResult {
        probe_switch(self.runner.as_ref(), SYSTEMSETUP, &["-getremoteappleevents"])
    }

    fn apply(&self, target: Switch) -> Result<String, CollaboratorError> {
        run_checked(
            self.runner.as_ref(),
            SYSTEMSETUP,
            &["-setremoteappleevents", target.as_arg()],
        )?;
        Ok(format!("Remote Apple Events turned {}", target.as_arg()))
    }
}

pub struct WakeOnNetworkControl {
    runner: Arc<dyn CommandRunner>,
}

impl WakeOnNetworkControl {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }
}

impl SubsystemControl for WakeOnNetworkControl {
    fn subsystem(&self) -> Subsystem {
        Subsystem::WakeOnNetwork
    }

    fn check_available(&self) -> Result<(), CollaboratorError> {
        require(self.runner.as_ref(), PMSET)
    }

    fn probe(&self) -> ProbeResult {
        match self.runner.run(PMSET, &["-g"]) {
            Ok(out) if out.success() => {
                let state = parse_womp(&out.stdout);
                let detail = out
                    .stdout
                    .lines()
                    .find(|l| l.trim_start().starts_with("womp"))
                    .map(|l| l.trim().to_string())
                    .unwrap_or_else(|| "no womp setting reported".to_string());
                ProbeResult::new(state, detail)
            }
            Ok(out) => ProbeResult::unknown(out.detail()),
            Err(e) => ProbeResult::unknown(e.to_string()),
        }
    }

    /// Applies to every power source (`-a`).
    fn apply(&self, target: Switch) -> Result<String, CollaboratorError> {
        let value = match target {
            Switch::On => "1",
            Switch::Off => "0",
        };
        run_checked(self.runner.as_ref(), PMSET, &["-a", "womp", value])?;
        Ok(format!("womp set to {}", value))
    }
}
