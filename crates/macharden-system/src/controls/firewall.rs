//! macOS Application Firewall via `socketfilterfw`.

use std::sync::Arc;

use macharden_core::reconcile::SubsystemControl;
use macharden_core::{CollaboratorError, ProbeResult, Subsystem, Switch};

use super::{probe_switch, require};
use crate::runner::{run_checked, CommandRunner};

pub const SOCKETFILTERFW: &str = "/usr/libexec/ApplicationFirewall/socketfilterfw";

/// The three firewall switches managed independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FirewallSetting {
    Global,
    Stealth,
    BlockAll,
}

impl FirewallSetting {
    fn get_flag(self) -> &'static str {
        match self {
            FirewallSetting::Global => "--getglobalstate",
            FirewallSetting::Stealth => "--getstealthmode",
            FirewallSetting::BlockAll => "--getblockall",
        }
    }

    fn set_flag(self) -> &'static str {
        match self {
            FirewallSetting::Global => "--setglobalstate",
            FirewallSetting::Stealth => "--setstealthmode",
            FirewallSetting::BlockAll => "--setblockall",
        }
    }
}

pub struct FirewallControl {
    runner: Arc<dyn CommandRunner>,
    setting: FirewallSetting,
}

impl FirewallControl {
    pub fn new(runner: Arc<dyn CommandRunner>, setting: FirewallSetting) -> Self {
        Self { runner, setting }
    }
}

impl SubsystemControl for FirewallControl {
    fn subsystem(&self) -> Subsystem {
        match self.setting {
            FirewallSetting::Global => Subsystem::FirewallGlobal,
            FirewallSetting::Stealth => Subsystem::FirewallStealth,
            FirewallSetting::BlockAll => Subsystem::FirewallBlockAll,
        }
    }

    fn check_available(&self) -> Result<(), CollaboratorError> {
        require(self.runner.as_ref(), SOCKETFILTERFW)
    }

    fn probe(&self) -> ProbeResult {
        probe_switch(self.runner.as_ref(), SOCKETFILTERFW, &[self.setting.get_flag()])
    }

    fn apply(&self, target: Switch) -> Result<String, CollaboratorError> {
        let args = [self.setting.set_flag(), target.as_arg()];
        let out = run_checked(self.runner.as_ref(), SOCKETFILTERFW, &args)?;
        let text = out.combined();
        Ok(if text.is_empty() {
            format!("socketfilterfw {}", args.join(" "))
        } else {
            text
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::{CommandOutput, ScriptedRunner};
    use macharden_core::ProbeState;

    fn control(
        runner: ScriptedRunner,
        setting: FirewallSetting,
    ) -> (Arc<ScriptedRunner>, FirewallControl) {
        let runner = Arc::new(runner);
        let control = FirewallControl::new(runner.clone(), setting);
        (runner, control)
    }

    #[test]
    fn test_probe_global_state() {
        let (_, c) = control(
            ScriptedRunner::new().respond(
                &format!("{} --getglobalstate", SOCKETFILTERFW),
                CommandOutput::ok("Firewall is enabled. (State = 1)\n"),
            ),
            FirewallSetting::Global,
        );
        let result = c.probe();
        assert_eq!(result.state, ProbeState::Enabled);
        assert_eq!(result.detail, "Firewall is enabled. (State = 1)");
    }

    #[test]
    fn test_probe_failure_is_unknown() {
        let (_, c) = control(ScriptedRunner::new(), FirewallSetting::Stealth);
        assert_eq!(c.probe().state, ProbeState::Unknown);
    }

    #[test]
    fn test_apply_block_all() {
        let cmd = format!("{} --setblockall on", SOCKETFILTERFW);
        let (runner, c) = control(
            ScriptedRunner::new().respond(
                &cmd,
                CommandOutput::ok("Firewall is blocking all non-essential incoming connections"),
            ),
            FirewallSetting::BlockAll,
        );
        assert!(c.apply(Switch::On).is_ok());
        assert!(runner.was_called(&cmd));
    }

    #[test]
    fn test_missing_socketfilterfw() {
        let (_, c) = control(
            ScriptedRunner::new().without(SOCKETFILTERFW),
            FirewallSetting::Global,
        );
        assert!(c.check_available().unwrap_err().is_missing());
    }
}
