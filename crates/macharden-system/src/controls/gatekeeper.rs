//! Gatekeeper (code-signing assessment policy) via `spctl`.

use std::sync::Arc;

use macharden_core::reconcile::SubsystemControl;
use macharden_core::{CollaboratorError, ProbeResult, Subsystem, Switch};

use super::require;
use crate::parse::parse_switch;
use crate::runner::{run_checked, CommandRunner};

const SPCTL: &str = "spctl";

pub struct GatekeeperControl {
    runner: Arc<dyn CommandRunner>,
}

impl GatekeeperControl {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }
}

impl SubsystemControl for GatekeeperControl {
    fn subsystem(&self) -> Subsystem {
        Subsystem::Gatekeeper
    }

    fn check_available(&self) -> Result<(), CollaboratorError> {
        require(self.runner.as_ref(), SPCTL)
    }

    /// `spctl --status` exits non-zero when assessments are disabled, so the
    /// text is parsed regardless of exit status.
    fn probe(&self) -> ProbeResult {
        match self.runner.run(SPCTL, &["--status"]) {
            Ok(out) => {
                let text = out.combined();
                ProbeResult::new(parse_switch(&text), text)
            }
            Err(e) => ProbeResult::unknown(e.to_string()),
        }
    }

    fn apply(&self, target: Switch) -> Result<String, CollaboratorError> {
        let flag = match target {
            Switch::On => "--master-enable",
            Switch::Off => "--master-disable",
        };
        run_checked(self.runner.as_ref(), SPCTL, &[flag])?;
        Ok(format!("spctl {}", flag))
    }
}
