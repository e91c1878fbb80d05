//! One `SubsystemControl` per hardenable facility.
//!
//! Each control owns its utility invocations and the parsing of their output.
//! `standard_controls` wires them up in processing order.

pub mod firewall;
pub mod gatekeeper;
pub mod remote;
pub mod safari;
pub mod sharing;

use std::sync::Arc;

use macharden_core::reconcile::SubsystemControl;
use macharden_core::{CollaboratorError, ProbeResult};

use crate::parse::parse_switch;
use crate::runner::CommandRunner;

pub use firewall::{FirewallControl, FirewallSetting};
pub use gatekeeper::GatekeeperControl;
pub use remote::{RemoteAppleEventsControl, RemoteLoginControl, WakeOnNetworkControl};
pub use safari::SafariDownloadsControl;
pub use sharing::{RemoteManagementControl, ScreenSharingControl};

/// Every control, in processing order.
pub fn standard_controls(
    runner: Arc<dyn CommandRunner>,
    console_user: Option<String>,
) -> Vec<Box<dyn SubsystemControl>> {
    vec![
        Box::new(FirewallControl::new(runner.clone(), FirewallSetting::Global)),
        Box::new(FirewallControl::new(runner.clone(), FirewallSetting::Stealth)),
        Box::new(FirewallControl::new(runner.clone(), FirewallSetting::BlockAll)),
        Box::new(GatekeeperControl::new(runner.clone())),
        Box::new(RemoteLoginControl::new(runner.clone())),
        Box::new(RemoteAppleEventsControl::new(runner.clone())),
        Box::new(WakeOnNetworkControl::new(runner.clone())),
        Box::new(ScreenSharingControl::new(runner.clone())),
        Box::new(RemoteManagementControl::new(runner.clone())),
        Box::new(SafariDownloadsControl::new(runner, console_user)),
    ]
}

/// `Missing` unless `program` exists on the host.
pub(crate) fn require(runner: &dyn CommandRunner, program: &str) -> Result<(), CollaboratorError> {
    if runner.is_available(program) {
        Ok(())
    } else {
        Err(CollaboratorError::Missing {
            program: program.to_string(),
        })
    }
}

/// Run a status query whose output is an on/off sentence.
///
/// A non-zero exit is `unknown`, as is any spawn failure.
pub(crate) fn probe_switch(
    runner: &dyn CommandRunner,
    program: &str,
    args: &[&str],
) -> ProbeResult {
    match runner.run(program, args) {
        Ok(out) if out.success() => {
            let text = out.combined();
            ProbeResult::new(parse_switch(&text), text)
        }
        Ok(out) => ProbeResult::unknown(out.detail()),
        Err(e) => ProbeResult::unknown(e.to_string()),
    }
}
