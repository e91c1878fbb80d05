//! Reconciliation engine.
//!
//! For each subsystem, in table order: check the collaborator exists, probe,
//! look up the desired state, and apply only when they differ. Every
//! subsystem is visited exactly once and its failure never stops the pass.
//!
//! ```text
//! UNPROBED -> PROBED{enabled|disabled|unknown} -> RECONCILED{none|applied|failed|unsupported}
//! ```

use crate::error::CollaboratorError;
use crate::policy::{DesiredState, Subsystem};
use crate::profile::EffectivePolicy;
use crate::state::{ActionTaken, OutcomeRecord, ProbeResult, ProbeState, Switch};

/// Detail recorded when the profile leaves a subsystem alone.
pub const NO_POLICY: &str = "no policy for this profile";

/// Probe/apply pair for one subsystem.
///
/// Implementations own the parsing of their collaborator's output; the engine
/// only ever sees the tri-state.
pub trait SubsystemControl {
    fn subsystem(&self) -> Subsystem;

    /// `Err(CollaboratorError::Missing)` when the utility is absent.
    fn check_available(&self) -> Result<(), CollaboratorError> {
        Ok(())
    }

    /// Read-only query. Failures come back as `unknown`, never as errors.
    fn probe(&self) -> ProbeResult;

    /// Move the subsystem to `target`. Returns a short description on success.
    fn apply(&self, target: Switch) -> Result<String, CollaboratorError>;
}

/// Whether corrective actions are issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReconcileMode {
    #[default]
    Apply,
    /// Probe and plan only.
    DryRun,
}

pub struct Reconciler<'a> {
    policy: &'a EffectivePolicy,
    mode: ReconcileMode,
}

impl<'a> Reconciler<'a> {
    pub fn new(policy: &'a EffectivePolicy, mode: ReconcileMode) -> Self {
        Self { policy, mode }
    }

    /// Reconcile every subsystem in table order, handing each record to
    /// `on_outcome` as soon as it is produced.
    ///
    /// A subsystem with no registered control is reported `unsupported`.
    pub fn run<F>(
        &self,
        controls: &[Box<dyn SubsystemControl>],
        mut on_outcome: F,
    ) -> Vec<OutcomeRecord>
    where
        F: FnMut(&OutcomeRecord),
    {
        let mut records = Vec::with_capacity(Subsystem::ALL.len());
        for subsystem in Subsystem::ALL {
            let record = match controls.iter().find(|c| c.subsystem() == subsystem) {
                Some(control) => self.reconcile_one(control.as_ref()),
                None => OutcomeRecord {
                    subsystem,
                    prior_state: ProbeState::Unknown,
                    desired_state: self.policy.desired_state(subsystem),
                    action_taken: ActionTaken::Unsupported,
                    detail: "no collaborator registered".to_string(),
                },
            };
            on_outcome(&record);
            records.push(record);
        }
        records
    }

    pub fn reconcile_one(&self, control: &dyn SubsystemControl) -> OutcomeRecord {
        let subsystem = control.subsystem();
        let desired = self.policy.desired_state(subsystem);

        if let Err(e) = control.check_available() {
            tracing::warn!(subsystem = %subsystem, error = %e, "Subsystem unsupported");
            return OutcomeRecord {
                subsystem,
                prior_state: ProbeState::Unknown,
                desired_state: desired,
                action_taken: ActionTaken::Unsupported,
                detail: e.to_string(),
            };
        }

        let ProbeResult { state: prior, detail: probe_detail } = control.probe();
        tracing::debug!(subsystem = %subsystem, prior = %prior, desired = %desired, "Probed");

        let Some(target) = desired.correction(prior) else {
            let detail = match (desired, prior, probe_detail.is_empty()) {
                (DesiredState::NoOpinion, _, _) => NO_POLICY.to_string(),
                (_, ProbeState::Unknown, false) => probe_detail,
                _ => "already compliant".to_string(),
            };
            return self.record(subsystem, prior, desired, ActionTaken::None, detail);
        };

        if self.mode == ReconcileMode::DryRun {
            let detail = format!("would turn {}", target.as_arg());
            return self.record(subsystem, prior, desired, ActionTaken::None, detail);
        }

        match control.apply(target) {
            Ok(detail) => {
                tracing::info!(subsystem = %subsystem, target = target.as_arg(), "Applied");
                self.record(subsystem, prior, desired, ActionTaken::Applied, detail)
            }
            Err(e) if e.is_missing() => {
                tracing::warn!(subsystem = %subsystem, error = %e, "Apply path unsupported");
                self.record(subsystem, prior, desired, ActionTaken::Unsupported, e.to_string())
            }
            Err(e) => {
                tracing::warn!(subsystem = %subsystem, error = %e, "Apply failed, continuing");
                self.record(subsystem, prior, desired, ActionTaken::Failed, e.to_string())
            }
        }
    }

    fn record(
        &self,
        subsystem: Subsystem,
        prior_state: ProbeState,
        desired_state: DesiredState,
        action_taken: ActionTaken,
        detail: String,
    ) -> OutcomeRecord {
        OutcomeRecord {
            subsystem,
            prior_state,
            desired_state,
            action_taken,
            detail,
        }
    }
}
