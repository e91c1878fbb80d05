//! Probe and outcome types shared by the engine and the reporter.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::policy::{DesiredState, Subsystem};

/// Normalised state of a subsystem at probe time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbeState {
    Enabled,
    Disabled,
    Unknown,
}

impl From<Switch> for ProbeState {
    fn from(s: Switch) -> Self {
        match s {
            Switch::On => ProbeState::Enabled,
            Switch::Off => ProbeState::Disabled,
        }
    }
}

impl fmt::Display for ProbeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeState::Enabled => write!(f, "enabled"),
            ProbeState::Disabled => write!(f, "disabled"),
            ProbeState::Unknown => write!(f, "unknown"),
        }
    }
}

/// Concrete target handed to an apply operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Switch {
    On,
    Off,
}

impl Switch {
    /// The `on`/`off` token most macOS utilities accept.
    pub fn as_arg(self) -> &'static str {
        match self {
            Switch::On => "on",
            Switch::Off => "off",
        }
    }
}

/// Result of a read-only probe: tri-state plus the raw text it was parsed from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeResult {
    pub state: ProbeState,
    pub detail: String,
}

impl ProbeResult {
    pub fn new(state: ProbeState, detail: impl Into<String>) -> Self {
        Self {
            state,
            detail: detail.into().trim().to_string(),
        }
    }

    pub fn unknown(detail: impl Into<String>) -> Self {
        Self::new(ProbeState::Unknown, detail)
    }
}

/// What the engine did for one subsystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionTaken {
    None,
    Applied,
    Failed,
    Unsupported,
}

impl fmt::Display for ActionTaken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionTaken::None => write!(f, "none"),
            ActionTaken::Applied => write!(f, "applied"),
            ActionTaken::Failed => write!(f, "failed"),
            ActionTaken::Unsupported => write!(f, "unsupported"),
        }
    }
}

/// One record per subsystem per run. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeRecord {
    pub subsystem: Subsystem,
    pub prior_state: ProbeState,
    pub desired_state: DesiredState,
    pub action_taken: ActionTaken,
    pub detail: String,
}
