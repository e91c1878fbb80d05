//! Declarative hardening policy.
//!
//! The whole decision surface is the `POLICY_TABLE` below: one row per
//! subsystem with its target under `home` and under `public`/strict. Nothing
//! else in the crate branches on the profile.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::profile::EffectivePolicy;
use crate::state::{ProbeState, Switch};

/// An independently reconcilable host-security facility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Subsystem {
    FirewallGlobal,
    FirewallStealth,
    FirewallBlockAll,
    Gatekeeper,
    RemoteLogin,
    RemoteAppleEvents,
    WakeOnNetwork,
    ScreenSharing,
    RemoteManagement,
    BrowserSafeDownloads,
}

impl Subsystem {
    /// Processing order. Fixed for every run.
    pub const ALL: [Subsystem; 10] = [
        Subsystem::FirewallGlobal,
        Subsystem::FirewallStealth,
        Subsystem::FirewallBlockAll,
        Subsystem::Gatekeeper,
        Subsystem::RemoteLogin,
        Subsystem::RemoteAppleEvents,
        Subsystem::WakeOnNetwork,
        Subsystem::ScreenSharing,
        Subsystem::RemoteManagement,
        Subsystem::BrowserSafeDownloads,
    ];

    /// Stable identifier used in logs and JSON.
    pub fn name(self) -> &'static str {
        match self {
            Subsystem::FirewallGlobal => "firewall-global",
            Subsystem::FirewallStealth => "firewall-stealth",
            Subsystem::FirewallBlockAll => "firewall-block-all",
            Subsystem::Gatekeeper => "gatekeeper",
            Subsystem::RemoteLogin => "remote-login",
            Subsystem::RemoteAppleEvents => "remote-apple-events",
            Subsystem::WakeOnNetwork => "wake-on-network",
            Subsystem::ScreenSharing => "screen-sharing",
            Subsystem::RemoteManagement => "remote-management",
            Subsystem::BrowserSafeDownloads => "browser-safe-downloads",
        }
    }

    /// Section heading for the transcript.
    pub fn title(self) -> &'static str {
        match self {
            Subsystem::FirewallGlobal => "Application Firewall",
            Subsystem::FirewallStealth => "Firewall Stealth Mode",
            Subsystem::FirewallBlockAll => "Firewall Block All Incoming",
            Subsystem::Gatekeeper => "Gatekeeper",
            Subsystem::RemoteLogin => "Remote Login (SSH)",
            Subsystem::RemoteAppleEvents => "Remote Apple Events",
            Subsystem::WakeOnNetwork => "Wake for Network Access",
            Subsystem::ScreenSharing => "Screen Sharing",
            Subsystem::RemoteManagement => "Remote Management (ARD)",
            Subsystem::BrowserSafeDownloads => "Safari: Open Safe Files After Downloading",
        }
    }
}

impl fmt::Display for Subsystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Target for one subsystem under an effective policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DesiredState {
    Enabled,
    Disabled,
    /// Reactive: turn off only when the probe shows the service running.
    /// Never acts on `unknown` and never enables.
    DisabledIfActive,
    NoOpinion,
}

impl DesiredState {
    /// The apply needed to move from `prior` to this target, if any.
    ///
    /// `unknown` counts as non-compliant for declarative targets, so a
    /// best-effort apply is attempted.
    pub fn correction(self, prior: ProbeState) -> Option<Switch> {
        match (self, prior) {
            (DesiredState::NoOpinion, _) => None,
            (DesiredState::Enabled, ProbeState::Enabled) => None,
            (DesiredState::Enabled, _) => Some(Switch::On),
            (DesiredState::Disabled, ProbeState::Disabled) => None,
            (DesiredState::Disabled, _) => Some(Switch::Off),
            (DesiredState::DisabledIfActive, ProbeState::Enabled) => Some(Switch::Off),
            (DesiredState::DisabledIfActive, _) => None,
        }
    }
}

impl fmt::Display for DesiredState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DesiredState::Enabled => write!(f, "enabled"),
            DesiredState::Disabled => write!(f, "disabled"),
            DesiredState::DisabledIfActive => write!(f, "disabled (if active)"),
            DesiredState::NoOpinion => write!(f, "no-opinion"),
        }
    }
}

use DesiredState::{Disabled, DisabledIfActive, Enabled, NoOpinion};

/// `(subsystem, home non-strict, public or strict)`, in processing order.
const POLICY_TABLE: [(Subsystem, DesiredState, DesiredState); 10] = [
    (Subsystem::FirewallGlobal, Enabled, Enabled),
    (Subsystem::FirewallStealth, Enabled, Enabled),
    (Subsystem::FirewallBlockAll, Disabled, Enabled),
    (Subsystem::Gatekeeper, Enabled, Enabled),
    (Subsystem::RemoteLogin, Disabled, Disabled),
    (Subsystem::RemoteAppleEvents, Disabled, Disabled),
    (Subsystem::WakeOnNetwork, NoOpinion, Disabled),
    (Subsystem::ScreenSharing, NoOpinion, DisabledIfActive),
    (Subsystem::RemoteManagement, NoOpinion, DisabledIfActive),
    (Subsystem::BrowserSafeDownloads, Disabled, Disabled),
];

/// Look up the target for `subsystem` under `policy`.
pub fn desired_state(subsystem: Subsystem, policy: &EffectivePolicy) -> DesiredState {
    POLICY_TABLE
        .iter()
        .find(|(s, _, _)| *s == subsystem)
        .map(|&(_, home, public)| {
            if policy.is_public_level() {
                public
            } else {
                home
            }
        })
        .unwrap_or(NoOpinion)
}

/// The full desired-state table for `policy`, in processing order.
pub fn desired_table(policy: &EffectivePolicy) -> Vec<(Subsystem, DesiredState)> {
    Subsystem::ALL
        .iter()
        .map(|&s| (s, desired_state(s, policy)))
        .collect()
}
