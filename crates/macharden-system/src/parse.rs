//! Text → tri-state parsers for utility output.
//!
//! All string matching against command output lives here.

use macharden_core::ProbeState;
use regex::Regex;
use std::sync::OnceLock;

/// Word-level on/off matcher for texts such as `Firewall is enabled. (State = 1)`,
/// `Remote Login: Off`, `assessments disabled` or `Block all DISABLED!`.
///
/// Output mentioning both polarities (or neither) is `unknown`.
pub fn parse_switch(text: &str) -> ProbeState {
    let mut on = false;
    let mut off = false;
    for word in text
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|w| !w.is_empty())
    {
        match word.to_ascii_lowercase().as_str() {
            "enabled" | "on" => on = true,
            "disabled" | "off" => off = true,
            _ => {}
        }
    }
    match (on, off) {
        (true, false) => ProbeState::Enabled,
        (false, true) => ProbeState::Disabled,
        _ => ProbeState::Unknown,
    }
}

/// `womp` line of `pmset -g`. Absent on hardware without wake-on-LAN.
pub fn parse_womp(pmset_output: &str) -> ProbeState {
    static WOMP: OnceLock<Option<Regex>> = OnceLock::new();
    let Some(re) = WOMP
        .get_or_init(|| Regex::new(r"(?m)^\s*womp\s+(\d+)\s*$").ok())
        .as_ref()
    else {
        return ProbeState::Unknown;
    };
    match re.captures(pmset_output).and_then(|c| c.get(1)).map(|m| m.as_str()) {
        Some("0") => ProbeState::Disabled,
        Some(_) => ProbeState::Enabled,
        None => ProbeState::Unknown,
    }
}

/// Value printed by `defaults read <domain> <key>` for a boolean key.
pub fn parse_defaults_bool(value: &str) -> ProbeState {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => ProbeState::Enabled,
        "0" | "false" | "no" => ProbeState::Disabled,
        _ => ProbeState::Unknown,
    }
}
