//! Network reporting: listening TCP sockets and the current Wi-Fi network name.

use serde::Serialize;

use macharden_core::CollaboratorError;

use crate::runner::{command_line, CommandRunner};

/// Returned when the network name cannot be determined.
pub const UNKNOWN_NETWORK: &str = "unknown";

/// One listening TCP endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListeningSocket {
    pub command: String,
    pub pid: u32,
    pub user: String,
    pub endpoint: String,
}

/// `lsof -nP -iTCP -sTCP:LISTEN`. lsof exits 1 when nothing matches.
pub fn listening_sockets(
    runner: &dyn CommandRunner,
) -> Result<Vec<ListeningSocket>, CollaboratorError> {
    let args = ["-nP", "-iTCP", "-sTCP:LISTEN"];
    let out = runner.run("lsof", &args)?;
    match out.code {
        Some(0) => Ok(parse_lsof_listen(&out.stdout)),
        Some(1) if out.stdout.trim().is_empty() => Ok(Vec::new()),
        _ => Err(CollaboratorError::Failed {
            command: command_line("lsof", &args),
            status: out.status_text(),
            detail: out.detail(),
        }),
    }
}

pub fn parse_lsof_listen(output: &str) -> Vec<ListeningSocket> {
    let mut sockets: Vec<ListeningSocket> = output
        .lines()
        .skip_while(|l| !l.starts_with("COMMAND"))
        .skip(1)
        .filter_map(|line| {
            let cols: Vec<&str> = line.split_whitespace().collect();
            if cols.len() < 9 {
                return None;
            }
            let pid = cols[1].parse().ok()?;
            let endpoint = match cols.last() {
                Some(&"(LISTEN)") => cols[cols.len() - 2],
                Some(last) => last,
                None => return None,
            };
            Some(ListeningSocket {
                command: cols[0].to_string(),
                pid,
                user: cols[2].to_string(),
                endpoint: endpoint.to_string(),
            })
        })
        .collect();
    // IPv4 and IPv6 listeners of the same process show up twice
    sockets.dedup();
    sockets
}

/// Best-effort Wi-Fi network name. Any failure yields `"unknown"`.
pub fn current_network_name(runner: &dyn CommandRunner) -> String {
    let device = match runner.run("networksetup", &["-listallhardwareports"]) {
        Ok(out) if out.success() => parse_wifi_device(&out.stdout),
        Ok(_) | Err(_) => None,
    };
    let Some(device) = device else {
        return UNKNOWN_NETWORK.to_string();
    };
    match runner.run("networksetup", &["-getairportnetwork", &device]) {
        Ok(out) if out.success() => {
            parse_network_name(&out.stdout).unwrap_or_else(|| UNKNOWN_NETWORK.to_string())
        }
        _ => UNKNOWN_NETWORK.to_string(),
    }
}

/// Device of the `Hardware Port: Wi-Fi` block (`AirPort` on older releases).
pub fn parse_wifi_device(hardware_ports: &str) -> Option<String> {
    let mut in_wifi_block = false;
    for line in hardware_ports.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            in_wifi_block = false;
            continue;
        }
        if let Some(port) = trimmed.strip_prefix("Hardware Port:") {
            let name = port.trim().to_ascii_lowercase();
            in_wifi_block = name == "wi-fi" || name == "airport";
            continue;
        }
        if in_wifi_block {
            if let Some(device) = trimmed.strip_prefix("Device:") {
                let device = device.trim();
                if !device.is_empty() {
                    return Some(device.to_string());
                }
            }
        }
    }
    None
}

/// `Current Wi-Fi Network: <name>`; `None` when not associated.
pub fn parse_network_name(output: &str) -> Option<String> {
    let line = output.lines().find(|l| l.contains("Network:"))?;
    let (_, name) = line.split_once("Network:")?;
    let name = name.trim();
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}
