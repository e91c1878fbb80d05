//! Software updates via `softwareupdate`.

use serde::Serialize;

use macharden_core::CollaboratorError;

use crate::runner::{run_checked, CommandRunner};

const SOFTWAREUPDATE: &str = "softwareupdate";

/// One pending update as listed by `softwareupdate -l`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PendingUpdate {
    pub label: String,
    pub title: Option<String>,
}

/// List pending updates.
pub fn list_updates(runner: &dyn CommandRunner) -> Result<Vec<PendingUpdate>, CollaboratorError> {
    let out = run_checked(runner, SOFTWAREUPDATE, &["-l"])?;
    Ok(parse_update_list(&format!("{}\n{}", out.stdout, out.stderr)))
}

/// Install everything pending. Output is returned for the transcript.
pub fn install_updates(runner: &dyn CommandRunner) -> Result<String, CollaboratorError> {
    let out = run_checked(runner, SOFTWAREUPDATE, &["-i", "-a"])?;
    Ok(out.combined())
}

/// Parse `* Label: <label>` lines and the `Title: …` line following each.
///
/// Older releases print `* <label>` with an indented description instead.
pub fn parse_update_list(output: &str) -> Vec<PendingUpdate> {
    let mut updates: Vec<PendingUpdate> = Vec::new();
    for line in output.lines() {
        let trimmed = line.trim();
        if let Some(rest) = trimmed.strip_prefix('*') {
            let rest = rest.trim();
            let label = rest.strip_prefix("Label:").unwrap_or(rest).trim();
            if !label.is_empty() {
                updates.push(PendingUpdate {
                    label: label.to_string(),
                    title: None,
                });
            }
        } else if let Some(title) = trimmed.strip_prefix("Title:") {
            if let Some(last) = updates.last_mut() {
                let title = title.split(',').next().unwrap_or_default().trim();
                if !title.is_empty() {
                    last.title = Some(title.to_string());
                }
            }
        }
    }
    updates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::{CommandOutput, ScriptedRunner};

    const LISTING: &str = concat!(
        "Software Update Tool\n\nFinding available software\n",
        "Software Update found the following new or updated software:\n",
        "* Label: macOS Sonoma 14.6.1-23G93\n",
        "\tTitle: macOS Sonoma 14.6.1, Version: 14.6.1, Size: 1048576KiB, Recommended: YES, ",
        "Action: restart,\n",
        "* Label: Safari17.6SonomaAuto-17.6\n",
        "\tTitle: Safari, Version: 17.6, Size: 150000KiB, Recommended: YES,\n",
    );

    #[test]
    fn test_parse_update_list() {
        let updates = parse_update_list(LISTING);
        assert_eq!(updates.len(), 2);
        assert_eq!(updates[0].label, "macOS Sonoma 14.6.1-23G93");
        assert_eq!(updates[0].title.as_deref(), Some("macOS Sonoma 14.6.1"));
        assert_eq!(updates[1].title.as_deref(), Some("Safari"));
    }

    #[test]
    fn test_no_updates() {
        let runner = ScriptedRunner::new().respond(
            "softwareupdate -l",
            CommandOutput {
                code: Some(0),
                stdout: "Software Update Tool\n\nFinding available software\n".to_string(),
                stderr: "No new software available.\n".to_string(),
            },
        );
        assert!(list_updates(&runner).unwrap().is_empty());
    }

    #[test]
    fn test_install_failure_propagates() {
        let runner = ScriptedRunner::new()
            .respond("softwareupdate -i -a", CommandOutput::failed(1, "network down"));
        assert!(install_updates(&runner).is_err());
    }
}
