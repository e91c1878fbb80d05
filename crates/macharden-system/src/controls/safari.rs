//! Safari "Open safe files after downloading" (`AutoOpenSafeDownloads`).
//!
//! The preference belongs to the graphical session owner, so every read and
//! write runs as that user. Safari is restarted after a change if it was
//! running, so the new value takes effect.

use std::sync::Arc;

use macharden_core::reconcile::SubsystemControl;
use macharden_core::{CollaboratorError, ProbeResult, Subsystem, Switch};

use crate::parse::parse_defaults_bool;
use crate::runner::{run_as_user, CommandRunner};

const SAFARI_APP: &str = "/Applications/Safari.app";
const SAFARI_DOMAIN: &str = "com.apple.Safari";
const SAFE_DOWNLOADS_KEY: &str = "AutoOpenSafeDownloads";

pub struct SafariDownloadsControl {
    runner: Arc<dyn CommandRunner>,
    console_user: Option<String>,
}

impl SafariDownloadsControl {
    pub fn new(runner: Arc<dyn CommandRunner>, console_user: Option<String>) -> Self {
        Self {
            runner,
            console_user,
        }
    }

    fn user(&self) -> Result<&str, CollaboratorError> {
        self.console_user
            .as_deref()
            .ok_or_else(|| CollaboratorError::Missing {
                program: "a logged-in console user".to_string(),
            })
    }

    fn is_running(&self) -> bool {
        self.runner
            .run("pgrep", &["-x", "Safari"])
            .map(|o| o.success())
            .unwrap_or(false)
    }

    /// Quit and relaunch Safari in the user's session. Best effort.
    fn restart(&self, user: &str) -> Result<(), CollaboratorError> {
        let runner = self.runner.as_ref();
        let quit = run_as_user(runner, user, "osascript", &["-e", "quit app \"Safari\""])?;
        if !quit.success() {
            return Err(CollaboratorError::Failed {
                command: "osascript -e 'quit app \"Safari\"'".to_string(),
                status: quit.status_text(),
                detail: quit.detail(),
            });
        }
        let open = run_as_user(runner, user, "open", &["-a", "Safari"])?;
        if !open.success() {
            return Err(CollaboratorError::Failed {
                command: "open -a Safari".to_string(),
                status: open.status_text(),
                detail: open.detail(),
            });
        }
        Ok(())
    }
}

impl SubsystemControl for SafariDownloadsControl {
    fn subsystem(&self) -> Subsystem {
        Subsystem::BrowserSafeDownloads
    }

    fn check_available(&self) -> Result<(), CollaboratorError> {
        if !self.runner.is_available(SAFARI_APP) {
            return Err(CollaboratorError::Missing {
                program: SAFARI_APP.to_string(),
            });
        }
        self.user().map(|_| ())
    }

    /// An unset key reads as a non-zero exit and stays `unknown`.
    fn probe(&self) -> ProbeResult {
        let user = match self.user() {
            Ok(u) => u,
            Err(e) => return ProbeResult::unknown(e.to_string()),
        };
        match run_as_user(
            self.runner.as_ref(),
            user,
            "defaults",
            &["read", SAFARI_DOMAIN, SAFE_DOWNLOADS_KEY],
        ) {
            Ok(out) if out.success() => ProbeResult::new(
                parse_defaults_bool(&out.stdout),
                format!("{} = {}", SAFE_DOWNLOADS_KEY, out.stdout.trim()),
            ),
            Ok(out) => ProbeResult::unknown(out.detail()),
            Err(e) => ProbeResult::unknown(e.to_string()),
        }
    }

    fn apply(&self, target: Switch) -> Result<String, CollaboratorError> {
        let user = self.user()?;
        let value = match target {
            Switch::On => "true",
            Switch::Off => "false",
        };
        let args = ["write", SAFARI_DOMAIN, SAFE_DOWNLOADS_KEY, "-bool", value];
        let out = run_as_user(self.runner.as_ref(), user, "defaults", &args)?;
        if !out.success() {
            return Err(CollaboratorError::Failed {
                command: format!("defaults {}", args.join(" ")),
                status: out.status_text(),
                detail: out.detail(),
            });
        }

        let mut detail = format!("{} set to {} for {}", SAFE_DOWNLOADS_KEY, value, user);
        if self.is_running() {
            match self.restart(user) {
                Ok(()) => detail.push_str("; Safari restarted"),
                Err(e) => {
                    tracing::warn!(error = %e, "Could not restart Safari");
                    detail.push_str("; restart Safari to apply");
                }
            }
        }
        Ok(detail)
    }
}
