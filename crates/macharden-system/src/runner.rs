//! CommandRunner: the single seam between macharden and the host's utilities.
//!
//! Every probe and apply goes through a runner, so tests can replace the host
//! with a scripted one and assert exactly which commands would have run.

use std::path::Path;
use std::process::Command;

use macharden_core::CollaboratorError;

/// Captured result of one utility invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code; `None` when killed by a signal.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            code: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    pub fn failed(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// stdout and stderr joined; some utilities (spctl) report on stderr.
    pub fn combined(&self) -> String {
        format!("{} {}", self.stdout.trim(), self.stderr.trim())
            .trim()
            .to_string()
    }

    /// stderr if non-empty, else stdout, else the exit status.
    pub fn detail(&self) -> String {
        let stderr = self.stderr.trim();
        let stdout = self.stdout.trim();
        if !stderr.is_empty() {
            stderr.to_string()
        } else if !stdout.is_empty() {
            stdout.to_string()
        } else {
            self.status_text()
        }
    }

    pub fn status_text(&self) -> String {
        match self.code {
            Some(c) => format!("exit status {}", c),
            None => "terminated by signal".to_string(),
        }
    }
}

/// Blocking invocation of host utilities. No timeout is enforced.
pub trait CommandRunner: Send + Sync {
    fn run(&self, program: &str, args: &[&str]) -> Result<CommandOutput, CollaboratorError>;

    /// Whether `program` (absolute path or bare name on PATH) exists.
    fn is_available(&self, program: &str) -> bool;
}

/// Render a command line for logs and error messages.
pub fn command_line(program: &str, args: &[&str]) -> String {
    if args.is_empty() {
        program.to_string()
    } else {
        format!("{} {}", program, args.join(" "))
    }
}

/// Run and require exit status 0.
pub fn run_checked(
    runner: &dyn CommandRunner,
    program: &str,
    args: &[&str],
) -> Result<CommandOutput, CollaboratorError> {
    let output = runner.run(program, args)?;
    if output.success() {
        Ok(output)
    } else {
        Err(CollaboratorError::Failed {
            command: command_line(program, args),
            status: output.status_text(),
            detail: output.detail(),
        })
    }
}

/// Run `program` in the graphical session owner's context via `sudo -u`.
pub fn run_as_user(
    runner: &dyn CommandRunner,
    user: &str,
    program: &str,
    args: &[&str],
) -> Result<CommandOutput, CollaboratorError> {
    let mut full = vec!["-u", user, program];
    full.extend_from_slice(args);
    runner.run("sudo", &full)
}

/// The real host.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, program: &str, args: &[&str]) -> Result<CommandOutput, CollaboratorError> {
        tracing::debug!(command = %command_line(program, args), "Running");
        let output = Command::new(program).args(args).output().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                CollaboratorError::Missing {
                    program: program.to_string(),
                }
            } else {
                CollaboratorError::Spawn {
                    program: program.to_string(),
                    source: e,
                }
            }
        })?;
        Ok(CommandOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }

    fn is_available(&self, program: &str) -> bool {
        let path = Path::new(program);
        if path.is_absolute() {
            path.exists()
        } else {
            which::which(program).is_ok()
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use scripted::ScriptedRunner;

#[cfg(any(test, feature = "test-support"))]
mod scripted {
    use super::*;
    use std::collections::{HashMap, HashSet};
    use std::sync::Mutex;

    /// Deterministic runner: responses keyed by full command line, with a
    /// journal of every invocation. Unscripted commands exit 1.
    #[derive(Debug, Default)]
    pub struct ScriptedRunner {
        responses: Mutex<HashMap<String, Vec<CommandOutput>>>,
        missing: HashSet<String>,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedRunner {
        pub fn new() -> Self {
            Self::default()
        }

        /// Queue a response. Several responses for the same command are
        /// returned in order; the last one repeats.
        pub fn respond(self, command: &str, output: CommandOutput) -> Self {
            if let Ok(mut map) = self.responses.lock() {
                map.entry(command.to_string()).or_default().push(output);
            }
            self
        }

        /// Mark a program as absent from the host.
        pub fn without(mut self, program: &str) -> Self {
            self.missing.insert(program.to_string());
            self
        }

        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().map(|c| c.clone()).unwrap_or_default()
        }

        pub fn was_called(&self, command: &str) -> bool {
            self.calls().iter().any(|c| c == command)
        }
    }

    impl CommandRunner for ScriptedRunner {
        fn run(&self, program: &str, args: &[&str]) -> Result<CommandOutput, CollaboratorError> {
            if self.missing.contains(program) {
                return Err(CollaboratorError::Missing {
                    program: program.to_string(),
                });
            }
            let line = command_line(program, args);
            if let Ok(mut calls) = self.calls.lock() {
                calls.push(line.clone());
            }
            let mut map = self.responses.lock().map_err(|_| CollaboratorError::Spawn {
                program: program.to_string(),
                source: std::io::Error::new(std::io::ErrorKind::Other, "poisoned"),
            })?;
            match map.get_mut(&line) {
                Some(queue) if queue.len() > 1 => Ok(queue.remove(0)),
                Some(queue) => Ok(queue.first().cloned().unwrap_or_default()),
                None => Ok(CommandOutput::failed(1, format!("unscripted: {}", line))),
            }
        }

        fn is_available(&self, program: &str) -> bool {
            !self.missing.contains(program)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detail_prefers_stderr() {
        let out = CommandOutput {
            code: Some(1),
            stdout: "partial".to_string(),
            stderr: "permission denied\n".to_string(),
        };
        assert_eq!(out.detail(), "permission denied");
        assert_eq!(CommandOutput::failed(3, "").detail(), "exit status 3");
    }

    #[test]
    fn test_run_checked_maps_failure() {
        let runner =
            ScriptedRunner::new().respond("pmset -a womp 0", CommandOutput::failed(1, "nope"));
        let err = run_checked(&runner, "pmset", &["-a", "womp", "0"]).unwrap_err();
        assert!(matches!(err, CollaboratorError::Failed { ref detail, .. } if detail == "nope"));
    }

    #[test]
    fn test_run_as_user_prefixes_sudo() {
        let runner = ScriptedRunner::new();
        let _ = run_as_user(&runner, "alice", "defaults", &["read", "com.apple.Safari"]);
        assert_eq!(runner.calls(), vec!["sudo -u alice defaults read com.apple.Safari"]);
    }

    #[test]
    fn test_scripted_responses_in_order() {
        let runner = ScriptedRunner::new()
            .respond("spctl --status", CommandOutput::ok("assessments disabled"))
            .respond("spctl --status", CommandOutput::ok("assessments enabled"));
        assert_eq!(runner.run("spctl", &["--status"]).unwrap().stdout, "assessments disabled");
        assert_eq!(runner.run("spctl", &["--status"]).unwrap().stdout, "assessments enabled");
        assert_eq!(runner.run("spctl", &["--status"]).unwrap().stdout, "assessments enabled");
    }

    #[test]
    fn test_missing_program() {
        let runner = ScriptedRunner::new().without("pmset");
        assert!(!runner.is_available("pmset"));
        assert!(runner.run("pmset", &["-g"]).unwrap_err().is_missing());
        assert!(runner.calls().is_empty());
    }
}
