//! The hardening run: resolve the profile, reconcile every subsystem, report.
//!
//! Fatal preconditions (bad profile, not root) are checked before the first
//! collaborator call. Everything after that is best effort.

use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use chrono::Local;
use serde::Serialize;

use macharden_core::config::{ObservabilityConfig, SessionConfig};
use macharden_core::observability::{init_tracing, RunLog, Transcript};
use macharden_core::profile::{explicit_profile, resolve_policy, ProfilePrompt};
use macharden_core::reconcile::{ReconcileMode, Reconciler};
use macharden_core::report::{
    format_report_json, write_outcome, write_report, Disposition, HardeningReport,
};
use macharden_core::{ConfigError, ProbeResult, ProbeState};
use macharden_system::network::ListeningSocket;
use macharden_system::runner::CommandRunner;
use macharden_system::updates::PendingUpdate;
use macharden_system::{network, posture, session, standard_controls, updates, SystemRunner};

use crate::cli::Cli;

/// Everything the run needs from the machine it runs on.
pub struct Host {
    pub runner: Arc<dyn CommandRunner>,
    pub elevated: bool,
    pub log_dir: PathBuf,
    pub session: SessionConfig,
    /// Install the global tracing subscriber once the run log exists.
    pub init_tracing: bool,
}

impl Host {
    pub fn system() -> Self {
        Self {
            runner: Arc::new(SystemRunner),
            elevated: session::is_elevated(),
            log_dir: ObservabilityConfig::from_env().resolved_log_dir(),
            session: SessionConfig::from_env(),
            init_tracing: true,
        }
    }
}

/// Asks on the terminal, naming the detected Wi-Fi network.
pub struct StdinPrompt {
    runner: Arc<dyn CommandRunner>,
}

impl StdinPrompt {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }
}

impl ProfilePrompt for StdinPrompt {
    fn network_name(&mut self) -> String {
        network::current_network_name(self.runner.as_ref())
    }

    fn ask(&mut self, network: &str) -> io::Result<String> {
        eprint!("Profile for network '{}' [home/public] (default: home): ", network);
        io::stderr().flush()?;
        let mut answer = String::new();
        io::stdin().read_line(&mut answer)?;
        Ok(answer)
    }
}

/// Records the detected network in the transcript before handing off.
struct TranscribedPrompt<'a, 'p> {
    inner: &'a mut (dyn ProfilePrompt + 'p),
    transcript: &'a Transcript,
}

impl ProfilePrompt for TranscribedPrompt<'_, '_> {
    fn network_name(&mut self) -> String {
        let network = self.inner.network_name();
        self.transcript.line(&format!("Detected network: {}", network));
        network
    }

    fn ask(&mut self, network: &str) -> io::Result<String> {
        self.inner.ask(network)
    }
}

/// `softwareupdate` results for one run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UpdatesReport {
    pub pending: Vec<PendingUpdate>,
    pub installed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Everything a run observed. `--json` prints this.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    #[serde(flatten)]
    pub hardening: HardeningReport,
    pub disposition: Disposition,
    pub updates: UpdatesReport,
    pub integrity_protection: ProbeResult,
    pub disk_encryption: ProbeResult,
    /// `None` when lsof could not be run.
    pub listening_sockets: Option<Vec<ListeningSocket>>,
}

pub fn run(cli: &Cli, host: &Host, prompt: &mut dyn ProfilePrompt) -> Result<RunReport> {
    let explicit = explicit_profile(cli.profile_arg.as_deref(), cli.profile.as_deref())?;
    if !host.elevated {
        return Err(ConfigError::NotElevated.into());
    }

    let started_at = Local::now();
    let run_log = match RunLog::create_in(&host.log_dir, started_at) {
        Ok(log) => Some(Arc::new(log)),
        Err(e) => {
            eprintln!(
                "Warning: could not create run log in {}: {}",
                host.log_dir.display(),
                e
            );
            None
        }
    };
    if host.init_tracing {
        init_tracing(run_log.as_deref());
    }
    let mut transcript = Transcript::new(run_log);
    if cli.json {
        transcript = transcript.without_console();
    }

    transcript.section("macOS hardening");
    transcript.line(&format!("Started: {}", started_at.format("%Y-%m-%d %H:%M:%S")));
    if let Some(path) = transcript.log_path() {
        transcript.line(&format!("Log:     {}", path.display()));
    }
    let policy = resolve_policy(
        explicit,
        cli.strict,
        &mut TranscribedPrompt {
            inner: &mut *prompt,
            transcript: &transcript,
        },
    )?;
    transcript.line(&format!("Profile: {}", policy));

    let runner = host.runner.as_ref();
    let updates = software_updates(&transcript, runner, cli.apply_updates && !cli.dry_run);

    let mode = if cli.dry_run {
        ReconcileMode::DryRun
    } else {
        ReconcileMode::Apply
    };
    let console_user = session::console_user(runner, &host.session);
    tracing::debug!(console_user = ?console_user, "Resolved console user");
    let controls = standard_controls(host.runner.clone(), console_user);
    let records = Reconciler::new(&policy, mode).run(&controls, |record| {
        write_outcome(&transcript, record);
    });

    let (integrity_protection, disk_encryption) =
        integrity_and_encryption(&transcript, runner, cli.dry_run);
    let listening_sockets = listening_sockets(&transcript, runner);

    let hardening = HardeningReport::new(policy, cli.dry_run, started_at, records);
    write_report(&transcript, &hardening);
    if transcript.failed_writes() > 0 {
        tracing::warn!(lines = transcript.failed_writes(), "Run log is incomplete");
    }

    let report = RunReport {
        disposition: hardening.disposition(),
        hardening,
        updates,
        integrity_protection,
        disk_encryption,
        listening_sockets,
    };
    if cli.json {
        println!("{}", format_report_json(&report));
    }
    Ok(report)
}

fn software_updates(
    transcript: &Transcript,
    runner: &dyn CommandRunner,
    install: bool,
) -> UpdatesReport {
    transcript.section("Software updates");
    let mut report = UpdatesReport::default();
    match updates::list_updates(runner) {
        Ok(pending) => report.pending = pending,
        Err(e) => {
            tracing::warn!(error = %e, "Could not list software updates");
            transcript.line(&format!("Could not list updates: {}", e));
            report.error = Some(e.to_string());
            return report;
        }
    }
    if report.pending.is_empty() {
        transcript.line("No updates pending.");
        return report;
    }
    for update in &report.pending {
        match &update.title {
            Some(title) => transcript.line(&format!("  {} ({})", update.label, title)),
            None => transcript.line(&format!("  {}", update.label)),
        }
    }
    if !install {
        transcript.line("Re-run with --apply-updates to install.");
        return report;
    }
    transcript.line("Installing updates...");
    match updates::install_updates(runner) {
        Ok(output) => {
            for line in output.lines().filter(|l| !l.trim().is_empty()) {
                transcript.line(line);
            }
            report.installed = true;
        }
        Err(e) => {
            tracing::warn!(error = %e, "Software update install failed");
            transcript.line(&format!("Install failed: {}", e));
            report.error = Some(e.to_string());
        }
    }
    report
}

fn integrity_and_encryption(
    transcript: &Transcript,
    runner: &dyn CommandRunner,
    dry_run: bool,
) -> (ProbeResult, ProbeResult) {
    transcript.section("System Integrity Protection");
    let sip = posture::integrity_protection(runner);
    transcript.line(&format!("Status: {}", sip.state));
    if !sip.detail.is_empty() {
        transcript.line(&sip.detail);
    }
    if sip.state == ProbeState::Disabled {
        transcript.line("SIP can only be re-enabled from Recovery: csrutil enable");
    }

    transcript.section("FileVault");
    let fv = posture::disk_encryption(runner);
    transcript.line(&format!("Status: {}", fv.state));
    if !fv.detail.is_empty() {
        transcript.line(&fv.detail);
    }
    if fv.state == ProbeState::Disabled {
        if !dry_run && posture::open_encryption_settings(runner) {
            transcript.line("FileVault is off; opened the settings pane to turn it on.");
        } else {
            transcript.line("FileVault is off; enable it from System Settings.");
        }
    }
    (sip, fv)
}

fn listening_sockets(
    transcript: &Transcript,
    runner: &dyn CommandRunner,
) -> Option<Vec<ListeningSocket>> {
    transcript.section("Listening TCP sockets");
    match network::listening_sockets(runner) {
        Ok(sockets) => {
            if sockets.is_empty() {
                transcript.line("None.");
            }
            for s in &sockets {
                transcript.line(&format!(
                    "  {:<20} {:>7}  {:<10} {}",
                    s.command, s.pid, s.user, s.endpoint
                ));
            }
            Some(sockets)
        }
        Err(e) => {
            tracing::warn!(error = %e, "Could not enumerate listening sockets");
            transcript.line(&format!("Could not list sockets: {}", e));
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use macharden_core::{ActionTaken, Subsystem};
    use macharden_system::controls::firewall::SOCKETFILTERFW;
    use macharden_system::{CommandOutput, ScriptedRunner};

    struct NoPrompt;

    impl ProfilePrompt for NoPrompt {
        fn network_name(&mut self) -> String {
            "unknown".to_string()
        }

        fn ask(&mut self, _network: &str) -> io::Result<String> {
            Ok(String::new())
        }
    }

    const MUTATING: &[&str] = &[
        "--set",
        "-setremote",
        "-a womp",
        "launchctl disable",
        "launchctl bootout",
        "-deactivate",
        "defaults write",
        "--master-",
        "softwareupdate -i",
    ];

    fn host(runner: Arc<ScriptedRunner>, elevated: bool, dir: &tempfile::TempDir) -> Host {
        Host {
            runner,
            elevated,
            log_dir: dir.path().to_path_buf(),
            session: SessionConfig::default(),
            init_tracing: false,
        }
    }

    fn cli(profile: &str) -> Cli {
        Cli {
            profile_arg: Some(profile.to_string()),
            json: true,
            ..Cli::default()
        }
    }

    fn mutations(runner: &ScriptedRunner) -> Vec<String> {
        runner
            .calls()
            .into_iter()
            .filter(|c| MUTATING.iter().any(|m| c.contains(m)))
            .collect()
    }

    #[test]
    fn test_invalid_profile_fails_before_any_command() {
        let dir = tempfile::tempdir().unwrap();
        let runner = Arc::new(ScriptedRunner::new());
        let err = run(&cli("office"), &host(runner.clone(), true, &dir), &mut NoPrompt)
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ConfigError>(),
            Some(ConfigError::InvalidProfile(_))
        ));
        assert!(runner.calls().is_empty());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_conflicting_profiles_fail() {
        let dir = tempfile::tempdir().unwrap();
        let runner = Arc::new(ScriptedRunner::new());
        let args = Cli {
            profile_arg: Some("home".to_string()),
            profile: Some("public".to_string()),
            ..Cli::default()
        };
        let err = run(&args, &host(runner.clone(), true, &dir), &mut NoPrompt).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ConfigError>(),
            Some(ConfigError::ConflictingProfiles { .. })
        ));
        assert!(runner.calls().is_empty());
    }

    #[test]
    fn test_requires_elevation() {
        let dir = tempfile::tempdir().unwrap();
        let runner = Arc::new(ScriptedRunner::new());
        let err = run(&cli("home"), &host(runner.clone(), false, &dir), &mut NoPrompt)
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ConfigError>(),
            Some(ConfigError::NotElevated)
        ));
        assert!(runner.calls().is_empty());
    }

    #[test]
    fn test_dry_run_issues_no_mutations() {
        let dir = tempfile::tempdir().unwrap();
        let runner = Arc::new(ScriptedRunner::new().respond(
            "softwareupdate -l",
            CommandOutput::ok("* Label: Safari18.1-18.1\n\tTitle: Safari, Version: 18.1\n"),
        ));
        let args = Cli {
            dry_run: true,
            apply_updates: true,
            ..cli("public")
        };
        let report = run(&args, &host(runner.clone(), true, &dir), &mut NoPrompt).unwrap();
        assert!(report.hardening.dry_run);
        assert!(!report.updates.installed);
        assert!(report
            .hardening
            .records
            .iter()
            .all(|r| matches!(r.action_taken, ActionTaken::None | ActionTaken::Unsupported)));
        assert!(mutations(&runner).is_empty(), "{:?}", mutations(&runner));
    }

    #[test]
    fn test_failed_remote_login_does_not_stop_the_run() {
        let dir = tempfile::tempdir().unwrap();
        let runner = Arc::new(
            ScriptedRunner::new()
                .respond("systemsetup -getremotelogin", CommandOutput::ok("Remote Login: On\n"))
                .respond(
                    "systemsetup -f -setremotelogin off",
                    CommandOutput::failed(
                        1,
                        "setremotelogin: Turning Remote Login on or off requires Full Disk Access",
                    ),
                )
                .respond(
                    "pmset -g",
                    CommandOutput::ok("Currently in use:\n womp                 1\n"),
                )
                .respond("pmset -a womp 0", CommandOutput::ok("")),
        );
        let report =
            run(&cli("public"), &host(runner.clone(), true, &dir), &mut NoPrompt).unwrap();
        let records = &report.hardening.records;

        assert_eq!(records.len(), Subsystem::ALL.len());
        let outcome = |s: Subsystem| records.iter().find(|r| r.subsystem == s).unwrap();
        assert_eq!(outcome(Subsystem::RemoteLogin).action_taken, ActionTaken::Failed);
        assert_eq!(outcome(Subsystem::WakeOnNetwork).action_taken, ActionTaken::Applied);
        assert_ne!(
            outcome(Subsystem::BrowserSafeDownloads).action_taken,
            ActionTaken::Applied
        );
        assert!(runner.was_called("pmset -a womp 0"));
        assert_eq!(report.disposition, Disposition::PartiallyHardened);
    }

    #[test]
    fn test_run_log_holds_transcript() {
        let dir = tempfile::tempdir().unwrap();
        let runner = Arc::new(ScriptedRunner::new().respond(
            &format!("{} --getglobalstate", SOCKETFILTERFW),
            CommandOutput::ok("Firewall is enabled. (State = 1)\n"),
        ));
        run(&cli("home"), &host(runner, true, &dir), &mut NoPrompt).unwrap();

        let logs: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(logs.len(), 1);
        let path = logs[0].as_ref().unwrap().path();
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("macos_hardening_") && name.ends_with(".log"));
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("==== Software updates ===="));
        assert!(text.contains("==== Summary ===="));
        assert!(text.contains("Profile: home"));
        assert!(!text.contains("Detected network"));
    }

    #[test]
    fn test_prompt_used_when_profile_missing() {
        let dir = tempfile::tempdir().unwrap();
        let runner = Arc::new(ScriptedRunner::new());
        let args = Cli {
            json: true,
            ..Cli::default()
        };
        let report = run(&args, &host(runner, true, &dir), &mut NoPrompt).unwrap();
        assert_eq!(report.hardening.policy.profile, macharden_core::Profile::Home);
        assert!(!report.hardening.policy.strict);

        let log = std::fs::read_dir(dir.path()).unwrap().next().unwrap().unwrap().path();
        let text = std::fs::read_to_string(log).unwrap();
        assert!(text.contains("Detected network: unknown"));
    }

    #[test]
    fn test_json_report_covers_whole_run() {
        let dir = tempfile::tempdir().unwrap();
        let runner = Arc::new(
            ScriptedRunner::new()
                .respond(
                    "csrutil status",
                    CommandOutput::ok("System Integrity Protection status: enabled.\n"),
                )
                .respond(
                    "lsof -nP -iTCP -sTCP:LISTEN",
                    CommandOutput::ok(
                        "COMMAND PID USER FD TYPE DEVICE SIZE/OFF NODE NAME\n\
sshd 1 root 3u IPv4 0x1 0t0 TCP *:22 (LISTEN)\n",
                    ),
                ),
        );
        let report = run(&cli("home"), &host(runner, true, &dir), &mut NoPrompt).unwrap();
        let json: serde_json::Value =
            serde_json::from_str(&format_report_json(&report)).unwrap();

        assert_eq!(json["policy"]["profile"], "home");
        assert_eq!(json["records"].as_array().unwrap().len(), Subsystem::ALL.len());
        assert_eq!(json["integrity_protection"]["state"], "enabled");
        assert_eq!(json["disk_encryption"]["state"], "unknown");
        assert_eq!(json["listening_sockets"][0]["endpoint"], "*:22");
        assert!(json["updates"]["error"].is_string());
        assert!(json["summary"]["skipped"].as_u64().unwrap() >= 1);
    }
}
