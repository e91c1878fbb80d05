//! Outcome reporting: live per-subsystem sections, the end-of-run summary, and
//! the JSON form of the report.

use chrono::{DateTime, Local};
use serde::Serialize;

use crate::observability::Transcript;
use crate::policy::DesiredState;
use crate::profile::EffectivePolicy;
use crate::state::{ActionTaken, OutcomeRecord};

/// Counts per action, over one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReportSummary {
    pub applied: usize,
    pub compliant: usize,
    /// Left alone because the profile has no opinion on them.
    pub skipped: usize,
    pub failed: usize,
    pub unsupported: usize,
}

impl ReportSummary {
    pub fn from_records(records: &[OutcomeRecord]) -> Self {
        records.iter().fold(Self::default(), |mut acc, r| {
            match r.action_taken {
                ActionTaken::None if r.desired_state == DesiredState::NoOpinion => acc.skipped += 1,
                ActionTaken::None => acc.compliant += 1,
                ActionTaken::Applied => acc.applied += 1,
                ActionTaken::Failed => acc.failed += 1,
                ActionTaken::Unsupported => acc.unsupported += 1,
            }
            acc
        })
    }
}

/// Overall result of a completed run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Disposition {
    /// Every subsystem ended compliant or was changed successfully.
    Hardened,
    /// Some subsystems failed or were unsupported. Still a successful run.
    PartiallyHardened,
}

#[derive(Debug, Clone, Serialize)]
pub struct HardeningReport {
    pub policy: EffectivePolicy,
    pub dry_run: bool,
    pub started_at: DateTime<Local>,
    pub finished_at: DateTime<Local>,
    pub records: Vec<OutcomeRecord>,
    pub summary: ReportSummary,
}

impl HardeningReport {
    pub fn new(
        policy: EffectivePolicy,
        dry_run: bool,
        started_at: DateTime<Local>,
        records: Vec<OutcomeRecord>,
    ) -> Self {
        let summary = ReportSummary::from_records(&records);
        Self {
            policy,
            dry_run,
            started_at,
            finished_at: Local::now(),
            records,
            summary,
        }
    }

    pub fn disposition(&self) -> Disposition {
        if self.summary.failed == 0 && self.summary.unsupported == 0 {
            Disposition::Hardened
        } else {
            Disposition::PartiallyHardened
        }
    }
}

fn action_label(record: &OutcomeRecord) -> &'static str {
    match record.action_taken {
        ActionTaken::None if record.desired_state == DesiredState::NoOpinion => "SKIPPED",
        ActionTaken::None => "OK",
        ActionTaken::Applied => "CHANGED",
        ActionTaken::Failed => "FAILED",
        ActionTaken::Unsupported => "UNSUPPORTED",
    }
}

/// Lines for the live section of one subsystem.
pub fn format_outcome(record: &OutcomeRecord) -> Vec<String> {
    let mut lines = vec![
        format!("Current: {}", record.prior_state),
        format!("Desired: {}", record.desired_state),
        format!("Result:  {} ({})", action_label(record), record.action_taken),
    ];
    if !record.detail.is_empty() {
        lines.push(format!("Detail:  {}", record.detail));
    }
    lines
}

/// Write the live section for one subsystem.
pub fn write_outcome(transcript: &Transcript, record: &OutcomeRecord) {
    transcript.section(record.subsystem.title());
    for line in format_outcome(record) {
        transcript.line(&line);
    }
}

/// Human-readable end-of-run summary.
pub fn format_report(report: &HardeningReport) -> String {
    let mut out = String::new();
    out.push_str(&format!("Profile: {}\n", report.policy));
    if report.dry_run {
        out.push_str("Mode:    dry run (no changes made)\n");
    }
    out.push('\n');

    let width = report
        .records
        .iter()
        .map(|r| r.subsystem.name().len())
        .max()
        .unwrap_or(0);
    for r in &report.records {
        out.push_str(&format!(
            "  {:<width$}  {:<11}  {} -> {}\n",
            r.subsystem.name(),
            action_label(r),
            r.prior_state,
            r.desired_state,
            width = width
        ));
    }

    let s = &report.summary;
    out.push_str(&format!(
        "\n{} changed, {} already compliant, {} skipped, {} failed, {} unsupported",
        s.applied, s.compliant, s.skipped, s.failed, s.unsupported
    ));
    if s.failed > 0 {
        out.push_str("\nSome steps failed; re-run after addressing the errors above.");
    }
    out
}

/// Write the summary section.
pub fn write_report(transcript: &Transcript, report: &HardeningReport) {
    transcript.section("Summary");
    for line in format_report(report).lines() {
        transcript.line(line);
    }
    if let Some(path) = transcript.log_path() {
        transcript.line(&format!("Log: {}", path.display()));
    }
}

/// Pretty JSON for `--json`. Takes any serializable wrapper around the report.
pub fn format_report_json<T: Serialize>(report: &T) -> String {
    serde_json::to_string_pretty(report).unwrap_or_else(|e| {
        serde_json::json!({ "error": format!("failed to serialize report: {}", e) }).to_string()
    })
}
