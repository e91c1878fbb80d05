//! Observability: tracing init, the per-run log file, and the console transcript.
//!
//! Uses config::ObservabilityConfig for MACHARDEN_QUIET, LOG_LEVEL, LOG_JSON and LOG_DIR.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Local};
use tracing_subscriber::{prelude::*, EnvFilter};

const LOG_PREFIX: &str = "macos_hardening";

/// Initialize tracing. Call at process startup, after the run log is opened.
///
/// Diagnostics go to stderr. With a run log they are also appended to it,
/// without ANSI colour codes.
pub fn init_tracing(run_log: Option<&RunLog>) {
    let cfg = crate::config::ObservabilityConfig::from_env();
    let level = if cfg.quiet {
        "warn".to_string()
    } else {
        cfg.log_level.clone()
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&level));

    let file_layer = run_log
        .and_then(|log| log.try_clone_file().ok())
        .map(|file| {
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_target(true)
                .with_writer(Mutex::new(file))
        });

    let _ = if cfg.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(file_layer)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_writer(io::stderr),
            )
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(file_layer)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_writer(io::stderr),
            )
            .try_init()
    };
}

/// Append-only log for one run: `<dir>/macos_hardening_<YYYYMMDD>_<HHMMSS>.log`.
#[derive(Debug)]
pub struct RunLog {
    path: PathBuf,
    file: Mutex<File>,
}

impl RunLog {
    pub fn file_name(started_at: DateTime<Local>) -> String {
        format!("{}_{}.log", LOG_PREFIX, started_at.format("%Y%m%d_%H%M%S"))
    }

    pub fn create_in(dir: &Path, started_at: DateTime<Local>) -> io::Result<Self> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(Self::file_name(started_at));
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Second handle on the same file, for the tracing layer.
    pub fn try_clone_file(&self) -> io::Result<File> {
        let guard = self
            .file
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "run log lock poisoned"))?;
        guard.try_clone()
    }

    /// Append one timestamped line.
    pub fn append_line(&self, line: &str) -> io::Result<()> {
        let stamp = Local::now().format("%Y-%m-%d %H:%M:%S");
        let mut guard = self
            .file
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "run log lock poisoned"))?;
        writeln!(guard, "[{}] {}", stamp, line)
    }
}

/// Sectioned console transcript, mirrored into the run log.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    log: Option<Arc<RunLog>>,
    quiet_console: bool,
    failed_writes: Arc<AtomicUsize>,
}

impl Transcript {
    pub fn new(log: Option<Arc<RunLog>>) -> Self {
        Self {
            log,
            quiet_console: false,
            failed_writes: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Keep writing the log but stop echoing to stdout (used with `--json`).
    pub fn without_console(mut self) -> Self {
        self.quiet_console = true;
        self
    }

    pub fn log_path(&self) -> Option<&Path> {
        self.log.as_deref().map(RunLog::path)
    }

    pub fn section(&self, title: &str) {
        self.blank();
        self.line(&format!("==== {} ====", title));
    }

    pub fn line(&self, text: &str) {
        if !self.quiet_console {
            println!("{}", text);
        }
        self.append(text);
    }

    pub fn blank(&self) {
        if !self.quiet_console {
            println!();
        }
        self.append("");
    }

    /// Write failures are warned about and counted, never fatal.
    fn append(&self, text: &str) {
        let Some(log) = &self.log else {
            return;
        };
        if let Err(e) = log.append_line(text) {
            self.failed_writes.fetch_add(1, Ordering::Relaxed);
            tracing::warn!(error = %e, path = %log.path().display(), "Failed to write run log");
        }
    }

    /// Number of transcript lines that could not be written to the run log.
    pub fn failed_writes(&self) -> usize {
        self.failed_writes.load(Ordering::Relaxed)
    }
}
