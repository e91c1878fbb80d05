//! Error taxonomy.
//!
//! `ConfigError` is fatal and aborts the run before any mutation.
//! `CollaboratorError` never escapes a subsystem: the engine folds it into an
//! `unknown`, `failed` or `unsupported` outcome.

use thiserror::Error;

/// Fatal configuration errors. The binary maps every variant to exit status 1.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid profile '{0}': expected 'home' or 'public'")]
    InvalidProfile(String),

    #[error("Conflicting profiles: '{positional}' and --profile '{flag}'")]
    ConflictingProfiles { positional: String, flag: String },

    #[error("This tool must be run with administrative privileges (try: sudo macharden)")]
    NotElevated,

    #[error("Failed to read profile from prompt: {0}")]
    Prompt(#[from] std::io::Error),
}

/// Errors from invoking an external system utility.
#[derive(Debug, Error)]
pub enum CollaboratorError {
    #[error("'{program}' is not available on this system")]
    Missing { program: String },

    #[error("Failed to spawn '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("'{command}' exited with {status}: {detail}")]
    Failed {
        command: String,
        status: String,
        detail: String,
    },
}

impl CollaboratorError {
    /// True when the utility itself is absent, as opposed to failing.
    pub fn is_missing(&self) -> bool {
        matches!(self, CollaboratorError::Missing { .. })
    }
}
