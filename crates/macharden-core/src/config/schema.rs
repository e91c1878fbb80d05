//! Typed configuration structs, loaded from the environment.

use super::env_keys::{observability as obv_keys, session as session_keys};
use super::loader::{env_bool, env_optional, env_or};
use std::path::PathBuf;

/// Logging configuration
#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    pub quiet: bool,
    pub log_level: String,
    pub log_json: bool,
    /// Explicit directory for the run log. `None` means the home directory.
    pub log_dir: Option<PathBuf>,
}

impl ObservabilityConfig {
    pub fn from_env() -> Self {
        Self {
            quiet: env_bool(obv_keys::MACHARDEN_QUIET, obv_keys::QUIET_ALIASES, false),
            log_level: env_or(
                obv_keys::MACHARDEN_LOG_LEVEL,
                obv_keys::LOG_LEVEL_ALIASES,
                || "info".to_string(),
            ),
            log_json: env_bool(obv_keys::MACHARDEN_LOG_JSON, obv_keys::LOG_JSON_ALIASES, false),
            log_dir: env_optional(obv_keys::MACHARDEN_LOG_DIR, obv_keys::LOG_DIR_ALIASES)
                .map(PathBuf::from),
        }
    }

    /// Directory the run log is written into.
    pub fn resolved_log_dir(&self) -> PathBuf {
        self.log_dir.clone().unwrap_or_else(|| {
            dirs::home_dir().unwrap_or_else(|| {
                std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
            })
        })
    }
}

/// Who owns the graphical session
#[derive(Debug, Clone, Default)]
pub struct SessionConfig {
    /// `MACHARDEN_CONSOLE_USER`, else `SUDO_USER`.
    pub console_user: Option<String>,
}

impl SessionConfig {
    pub fn from_env() -> Self {
        Self {
            console_user: env_optional(
                session_keys::MACHARDEN_CONSOLE_USER,
                session_keys::CONSOLE_USER_ALIASES,
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_log_dir_wins() {
        let cfg = ObservabilityConfig {
            quiet: false,
            log_level: "info".to_string(),
            log_json: false,
            log_dir: Some(PathBuf::from("/var/tmp/hardening")),
        };
        assert_eq!(cfg.resolved_log_dir(), PathBuf::from("/var/tmp/hardening"));
    }
}
