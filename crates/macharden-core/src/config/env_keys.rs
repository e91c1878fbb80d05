//! Environment variable keys and their aliases.
//!
//! Primary keys use the `MACHARDEN_*` prefix. Aliases are read when the
//! primary key is unset.

/// Logging and run-log placement
pub mod observability {
    pub const MACHARDEN_QUIET: &str = "MACHARDEN_QUIET";
    pub const QUIET_ALIASES: &[&str] = &[];

    pub const MACHARDEN_LOG_LEVEL: &str = "MACHARDEN_LOG_LEVEL";
    pub const LOG_LEVEL_ALIASES: &[&str] = &[];

    pub const MACHARDEN_LOG_JSON: &str = "MACHARDEN_LOG_JSON";
    pub const LOG_JSON_ALIASES: &[&str] = &[];

    /// Directory for `macos_hardening_<date>_<time>.log`. Defaults to the home directory.
    pub const MACHARDEN_LOG_DIR: &str = "MACHARDEN_LOG_DIR";
    pub const LOG_DIR_ALIASES: &[&str] = &[];
}

/// Graphical session lookup
pub mod session {
    /// Explicit owner of the graphical session (for per-user preferences).
    pub const MACHARDEN_CONSOLE_USER: &str = "MACHARDEN_CONSOLE_USER";
    /// Set by sudo to the invoking user.
    pub const CONSOLE_USER_ALIASES: &[&str] = &["SUDO_USER"];
}
