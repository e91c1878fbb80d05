//! Who is running the tool and who owns the graphical session.

use macharden_core::config::SessionConfig;

use crate::runner::CommandRunner;

/// True when running with an effective uid of 0.
#[cfg(unix)]
pub fn is_elevated() -> bool {
    nix::unistd::geteuid().is_root()
}

#[cfg(not(unix))]
pub fn is_elevated() -> bool {
    false
}

/// Owner of the graphical session, for per-user preferences.
///
/// `MACHARDEN_CONSOLE_USER`, then `SUDO_USER`, then the owner of `/dev/console`.
pub fn console_user(runner: &dyn CommandRunner, config: &SessionConfig) -> Option<String> {
    if let Some(user) = config.console_user.as_deref().and_then(normalize_user) {
        return Some(user);
    }
    let out = runner.run("stat", &["-f%Su", "/dev/console"]).ok()?;
    if !out.success() {
        return None;
    }
    normalize_user(&out.stdout)
}

/// `root` and `loginwindow` mean nobody is logged in at the console.
fn normalize_user(raw: &str) -> Option<String> {
    let user = raw.trim();
    match user {
        "" | "root" | "loginwindow" => None,
        _ => Some(user.to_string()),
    }
}
