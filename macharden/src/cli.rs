use clap::Parser;

/// macharden - profile-driven macOS security hardening
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "macharden")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Network-trust profile: home or public (prompted when omitted)
    #[arg(value_name = "PROFILE")]
    pub profile_arg: Option<String>,

    /// Same as the positional PROFILE; both must agree when given together
    #[arg(long, value_name = "PROFILE")]
    pub profile: Option<String>,

    /// Apply public-level hardening regardless of profile
    #[arg(long, default_value = "false")]
    pub strict: bool,

    /// Install pending software updates (otherwise they are only listed)
    #[arg(long, default_value = "false")]
    pub apply_updates: bool,

    /// Probe and report what would change without changing anything
    #[arg(long, default_value = "false")]
    pub dry_run: bool,

    /// Print the outcome report as JSON on stdout instead of the transcript
    #[arg(long, default_value = "false")]
    pub json: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positional_profile() {
        let cli = Cli::try_parse_from(["macharden", "public", "--strict"]).unwrap();
        assert_eq!(cli.profile_arg.as_deref(), Some("public"));
        assert!(cli.strict);
        assert!(!cli.apply_updates);
    }

    #[test]
    fn test_flag_profile() {
        let cli =
            Cli::try_parse_from(["macharden", "--profile", "home", "--dry-run", "--json"]).unwrap();
        assert_eq!(cli.profile.as_deref(), Some("home"));
        assert!(cli.profile_arg.is_none());
        assert!(cli.dry_run && cli.json);
    }

    #[test]
    fn test_no_arguments_is_valid() {
        let cli = Cli::try_parse_from(["macharden"]).unwrap();
        assert!(cli.profile_arg.is_none() && cli.profile.is_none());
    }
}
