//! Profile resolution: turn CLI input or an interactive answer into an
//! immutable `EffectivePolicy`.
//!
//! Resolution never touches system state. The only side effect is whatever the
//! `ProfilePrompt` implementation prints.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ConfigError;
use crate::policy::{self, DesiredState, Subsystem};

/// Network-trust context selecting a hardening posture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Profile {
    #[default]
    Home,
    Public,
}

impl Profile {
    pub fn as_str(self) -> &'static str {
        match self {
            Profile::Home => "home",
            Profile::Public => "public",
        }
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Case-insensitive, surrounding whitespace ignored.
impl FromStr for Profile {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "home" => Ok(Profile::Home),
            "public" => Ok(Profile::Public),
            _ => Err(ConfigError::InvalidProfile(trimmed.to_string())),
        }
    }
}

/// Profile plus the strict modifier. Created once per run and passed by
/// reference; never mutated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectivePolicy {
    pub profile: Profile,
    pub strict: bool,
}

impl EffectivePolicy {
    pub fn new(profile: Profile, strict: bool) -> Self {
        Self { profile, strict }
    }

    /// Strict always lifts `home` to `public` targets; it never lowers `public`.
    pub fn is_public_level(&self) -> bool {
        self.strict || self.profile == Profile::Public
    }

    pub fn desired_state(&self, subsystem: Subsystem) -> DesiredState {
        policy::desired_state(subsystem, self)
    }
}

impl fmt::Display for EffectivePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.strict {
            write!(f, "{} (strict)", self.profile)
        } else {
            write!(f, "{}", self.profile)
        }
    }
}

/// Interactive source for the profile when none was given on the command line.
pub trait ProfilePrompt {
    /// Best-effort name of the current network. Returns `"unknown"` on failure.
    fn network_name(&mut self) -> String;

    /// Ask the operator for a profile. An empty answer means `home`.
    fn ask(&mut self, network: &str) -> std::io::Result<String>;
}

/// Combine the positional token and the `--profile` flag.
///
/// Both are validated; when both are present they must name the same profile.
pub fn explicit_profile(
    positional: Option<&str>,
    flag: Option<&str>,
) -> Result<Option<Profile>, ConfigError> {
    let from_positional = positional.map(Profile::from_str).transpose()?;
    let from_flag = flag.map(Profile::from_str).transpose()?;
    match (from_positional, from_flag) {
        (Some(p), Some(f)) if p != f => Err(ConfigError::ConflictingProfiles {
            positional: p.to_string(),
            flag: f.to_string(),
        }),
        (p, f) => Ok(p.or(f)),
    }
}

/// Resolve the effective policy, prompting only when no profile was given.
pub fn resolve_policy(
    explicit: Option<Profile>,
    strict: bool,
    prompt: &mut dyn ProfilePrompt,
) -> Result<EffectivePolicy, ConfigError> {
    let profile = match explicit {
        Some(p) => p,
        None => {
            let network = prompt.network_name();
            let answer = prompt.ask(&network)?;
            if answer.trim().is_empty() {
                Profile::Home
            } else {
                answer.parse()?
            }
        }
    };
    tracing::info!(profile = %profile, strict, "Resolved hardening profile");
    Ok(EffectivePolicy::new(profile, strict))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct CannedPrompt {
        network: String,
        answer: String,
        asked_with: Option<String>,
    }

    impl CannedPrompt {
        fn new(network: &str, answer: &str) -> Self {
            Self {
                network: network.to_string(),
                answer: answer.to_string(),
                asked_with: None,
            }
        }
    }

    impl ProfilePrompt for CannedPrompt {
        fn network_name(&mut self) -> String {
            self.network.clone()
        }

        fn ask(&mut self, network: &str) -> std::io::Result<String> {
            self.asked_with = Some(network.to_string());
            Ok(self.answer.clone())
        }
    }

    #[test]
    fn test_profile_normalisation() {
        for raw in ["Public", "PUBLIC", " public ", "public\n"] {
            assert_eq!(raw.parse::<Profile>().unwrap(), Profile::Public);
        }
        assert_eq!("HOME".parse::<Profile>().unwrap(), Profile::Home);
    }

    #[test]
    fn test_unknown_profile_rejected() {
        let err = "office".parse::<Profile>().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidProfile(ref s) if s == "office"));
    }

    #[test]
    fn test_explicit_profile_sources() {
        assert_eq!(explicit_profile(None, None).unwrap(), None);
        assert_eq!(
            explicit_profile(Some("public"), None).unwrap(),
            Some(Profile::Public)
        );
        assert_eq!(
            explicit_profile(None, Some("Home")).unwrap(),
            Some(Profile::Home)
        );
        assert_eq!(
            explicit_profile(Some("public"), Some("PUBLIC")).unwrap(),
            Some(Profile::Public)
        );
        assert!(matches!(
            explicit_profile(Some("home"), Some("public")),
            Err(ConfigError::ConflictingProfiles { .. })
        ));
        assert!(explicit_profile(Some("office"), None).is_err());
    }

    #[test]
    fn test_prompt_empty_answer_defaults_home() {
        let mut prompt = CannedPrompt::new("CoffeeShop", "  ");
        let policy = resolve_policy(None, false, &mut prompt).unwrap();
        assert_eq!(policy.profile, Profile::Home);
        assert_eq!(prompt.asked_with.as_deref(), Some("CoffeeShop"));
    }

    #[test]
    fn test_prompt_answer_parsed() {
        let mut prompt = CannedPrompt::new("unknown", "Public");
        let policy = resolve_policy(None, false, &mut prompt).unwrap();
        assert_eq!(policy.profile, Profile::Public);
    }

    #[test]
    fn test_prompt_invalid_answer_is_fatal() {
        let mut prompt = CannedPrompt::new("unknown", "office");
        assert!(resolve_policy(None, true, &mut prompt).is_err());
    }

    #[test]
    fn test_explicit_profile_skips_prompt() {
        let mut prompt = CannedPrompt::new("HomeWifi", "public");
        let policy = resolve_policy(Some(Profile::Home), true, &mut prompt).unwrap();
        assert_eq!(policy, EffectivePolicy::new(Profile::Home, true));
        assert!(prompt.asked_with.is_none());
    }

    #[test]
    fn test_strict_lifts_home_only() {
        assert!(!EffectivePolicy::new(Profile::Home, false).is_public_level());
        assert!(EffectivePolicy::new(Profile::Home, true).is_public_level());
        assert!(EffectivePolicy::new(Profile::Public, false).is_public_level());
        assert_eq!(EffectivePolicy::new(Profile::Home, true).to_string(), "home (strict)");
    }
}
