//! AWS credential profile selection
//!
//! A `--profile` given on the command line is applied to every sops process
//! the run spawns. The calling process's own environment is never modified,
//! so the override cannot outlive the run on any exit path.

use std::env;
use std::process::Command;

use tracing::info;

/// Environment variable the AWS credential chain (and therefore sops) reads.
pub const AWS_PROFILE_ENV: &str = "AWS_PROFILE";

/// Where the AWS profile for a run comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileSelection {
    /// Passed explicitly; overrides `AWS_PROFILE` for the sops subprocesses.
    Explicit(String),
    /// Not passed, but `AWS_PROFILE` is already set in the environment.
    Inherited(String),
    /// Neither; sops falls back to the default credential chain.
    DefaultChain,
}

impl ProfileSelection {
    /// Resolves the selection from the flag value and the inherited variable.
    pub fn resolve(flag: Option<&str>, inherited: Option<String>) -> Self {
        match (flag, inherited) {
            (Some(profile), _) => Self::Explicit(profile.to_string()),
            (None, Some(profile)) if !profile.is_empty() => Self::Inherited(profile),
            _ => Self::DefaultChain,
        }
    }

    /// Like [`ProfileSelection::resolve`], reading `AWS_PROFILE` from the current process.
    pub fn from_env(flag: Option<&str>) -> Self {
        Self::resolve(flag, env::var(AWS_PROFILE_ENV).ok())
    }

    /// The value to force into child processes, if any.
    pub fn override_value(&self) -> Option<&str> {
        match self {
            Self::Explicit(profile) => Some(profile),
            Self::Inherited(_) | Self::DefaultChain => None,
        }
    }

    /// Sets `AWS_PROFILE` on `cmd` when the profile was given explicitly.
    ///
    /// Inherited values already reach the child through normal environment
    /// inheritance and are left alone.
    pub fn apply(&self, cmd: &mut Command) {
        if let Some(profile) = self.override_value() {
            cmd.env(AWS_PROFILE_ENV, profile);
        }
    }

    pub fn log(&self) {
        match self {
            Self::Explicit(profile) => info!("Using AWS profile: {}", profile),
            Self::Inherited(profile) => info!("Using existing AWS profile: {}", profile),
            Self::DefaultChain => info!("Using default AWS credentials"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_wins_over_inherited() {
        let selection = ProfileSelection::resolve(Some("prod"), Some("dev".to_string()));
        assert_eq!(selection, ProfileSelection::Explicit("prod".to_string()));
        assert_eq!(selection.override_value(), Some("prod"));
    }

    #[test]
    fn test_inherited_profile() {
        let selection = ProfileSelection::resolve(None, Some("dev".to_string()));
        assert_eq!(selection, ProfileSelection::Inherited("dev".to_string()));
        assert_eq!(selection.override_value(), None);
    }

    #[test]
    fn test_empty_inherited_profile_is_default_chain() {
        let selection = ProfileSelection::resolve(None, Some(String::new()));
        assert_eq!(selection, ProfileSelection::DefaultChain);
    }

    #[test]
    fn test_default_chain() {
        assert_eq!(
            ProfileSelection::resolve(None, None),
            ProfileSelection::DefaultChain
        );
    }

    #[test]
    fn test_apply_sets_child_env_only() {
        let before = env::var_os(AWS_PROFILE_ENV);

        let mut cmd = Command::new("sops");
        ProfileSelection::Explicit("staging".to_string()).apply(&mut cmd);

        let envs: Vec<_> = cmd.get_envs().collect();
        assert_eq!(envs.len(), 1);
        assert_eq!(envs[0].0, AWS_PROFILE_ENV);
        assert_eq!(envs[0].1.and_then(|v| v.to_str()), Some("staging"));
        assert_eq!(env::var_os(AWS_PROFILE_ENV), before);
    }

    #[test]
    fn test_apply_without_override_leaves_command_untouched() {
        let mut cmd = Command::new("sops");
        ProfileSelection::Inherited("dev".to_string()).apply(&mut cmd);
        ProfileSelection::DefaultChain.apply(&mut cmd);
        assert_eq!(cmd.get_envs().count(), 0);
    }
}
