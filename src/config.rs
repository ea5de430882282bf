//! Orchestrator configuration.
//!
//! Built once at program start and handed to the orchestrator by value.
//! The orchestrator itself never looks at the environment.

use crate::error::DeployError;
use std::path::PathBuf;

/// Environment variable read by [`OrchestratorConfig::from_env`] for the cache directory.
pub const ENV_CACHE_DIR: &str = "MIGRATE_CACHE_DIR";
/// Environment variable read by [`OrchestratorConfig::from_env`] to skip all prompts.
pub const ENV_ASSUME_YES: &str = "MIGRATE_ASSUME_YES";

/// Orchestrator configuration.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Directory holding one cache document per network.
    pub cache_dir: PathBuf,
    /// Cache document name prefix; the chain id is appended.
    pub cache_prefix: String,
    /// Treat every deploy as `no_confirm`.
    pub assume_yes: bool,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            cache_dir: PathBuf::from("."),
            cache_prefix: ".cache-".to_string(),
            assume_yes: false,
        }
    }
}

impl OrchestratorConfig {
    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = dir.into();
        self
    }

    pub fn with_cache_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.cache_prefix = prefix.into();
        self
    }

    pub fn with_assume_yes(mut self, assume_yes: bool) -> Self {
        self.assume_yes = assume_yes;
        self
    }

    /// Defaults overridden by `MIGRATE_CACHE_DIR` and `MIGRATE_ASSUME_YES`.
    pub fn from_env() -> Result<Self, DeployError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, DeployError> {
        let mut config = Self::default();
        if let Some(dir) = lookup(ENV_CACHE_DIR).filter(|d| !d.is_empty()) {
            config.cache_dir = PathBuf::from(dir);
        }
        if let Some(raw) = lookup(ENV_ASSUME_YES) {
            config.assume_yes = parse_bool(&raw).ok_or_else(|| {
                DeployError::Config(format!("{ENV_ASSUME_YES}={raw:?} is not a boolean"))
            })?;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), DeployError> {
        if self.cache_prefix.is_empty() {
            return Err(DeployError::Config("cache prefix must not be empty".into()));
        }
        if self.cache_prefix.contains(['/', '\\']) {
            return Err(DeployError::Config(format!(
                "cache prefix {:?} must not contain path separators",
                self.cache_prefix
            )));
        }
        Ok(())
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "y" => Some(true),
        "0" | "false" | "no" | "n" | "" => Some(false),
        _ => None,
    }
}
