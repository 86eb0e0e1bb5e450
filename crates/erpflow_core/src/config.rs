//! Engine configuration.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// What a transition does when its named validator was never registered.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum MissingValidatorPolicy {
    /// Fail with `ValidatorNotRegistered`
    #[default]
    Reject,
    /// Proceed unvalidated and log a warning
    Allow,
}

/// What a load does when a workflow id is already present.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// The later definition replaces the earlier one
    #[default]
    Replace,
    /// Fail with `DuplicateWorkflow`
    Reject,
}

/// State machine factory configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct EngineConfig {
    /// Check cross-references of every definition before loading it
    pub validate_on_load: bool,
    /// Behaviour for transitions naming an unregistered validator
    pub missing_validator: MissingValidatorPolicy,
    /// Behaviour for duplicate workflow ids
    pub duplicate_ids: DuplicatePolicy,
    /// File extensions read from a workflow directory (empty = every file)
    pub extensions: Vec<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            validate_on_load: true,
            missing_validator: MissingValidatorPolicy::default(),
            duplicate_ids: DuplicatePolicy::default(),
            extensions: Vec::new(),
        }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reproduce the permissive behaviour: unregistered validators are skipped.
    pub fn allow_missing_validators(mut self) -> Self {
        self.missing_validator = MissingValidatorPolicy::Allow;
        self
    }

    pub fn with_duplicate_policy(mut self, policy: DuplicatePolicy) -> Self {
        self.duplicate_ids = policy;
        self
    }

    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extensions = extensions.into_iter().map(Into::into).collect();
        self
    }

    pub fn skip_validation(mut self) -> Self {
        self.validate_on_load = false;
        self
    }

    /// Load configuration from a TOML or YAML file, picked by extension.
    pub fn from_file(path: impl AsRef<Path>) -> EngineResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;

        let is_toml = path.extension().map_or(false, |e| e == "toml");
        let parsed = if is_toml {
            toml::from_str(&content).map_err(|e| e.to_string())
        } else {
            serde_yaml::from_str(&content).map_err(|e| e.to_string())
        };

        parsed.map_err(|e| EngineError::Config(format!("{}: {}", path.display(), e)))
    }
}
