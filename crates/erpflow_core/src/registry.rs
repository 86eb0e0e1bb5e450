//! Validator registry mapping validator names to implementations.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::validator::TransitionValidator;

/// A registry of transition validators.
///
/// Transition definitions refer to validators by name; the registry resolves
/// those names to implementations at transition time.
#[derive(Default, Clone)]
pub struct ValidatorRegistry {
    validators: HashMap<String, Arc<dyn TransitionValidator>>,
}

impl ValidatorRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            validators: HashMap::new(),
        }
    }

    /// Register a validator under `name`, replacing any previous one.
    pub fn register(&mut self, name: impl Into<String>, validator: Arc<dyn TransitionValidator>) {
        let name = name.into();
        debug!("Registering validator: {}", name);
        self.validators.insert(name, validator);
    }

    /// Get a validator by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn TransitionValidator>> {
        self.validators.get(name).cloned()
    }

    /// Check if a validator is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.validators.contains_key(name)
    }

    /// Get all registered validator names.
    pub fn names(&self) -> Vec<&str> {
        self.validators.keys().map(|s| s.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.validators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.validators.is_empty()
    }

    /// Remove a validator from the registry.
    pub fn unregister(&mut self, name: &str) -> Option<Arc<dyn TransitionValidator>> {
        debug!("Unregistering validator: {}", name);
        self.validators.remove(name)
    }
}

impl std::fmt::Debug for ValidatorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValidatorRegistry")
            .field("validators", &self.validators.keys().collect::<Vec<_>>())
            .finish()
    }
}
