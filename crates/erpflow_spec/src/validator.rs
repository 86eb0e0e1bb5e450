//! Workflow definition validation.
//!
//! The reader only checks that a document is well-formed. This module checks
//! that its cross-references hold: the initial state and every transition
//! endpoint must be declared states.

use std::collections::{HashSet, VecDeque};
use std::sync::OnceLock;

use regex::Regex;

use crate::error::{DefinitionError, DefinitionResult};
use crate::models::{WorkflowDefinition, WILDCARD};

/// Validation result with details.
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn add_error(&mut self, message: impl Into<String>) {
        self.valid = false;
        self.errors.push(message.into());
    }

    pub fn add_warning(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    pub fn merge(&mut self, other: ValidationResult) {
        if !other.valid {
            self.valid = false;
        }
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
    }
}

fn identifier_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z0-9_.\-]+$").expect("identifier pattern is a valid regex"))
}

/// Validator for workflow definitions.
pub struct DefinitionValidator;

impl DefinitionValidator {
    /// Validate a definition, collecting every problem found.
    pub fn validate(definition: &WorkflowDefinition) -> ValidationResult {
        let mut result = ValidationResult::new();

        result.merge(Self::validate_header(definition));
        result.merge(Self::validate_states(definition));
        result.merge(Self::validate_transitions(definition));

        if result.valid {
            result.merge(Self::validate_reachability(definition));
        }

        result
    }

    /// Validate and turn any error into a `DefinitionError::Validation`.
    pub fn ensure_valid(definition: &WorkflowDefinition, origin: &str) -> DefinitionResult<ValidationResult> {
        let result = Self::validate(definition);
        if !result.valid {
            return Err(DefinitionError::Validation {
                origin: origin.to_string(),
                workflow_id: definition.id.clone(),
                errors: result.errors,
            });
        }
        Ok(result)
    }

    fn validate_header(definition: &WorkflowDefinition) -> ValidationResult {
        let mut result = ValidationResult::new();

        if definition.id.trim().is_empty() {
            result.add_error("Workflow id cannot be empty");
        } else if !identifier_pattern().is_match(&definition.id) {
            result.add_warning(format!(
                "Workflow id '{}' contains characters outside [A-Za-z0-9_.-]",
                definition.id
            ));
        }

        if definition.model.is_empty() {
            result.add_warning(format!("Workflow '{}' does not name a model", definition.id));
        }

        result
    }

    fn validate_states(definition: &WorkflowDefinition) -> ValidationResult {
        let mut result = ValidationResult::new();

        if definition.states.is_empty() {
            result.add_error("Workflow must declare at least one state");
        }

        let mut seen = HashSet::new();
        for state in &definition.states {
            if state.trim().is_empty() {
                result.add_error("State names cannot be empty");
                continue;
            }
            if state == WILDCARD {
                result.add_error(format!("'{}' is reserved and cannot be declared as a state", WILDCARD));
                continue;
            }
            if !seen.insert(state.as_str()) {
                result.add_warning(format!("State '{}' is declared more than once", state));
            }
            if !identifier_pattern().is_match(state) {
                result.add_warning(format!(
                    "State '{}' contains characters outside [A-Za-z0-9_.-]",
                    state
                ));
            }
        }

        if !definition.has_state(&definition.initial_state) {
            result.add_error(format!(
                "Initial state '{}' is not a declared state",
                definition.initial_state
            ));
        }

        result
    }

    fn validate_transitions(definition: &WorkflowDefinition) -> ValidationResult {
        let mut result = ValidationResult::new();
        let mut names = HashSet::new();

        for (index, transition) in definition.transitions.iter().enumerate() {
            let label = if transition.name.is_empty() {
                format!("#{}", index + 1)
            } else {
                format!("'{}'", transition.name)
            };

            if transition.name.trim().is_empty() {
                result.add_error(format!("Transition {} has an empty name", label));
            } else if !names.insert(transition.name.as_str()) {
                result.add_warning(format!(
                    "Transition {} is declared more than once; only the first declaration is used",
                    label
                ));
            }

            if transition.from.is_empty() {
                result.add_error(format!("Transition {} has no source states", label));
            }

            for source in &transition.from {
                if source != WILDCARD && !definition.has_state(source) {
                    result.add_error(format!(
                        "Transition {} starts from undeclared state '{}'",
                        label, source
                    ));
                }
            }

            if transition.is_wildcard() && transition.from.len() > 1 {
                result.add_warning(format!(
                    "Transition {} mixes '{}' with explicit states",
                    label, WILDCARD
                ));
            }

            if transition.to == WILDCARD {
                result.add_error(format!("Transition {} cannot target '{}'", label, WILDCARD));
            } else if !definition.has_state(&transition.to) {
                result.add_error(format!(
                    "Transition {} targets undeclared state '{}'",
                    label, transition.to
                ));
            }

            if transition.validator.as_deref().map_or(false, |v| v.trim().is_empty()) {
                result.add_error(format!("Transition {} names an empty validator", label));
            }
        }

        result
    }

    /// Warn about states no sequence of transitions can reach.
    fn validate_reachability(definition: &WorkflowDefinition) -> ValidationResult {
        let mut result = ValidationResult::new();
        let mut reached: HashSet<&str> = HashSet::new();
        let mut queue = VecDeque::new();

        reached.insert(definition.initial_state.as_str());
        queue.push_back(definition.initial_state.as_str());

        while let Some(state) = queue.pop_front() {
            for transition in definition.transitions_from(state) {
                if reached.insert(transition.to.as_str()) {
                    queue.push_back(transition.to.as_str());
                }
            }
        }

        for state in &definition.states {
            if !reached.contains(state.as_str()) {
                result.add_warning(format!(
                    "State '{}' is unreachable from '{}'",
                    state, definition.initial_state
                ));
            }
        }

        result
    }
}
