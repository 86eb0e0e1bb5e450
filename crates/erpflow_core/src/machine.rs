//! Workflow state machine.
//!
//! A `StateMachine` binds one immutable `WorkflowDefinition` to a validator
//! registry. It can be driven two ways:
//!
//! - **Stateful**: [`StateMachine::transition`] moves the machine's own
//!   current state. All attempts on one instance are serialized.
//! - **Entity-owned state**: [`StateMachine::apply`] takes the entity's
//!   current state from the caller (usually read from its persisted record)
//!   and returns the new state. Only the definition and the validator
//!   registry are shared, so many entities of one workflow type can be
//!   driven concurrently through the same instance.
//!
//! Neither path persists anything; a successful transition is an in-memory
//! fact until the caller records it.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use erpflow_spec::{TransitionDefinition, WorkflowDefinition};

use crate::config::MissingValidatorPolicy;
use crate::context::TransitionContext;
use crate::error::{EngineError, EngineResult};
use crate::registry::ValidatorRegistry;
use crate::validator::{Entity, TransitionValidator};

/// Record of a transition that passed every check.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TransitionOutcome {
    pub workflow_id: String,
    pub transition: String,
    pub from: String,
    pub to: String,
    /// Authorization tag declared on the transition, for the caller to enforce
    pub permission: Option<String>,
    pub at: DateTime<Utc>,
}

/// Runtime instance of one workflow definition.
#[derive(Debug)]
pub struct StateMachine {
    definition: Arc<WorkflowDefinition>,
    missing_validator: MissingValidatorPolicy,
    current: RwLock<String>,
    validators: SharedRegistry,
}

/// Validator registry shared by every machine loaded for one workflow id.
pub(crate) type SharedRegistry = Arc<RwLock<ValidatorRegistry>>;

impl StateMachine {
    /// Create a state machine positioned at the workflow's initial state.
    pub fn new(definition: impl Into<Arc<WorkflowDefinition>>) -> Self {
        Self::with_policy(definition, MissingValidatorPolicy::default())
    }

    pub fn with_policy(
        definition: impl Into<Arc<WorkflowDefinition>>,
        missing_validator: MissingValidatorPolicy,
    ) -> Self {
        Self::with_registry(definition, missing_validator, SharedRegistry::default())
    }

    pub(crate) fn with_registry(
        definition: impl Into<Arc<WorkflowDefinition>>,
        missing_validator: MissingValidatorPolicy,
        validators: SharedRegistry,
    ) -> Self {
        let definition = definition.into();
        Self {
            current: RwLock::new(definition.initial_state.clone()),
            definition,
            missing_validator,
            validators,
        }
    }

    pub(crate) fn shared_validators(&self) -> SharedRegistry {
        Arc::clone(&self.validators)
    }

    pub fn definition(&self) -> &WorkflowDefinition {
        &self.definition
    }

    pub fn workflow_id(&self) -> &str {
        &self.definition.id
    }

    pub fn missing_validator_policy(&self) -> MissingValidatorPolicy {
        self.missing_validator
    }

    /// Current state of the stateful machine.
    pub async fn current_state(&self) -> String {
        self.current.read().await.clone()
    }

    /// Register a validator under `name`, replacing any previous one.
    pub async fn register_validator(&self, name: impl Into<String>, validator: Arc<dyn TransitionValidator>) {
        self.validators.write().await.register(name, validator);
    }

    pub async fn has_validator(&self, name: &str) -> bool {
        self.validators.read().await.contains(name)
    }

    /// Validator names referenced by transitions but not registered.
    pub async fn unregistered_validators(&self) -> Vec<String> {
        let validators = self.validators.read().await;
        self.definition
            .validator_names()
            .into_iter()
            .filter(|name| !validators.contains(name))
            .map(str::to_string)
            .collect()
    }

    /// Transitions a caller may request while in `state`.
    pub fn available_transitions(&self, state: &str) -> Vec<&TransitionDefinition> {
        self.definition.transitions_from(state)
    }

    /// Permission tag of the transition a request for `name` would use.
    pub fn permission_for(&self, name: &str) -> Option<&str> {
        self.definition
            .find_transition(name)
            .and_then(|t| t.permission.as_deref())
    }

    /// Apply `name` to the machine's own current state.
    ///
    /// Lookup, eligibility, validation and the state update happen under one
    /// exclusive lock, so concurrent calls never interleave. A failed attempt
    /// leaves the current state unchanged. The validator runs while that lock
    /// is held and must not call back into this method.
    pub async fn transition(
        &self,
        ctx: &TransitionContext,
        name: &str,
        entity: &Entity,
    ) -> EngineResult<TransitionOutcome> {
        let mut current = self.current.write().await;
        let outcome = self.evaluate(ctx, current.as_str(), name, entity).await?;
        *current = outcome.to.clone();
        Ok(outcome)
    }

    /// Apply `name` to an entity whose current state the caller supplies.
    ///
    /// Returns the outcome holding the new state; the machine's own current
    /// state is not touched.
    pub async fn apply(
        &self,
        ctx: &TransitionContext,
        current_state: &str,
        name: &str,
        entity: &Entity,
    ) -> EngineResult<TransitionOutcome> {
        if !self.definition.has_state(current_state) {
            return Err(EngineError::UnknownState {
                workflow: self.definition.id.clone(),
                state: current_state.to_string(),
            });
        }
        self.evaluate(ctx, current_state, name, entity).await
    }

    async fn evaluate(
        &self,
        ctx: &TransitionContext,
        from: &str,
        name: &str,
        entity: &Entity,
    ) -> EngineResult<TransitionOutcome> {
        let workflow = &self.definition.id;

        let transition = self
            .definition
            .find_transition(name)
            .ok_or_else(|| EngineError::UnknownTransition {
                workflow: workflow.clone(),
                transition: name.to_string(),
            })?;

        if !transition.allows_from(from) {
            return Err(EngineError::IllegalTransition {
                workflow: workflow.clone(),
                from: from.to_string(),
                transition: name.to_string(),
            });
        }

        if let Some(validator_name) = transition.validator.as_deref() {
            let validator = self.validators.read().await.get(validator_name);
            match validator {
                Some(validator) => {
                    validator
                        .validate(ctx, entity)
                        .await
                        .map_err(|source| EngineError::ValidationFailed {
                            workflow: workflow.clone(),
                            transition: name.to_string(),
                            validator: validator_name.to_string(),
                            source,
                        })?;
                }
                None if self.missing_validator == MissingValidatorPolicy::Allow => {
                    warn!(
                        "Validator {} for {}/{} is not registered, transition proceeds unvalidated",
                        validator_name, workflow, name
                    );
                }
                None => {
                    return Err(EngineError::ValidatorNotRegistered {
                        workflow: workflow.clone(),
                        transition: name.to_string(),
                        validator: validator_name.to_string(),
                    });
                }
            }
        }

        debug!(
            "Workflow {} [{}]: {} -> {} via {}",
            workflow, ctx.request_id, from, transition.to, name
        );

        Ok(TransitionOutcome {
            workflow_id: workflow.clone(),
            transition: name.to_string(),
            from: from.to_string(),
            to: transition.to.clone(),
            permission: transition.permission.clone(),
            at: Utc::now(),
        })
    }
}
