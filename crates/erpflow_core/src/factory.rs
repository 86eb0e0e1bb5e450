//! State machine factory: loads workflow definitions and indexes them by id.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use erpflow_spec::{DefinitionError, DefinitionReader, DefinitionValidator, WorkflowDefinition};

use crate::config::{DuplicatePolicy, EngineConfig};
use crate::context::TransitionContext;
use crate::error::{EngineError, EngineResult};
use crate::machine::{StateMachine, TransitionOutcome};
use crate::validator::{Entity, TransitionValidator};

/// Registry of state machines keyed by workflow id.
///
/// Loads are all-or-nothing: every document of a load is parsed and checked
/// before the registry is touched, so a failing load leaves previously
/// loaded workflows in place.
#[derive(Debug, Default)]
pub struct StateMachineFactory {
    config: EngineConfig,
    machines: RwLock<HashMap<String, Arc<StateMachine>>>,
}

impl StateMachineFactory {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            machines: RwLock::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Load every workflow document directly inside `dir`.
    ///
    /// Returns the number of documents loaded.
    pub async fn load_from_directory(&self, dir: impl AsRef<Path>) -> EngineResult<usize> {
        let dir = dir.as_ref();
        info!("Loading workflows from {:?}", dir);

        let batch = DefinitionReader::read_dir(dir, &self.config.extensions)?
            .into_iter()
            .map(|(path, definition)| -> Result<_, DefinitionError> {
                let origin = path.display().to_string();
                self.check(&definition, &origin)
                    .map_err(|e| DefinitionError::Load {
                        path,
                        source: Box::new(e),
                    })?;
                Ok((origin, definition))
            })
            .collect::<Result<Vec<_>, DefinitionError>>()?;

        let count = batch.len();
        self.insert_all(batch).await?;

        info!("Loaded {} workflow(s) from {:?}", count, dir);
        Ok(count)
    }

    /// Load a single workflow document.
    pub async fn load_file(&self, path: impl AsRef<Path>) -> EngineResult<Arc<StateMachine>> {
        let path = path.as_ref();
        let definition = DefinitionReader::read_file(path)?;
        let origin = path.display().to_string();
        self.check(&definition, &origin)?;
        self.insert_one(origin, definition).await
    }

    /// Load a definition built in code.
    pub async fn load_definition(&self, definition: WorkflowDefinition) -> EngineResult<Arc<StateMachine>> {
        let origin = format!("<definition {}>", definition.id);
        self.check(&definition, &origin)?;
        self.insert_one(origin, definition).await
    }

    /// Look up the state machine of `workflow_id`.
    ///
    /// A handle kept across a reload still shares its validator registry
    /// with the replacement, but keeps the definition it was loaded with.
    pub async fn get_state_machine(&self, workflow_id: &str) -> Option<Arc<StateMachine>> {
        self.machines.read().await.get(workflow_id).cloned()
    }

    /// Snapshot of every loaded state machine.
    ///
    /// The map is a copy; changing it does not affect the factory.
    pub async fn get_all_state_machines(&self) -> HashMap<String, Arc<StateMachine>> {
        self.machines.read().await.clone()
    }

    /// Loaded workflow ids, sorted.
    pub async fn workflow_ids(&self) -> Vec<String> {
        let mut ids: Vec<_> = self.machines.read().await.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub async fn len(&self) -> usize {
        self.machines.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.machines.read().await.is_empty()
    }

    /// Register a validator on the state machine of `workflow_id`.
    pub async fn register_validator(
        &self,
        workflow_id: &str,
        name: impl Into<String>,
        validator: Arc<dyn TransitionValidator>,
    ) -> EngineResult<()> {
        let machine = self.require(workflow_id).await?;
        machine.register_validator(name, validator).await;
        Ok(())
    }

    /// Fail if any transition names a validator that was never registered.
    pub async fn ensure_validators_registered(&self) -> EngineResult<()> {
        let mut missing = Vec::new();
        for (id, machine) in self.sorted_machines().await {
            for validator in machine.unregistered_validators().await {
                missing.push((id.clone(), validator));
            }
        }

        if missing.is_empty() {
            Ok(())
        } else {
            Err(EngineError::MissingValidators { missing })
        }
    }

    /// Apply a transition to an entity whose current state the caller owns.
    ///
    /// The caller persists `outcome.to` once this returns.
    pub async fn transition(
        &self,
        ctx: &TransitionContext,
        workflow_id: &str,
        current_state: &str,
        name: &str,
        entity: &Entity,
    ) -> EngineResult<TransitionOutcome> {
        let machine = self.require(workflow_id).await?;
        machine.apply(ctx, current_state, name, entity).await
    }

    async fn require(&self, workflow_id: &str) -> EngineResult<Arc<StateMachine>> {
        self.get_state_machine(workflow_id)
            .await
            .ok_or_else(|| EngineError::UnknownWorkflow(workflow_id.to_string()))
    }

    async fn sorted_machines(&self) -> Vec<(String, Arc<StateMachine>)> {
        let mut machines: Vec<_> = self
            .machines
            .read()
            .await
            .iter()
            .map(|(id, m)| (id.clone(), m.clone()))
            .collect();
        machines.sort_by(|a, b| a.0.cmp(&b.0));
        machines
    }

    fn check(&self, definition: &WorkflowDefinition, origin: &str) -> Result<(), DefinitionError> {
        if !self.config.validate_on_load {
            return Ok(());
        }

        let result = DefinitionValidator::ensure_valid(definition, origin)?;
        for warning in &result.warnings {
            warn!("{} ({}): {}", definition.id, origin, warning);
        }
        Ok(())
    }

    async fn insert_one(&self, origin: String, definition: WorkflowDefinition) -> EngineResult<Arc<StateMachine>> {
        let id = definition.id.clone();
        self.insert_all(vec![(origin, definition)]).await?;
        self.require(&id).await
    }

    async fn insert_all(&self, batch: Vec<(String, WorkflowDefinition)>) -> EngineResult<()> {
        let mut machines = self.machines.write().await;

        if self.config.duplicate_ids == DuplicatePolicy::Reject {
            let mut seen = HashSet::new();
            for (origin, definition) in &batch {
                if machines.contains_key(&definition.id) || !seen.insert(definition.id.as_str()) {
                    return Err(EngineError::DuplicateWorkflow {
                        workflow: definition.id.clone(),
                        origin: origin.clone(),
                    });
                }
            }
        }

        for (origin, definition) in batch {
            let id = definition.id.clone();
            // A replacement shares the validator registry of the machine it replaces.
            let validators = match machines.get(&id) {
                Some(previous) => {
                    warn!("Workflow {} from {} replaces an earlier definition", id, origin);
                    previous.shared_validators()
                }
                None => Default::default(),
            };

            let machine = StateMachine::with_registry(definition, self.config.missing_validator, validators);
            debug!("Loaded workflow {} from {}", id, origin);
            machines.insert(id, Arc::new(machine));
        }

        Ok(())
    }
}
