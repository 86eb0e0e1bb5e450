//! Error types for the engine.

use thiserror::Error;

/// Result type alias for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors that can occur while loading workflows or applying transitions.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Workflow not found: {0}")]
    UnknownWorkflow(String),

    #[error("Unknown transition '{transition}' in workflow '{workflow}'")]
    UnknownTransition { workflow: String, transition: String },

    #[error("Transition '{transition}' is not allowed from state '{from}' in workflow '{workflow}'")]
    IllegalTransition {
        workflow: String,
        from: String,
        transition: String,
    },

    #[error("State '{state}' is not declared by workflow '{workflow}'")]
    UnknownState { workflow: String, state: String },

    #[error("Validator '{validator}' required by transition '{transition}' in workflow '{workflow}' is not registered")]
    ValidatorNotRegistered {
        workflow: String,
        transition: String,
        validator: String,
    },

    #[error("Validator '{validator}' rejected transition '{transition}' in workflow '{workflow}': {source}")]
    ValidationFailed {
        workflow: String,
        transition: String,
        validator: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Workflow '{workflow}' from {origin} is already loaded")]
    DuplicateWorkflow { workflow: String, origin: String },

    #[error("Validators not registered: {}", .missing.iter().map(|(w, v)| format!("{w}/{v}")).collect::<Vec<_>>().join(", "))]
    MissingValidators { missing: Vec<(String, String)> },

    #[error("Definition error: {0}")]
    Definition(#[from] erpflow_spec::DefinitionError),

    #[error("Invalid engine configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl EngineError {
    /// Whether the caller can recover by choosing a different action or fixing the entity.
    ///
    /// Load and configuration failures are not recoverable per call.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::UnknownTransition { .. }
                | Self::IllegalTransition { .. }
                | Self::UnknownState { .. }
                | Self::ValidationFailed { .. }
        )
    }
}
