//! # erpflow_core
//!
//! Configuration-driven workflow state-machine engine for erpflow.
//!
//! Business modules (sales orders, inventory moves, quality inspections)
//! describe their lifecycles as workflow documents and call this engine to
//! gate every status change. The engine decides whether a change is legal;
//! the calling repository persists the result.
//!
//! # Architecture
//!
//! - **Definitions**: immutable workflows loaded from documents (`erpflow_spec`)
//! - **Validators**: named checks that may veto a transition for a concrete entity
//! - **State machines**: one per workflow definition, owning its validator registry
//! - **Factory**: loads a directory of workflows and looks them up by id
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use erpflow_core::{typed_validator, EngineConfig, StateMachineFactory, TransitionContext};
//!
//! let factory = StateMachineFactory::new(EngineConfig::default());
//! factory.load_from_directory("config/workflows").await?;
//!
//! factory
//!     .register_validator("sales_order", "credit_check", Arc::new(typed_validator(
//!         |_ctx, order: &SalesOrder| order.check_credit(),
//!     )))
//!     .await?;
//! factory.ensure_validators_registered().await?;
//!
//! // The order's state comes from its record; persist `outcome.to` afterwards.
//! let outcome = factory
//!     .transition(&TransitionContext::new().actor("alice"), "sales_order", &order.state, "confirm", &order)
//!     .await?;
//! ```

pub mod config;
pub mod context;
pub mod error;
pub mod factory;
pub mod machine;
pub mod registry;
pub mod validator;

pub use config::{DuplicatePolicy, EngineConfig, MissingValidatorPolicy};
pub use context::TransitionContext;
pub use error::{EngineError, EngineResult};
pub use factory::StateMachineFactory;
pub use machine::{StateMachine, TransitionOutcome};
pub use registry::ValidatorRegistry;
pub use validator::{typed_validator, validator_fn, Entity, FnValidator, TransitionValidator, TypedValidator};

pub use erpflow_spec::{TransitionDefinition, WorkflowDefinition, WILDCARD};
