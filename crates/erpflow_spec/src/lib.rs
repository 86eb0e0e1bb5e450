//! # erpflow_spec
//!
//! Workflow definition documents for the erpflow state-machine engine.
//!
//! A workflow document declares the lifecycle of one business entity type:
//! its closed set of states, the state a new entity starts in, and the named
//! transitions between states. One document describes one workflow; a
//! directory of documents describes the full set an application loads.
//!
//! ## Document schema
//!
//! ```yaml
//! workflow_id: sales_order
//! model: sale.order
//! initial: draft
//! states: [draft, quotation, confirmed, cancelled]
//! transitions:
//!   - name: confirm
//!     from: [draft, quotation]
//!     to: confirmed
//!     validator: credit_check
//!     permission: sales.manager
//!   - name: cancel
//!     from: ["*"]
//!     to: cancelled
//! ```
//!
//! YAML, JSON and TOML documents are accepted; the format is picked from the
//! file extension.
//!
//! ## Example
//!
//! ```rust,no_run
//! use erpflow_spec::{DefinitionReader, DefinitionValidator};
//!
//! let definition = DefinitionReader::read_file("workflows/sales_order.yaml").unwrap();
//! let result = DefinitionValidator::validate(&definition);
//! for warning in &result.warnings {
//!     eprintln!("warning: {}", warning);
//! }
//! ```

pub mod error;
pub mod models;
pub mod reader;
pub mod validator;

pub use error::{DefinitionError, DefinitionResult};
pub use models::{TransitionDefinition, WorkflowDefinition, WILDCARD};
pub use reader::{DefinitionReader, DocumentFormat};
pub use validator::{DefinitionValidator, ValidationResult};
