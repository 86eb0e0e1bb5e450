//! CLI command definitions.

use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use erpflow_core::{EngineConfig, StateMachineFactory};
use erpflow_spec::DefinitionError;

pub mod check;
pub mod list;
pub mod simulate;

/// erpflow - workflow state-machine definitions for ERP entities
#[derive(Parser)]
#[command(name = "erpflow")]
#[command(version, about = "erpflow - check and dry-run workflow definitions")]
#[command(long_about = r#"
erpflow loads a directory of workflow documents (YAML, JSON or TOML), one
workflow per document, and lets you check, inspect and dry-run them.

COMMANDS:
  check     → Parse and validate every workflow document
  list      → Show workflows with their states and transitions
  simulate  → Apply a chain of transitions without touching any data

EXIT CODES:
  0 - Success
  1 - General error
  2 - Invalid arguments or missing input
  3 - Workflow validation failure
  4 - Transition rejected
"#)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Engine configuration file (TOML or YAML)
    #[arg(short, long, global = true, env = "ERPFLOW_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Parse and validate workflow documents
    Check(check::CheckArgs),

    /// List loaded workflows
    List(list::ListArgs),

    /// Dry-run a chain of transitions
    Simulate(simulate::SimulateArgs),
}

/// Read the engine configuration, or use the defaults.
pub fn engine_config(path: Option<&Path>) -> Result<EngineConfig> {
    match path {
        Some(path) => EngineConfig::from_file(path)
            .with_context(|| format!("Failed to read engine configuration {}", path.display())),
        None => Ok(EngineConfig::default()),
    }
}

/// Load a workflow directory into a fresh factory.
pub async fn load_factory(dir: &Path, config: EngineConfig) -> Result<StateMachineFactory> {
    ensure_directory(dir)?;

    let factory = StateMachineFactory::new(config);
    factory
        .load_from_directory(dir)
        .await
        .with_context(|| format!("Failed to load workflows from {}", dir.display()))?;
    Ok(factory)
}

/// Fail with a not-found read error unless `dir` is a directory.
pub fn ensure_directory(dir: &Path) -> Result<()> {
    if dir.is_dir() {
        return Ok(());
    }
    Err(DefinitionError::Read {
        origin: dir.display().to_string(),
        source: io::Error::new(io::ErrorKind::NotFound, "workflow directory not found"),
    }
    .into())
}
