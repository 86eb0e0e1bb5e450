//! erpflow CLI - Main entry point.
//!
//! Exit codes:
//! - 0: Success
//! - 1: General error
//! - 2: Invalid arguments or missing input
//! - 3: Workflow validation failure
//! - 4: Transition rejected

use std::process::ExitCode;

use clap::Parser;
use erpflow_core::EngineError;
use erpflow_spec::DefinitionError;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;

use commands::{Cli, Commands};

/// CI-friendly exit codes
pub struct ExitCodes;

impl ExitCodes {
    pub const SUCCESS: u8 = 0;
    pub const GENERAL_ERROR: u8 = 1;
    pub const INVALID_ARGS: u8 = 2;
    pub const VALIDATION_FAILURE: u8 = 3;
    pub const TRANSITION_REJECTED: u8 = 4;
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "erpflow=debug,warn"
    } else if cli.quiet {
        "error"
    } else {
        "erpflow=info,warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    // A subscriber may already be installed when embedded; keep going either way.
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .try_init();

    let result = match commands::engine_config(cli.config.as_deref()) {
        Ok(config) => match cli.command {
            Commands::Check(args) => commands::check::execute(args, &config).await,
            Commands::List(args) => commands::list::execute(args, &config).await,
            Commands::Simulate(args) => commands::simulate::execute(args, &config).await,
        },
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => ExitCode::from(ExitCodes::SUCCESS),
        Err(e) => {
            let exit_code = categorize_error(&e);
            eprintln!("❌ Error: {:#}", e);
            ExitCode::from(exit_code)
        }
    }
}

/// Categorize error to determine exit code
///
/// Typed engine and definition errors in the chain decide first; the top-level
/// message is only consulted for errors the commands raise themselves.
fn categorize_error(e: &anyhow::Error) -> u8 {
    for cause in e.chain() {
        if let Some(engine) = cause.downcast_ref::<EngineError>() {
            return categorize_engine_error(engine);
        }
        if let Some(definition) = cause.downcast_ref::<DefinitionError>() {
            return categorize_definition_error(definition);
        }
    }

    let msg = e.to_string().to_lowercase();
    if msg.starts_with("transition rejected") {
        ExitCodes::TRANSITION_REJECTED
    } else if msg.starts_with("workflow validation failed") {
        ExitCodes::VALIDATION_FAILURE
    } else {
        ExitCodes::GENERAL_ERROR
    }
}

fn categorize_engine_error(e: &EngineError) -> u8 {
    match e {
        EngineError::UnknownTransition { .. }
        | EngineError::IllegalTransition { .. }
        | EngineError::UnknownState { .. }
        | EngineError::ValidatorNotRegistered { .. }
        | EngineError::ValidationFailed { .. } => ExitCodes::TRANSITION_REJECTED,
        EngineError::UnknownWorkflow(_) | EngineError::Config(_) => ExitCodes::INVALID_ARGS,
        EngineError::DuplicateWorkflow { .. } | EngineError::MissingValidators { .. } => {
            ExitCodes::VALIDATION_FAILURE
        }
        EngineError::Definition(definition) => categorize_definition_error(definition),
        EngineError::Io(_) => ExitCodes::GENERAL_ERROR,
    }
}

fn categorize_definition_error(e: &DefinitionError) -> u8 {
    match e.root() {
        DefinitionError::Read { source, .. } if source.kind() == std::io::ErrorKind::NotFound => {
            ExitCodes::INVALID_ARGS
        }
        DefinitionError::Read { .. } => ExitCodes::GENERAL_ERROR,
        _ => ExitCodes::VALIDATION_FAILURE,
    }
}
