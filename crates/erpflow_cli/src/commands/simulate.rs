//! Simulate command - Apply a chain of transitions without touching any data.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Args;
use tracing::{debug, info};

use erpflow_core::{validator_fn, EngineConfig, EngineError, MissingValidatorPolicy, TransitionContext};

#[derive(Args)]
pub struct SimulateArgs {
    /// Directory of workflow documents
    pub dir: PathBuf,

    /// Workflow to simulate
    #[arg(short, long)]
    pub workflow: String,

    /// Starting state (defaults to the workflow's initial state)
    #[arg(long)]
    pub from: Option<String>,

    /// Fail transitions that name a validator instead of accepting them
    #[arg(long)]
    pub strict: bool,

    /// Transitions to apply, in order
    #[arg(required = true)]
    pub transitions: Vec<String>,
}

pub async fn execute(args: SimulateArgs, config: &EngineConfig) -> Result<()> {
    let mut config = config.clone();
    if args.strict {
        config.missing_validator = MissingValidatorPolicy::Reject;
    }

    let factory = super::load_factory(&args.dir, config).await?;
    let machine = factory
        .get_state_machine(&args.workflow)
        .await
        .ok_or_else(|| EngineError::UnknownWorkflow(args.workflow.clone()))?;

    if !args.strict {
        let names: Vec<String> = machine
            .definition()
            .validator_names()
            .into_iter()
            .map(str::to_string)
            .collect();
        for name in names {
            debug!("Stubbing validator {} as accepting", name);
            machine.register_validator(name, Arc::new(validator_fn(|_, _| Ok(())))).await;
        }
    }

    let mut state = args
        .from
        .clone()
        .unwrap_or_else(|| machine.definition().initial_state.clone());
    let ctx = TransitionContext::new().actor("erpflow-cli");

    info!("Simulating {} from {}", args.workflow, state);
    println!("{} @ {}", args.workflow, state);

    for name in &args.transitions {
        match machine.apply(&ctx, &state, name, &()).await {
            Ok(outcome) => {
                match &outcome.permission {
                    Some(permission) => println!(
                        "  {} --{}--> {}  (permission: {})",
                        outcome.from, name, outcome.to, permission
                    ),
                    None => println!("  {} --{}--> {}", outcome.from, name, outcome.to),
                }
                state = outcome.to;
            }
            Err(e) => {
                println!("  ❌ {}", e);
                return Err(anyhow::Error::new(e).context("Transition rejected"));
            }
        }
    }

    println!("Final state: {}", state);
    Ok(())
}
