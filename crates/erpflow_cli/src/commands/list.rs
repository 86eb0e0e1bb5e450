//! List command - Show workflows with their states and transitions.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use erpflow_core::{EngineConfig, WorkflowDefinition};

#[derive(Args)]
pub struct ListArgs {
    /// Directory of workflow documents
    pub dir: PathBuf,

    /// Print the loaded definitions as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn execute(args: ListArgs, config: &EngineConfig) -> Result<()> {
    let factory = super::load_factory(&args.dir, config.clone()).await?;

    let mut definitions: Vec<WorkflowDefinition> = factory
        .get_all_state_machines()
        .await
        .into_values()
        .map(|m| m.definition().clone())
        .collect();
    definitions.sort_by(|a, b| a.id.cmp(&b.id));

    if args.json {
        println!("{}", serde_json::to_string_pretty(&definitions)?);
        return Ok(());
    }

    for definition in &definitions {
        print!("{}", render_workflow(definition));
        println!();
    }

    Ok(())
}

/// Human-readable summary of one workflow.
fn render_workflow(definition: &WorkflowDefinition) -> String {
    let mut out = String::new();

    if definition.model.is_empty() {
        out.push_str(&format!("{}\n", definition.id));
    } else {
        out.push_str(&format!("{} ({})\n", definition.id, definition.model));
    }
    if let Some(description) = &definition.description {
        out.push_str(&format!("  {}\n", description));
    }
    out.push_str(&format!("  initial: {}\n", definition.initial_state));
    out.push_str(&format!("  states: {}\n", definition.states.join(", ")));

    if !definition.transitions.is_empty() {
        out.push_str("  transitions:\n");
    }
    for transition in &definition.transitions {
        out.push_str(&format!(
            "    {}: {} -> {}",
            transition.name,
            transition.from.join(", "),
            transition.to
        ));
        if let Some(validator) = &transition.validator {
            out.push_str(&format!(" [validator: {}]", validator));
        }
        if let Some(permission) = &transition.permission {
            out.push_str(&format!(" (permission: {})", permission));
        }
        out.push('\n');
    }

    out
}
