//! Check command - Parse and validate workflow documents.

use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use erpflow_core::{DuplicatePolicy, EngineConfig};
use erpflow_spec::{DefinitionReader, DefinitionValidator};

#[derive(Args)]
pub struct CheckArgs {
    /// Directory of workflow documents
    pub dir: PathBuf,

    /// Treat warnings as errors
    #[arg(long)]
    pub deny_warnings: bool,
}

pub async fn execute(args: CheckArgs, config: &EngineConfig) -> Result<()> {
    info!("Checking workflows in {:?}", args.dir);

    super::ensure_directory(&args.dir)?;

    let definitions = DefinitionReader::read_dir(&args.dir, &config.extensions)
        .with_context(|| format!("Failed to read workflows from {}", args.dir.display()))?;

    if definitions.is_empty() {
        println!("⚠️  No workflow documents found");
        return Ok(());
    }

    let mut failed = 0;
    let mut seen: HashMap<&str, &PathBuf> = HashMap::new();

    for (path, definition) in &definitions {
        let file = path.file_name().unwrap_or_default().to_string_lossy();
        let result = DefinitionValidator::validate(definition);
        let rejected = !result.valid || (args.deny_warnings && !result.warnings.is_empty());

        if rejected {
            failed += 1;
            println!("❌ {} ({})", definition.id, file);
        } else {
            println!("✅ {} ({})", definition.id, file);
        }

        for error in &result.errors {
            println!("   - {}", error);
        }
        for warning in &result.warnings {
            println!("   ⚠️  {}", warning);
        }

        if let Some(previous) = seen.insert(definition.id.as_str(), path) {
            let previous = previous.file_name().unwrap_or_default().to_string_lossy();
            match config.duplicate_ids {
                DuplicatePolicy::Replace => {
                    println!("   ⚠️  Replaces workflow '{}' from {}", definition.id, previous);
                }
                DuplicatePolicy::Reject => {
                    if !rejected {
                        failed += 1;
                    }
                    println!("   - Duplicates workflow '{}' from {}", definition.id, previous);
                }
            }
        }
    }

    println!();
    println!("{} workflow document(s) checked, {} failed", definitions.len(), failed);

    if failed > 0 {
        anyhow::bail!("Workflow validation failed for {} document(s)", failed);
    }

    Ok(())
}
