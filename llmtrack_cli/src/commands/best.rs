use anyhow::Result;
use colored::Colorize;
use llmtrack_core::ExperimentStore;
use std::path::PathBuf;

pub fn execute(snapshot: PathBuf, metric: String, maximize: bool) -> Result<()> {
    let store = ExperimentStore::open(&snapshot)?;

    match store.best(&metric, !maximize) {
        Some(experiment) => {
            let direction = if maximize { "highest" } else { "lowest" };
            println!(
                "{}",
                format!("Best experiment ({} {})", direction, metric)
                    .bold()
                    .green()
            );
            println!("  ID: {}", experiment.id.cyan());
            println!("  Model: {}", experiment.model_name);
            if let Some(value) = experiment.metric_value(&metric) {
                println!("  {}: {}", metric, value);
            }
            println!(
                "  Parameters: {}",
                serde_json::to_string(&experiment.parameters)?
            );
        }
        None => {
            println!(
                "{}",
                format!("No completed experiment has metric '{}'", metric).yellow()
            );
        }
    }

    Ok(())
}
