use anyhow::Result;
use colored::Colorize;
use llmtrack_core::ExperimentStore;
use std::path::PathBuf;
use tabled::{settings::Style, Table, Tabled};

#[derive(Tabled)]
struct ExperimentRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Model")]
    model: String,
    #[tabled(rename = "Status")]
    status: &'static str,
    #[tabled(rename = "Created")]
    created: String,
    #[tabled(rename = "Metrics")]
    metrics: usize,
}

pub fn execute(snapshot: PathBuf) -> Result<()> {
    let store = ExperimentStore::open(&snapshot)?;

    if store.is_empty() {
        println!("{}", "No experiments recorded.".yellow());
        return Ok(());
    }

    let rows: Vec<ExperimentRow> = store
        .list_all()
        .into_iter()
        .map(|experiment| ExperimentRow {
            id: experiment.id.clone(),
            model: experiment.model_name.clone(),
            status: experiment.status.as_str(),
            created: experiment.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            metrics: experiment.metrics.len(),
        })
        .collect();

    println!("{}", "=== Experiments ===".bold().cyan());
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{}", table);
    println!("{} experiment(s)", store.len());

    Ok(())
}
