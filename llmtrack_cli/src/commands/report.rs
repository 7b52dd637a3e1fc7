use anyhow::Result;
use llmtrack_core::{Experiment, ExperimentStatus, ExperimentStore};
use std::collections::BTreeMap;
use std::path::PathBuf;

#[derive(Default)]
struct ModelStats {
    total: usize,
    completed: usize,
    failed: usize,
    latencies: Vec<f64>,
}

pub async fn execute(snapshot: PathBuf, output: Option<PathBuf>) -> Result<()> {
    let store = ExperimentStore::open(&snapshot)?;
    let markdown = format_report(&store.list_all());

    match output {
        Some(path) => {
            tokio::fs::write(&path, markdown).await?;
            println!("Report written to {}", path.display());
        }
        None => println!("{}", markdown),
    }

    Ok(())
}

fn format_report(experiments: &[&Experiment]) -> String {
    let mut by_model: BTreeMap<&str, ModelStats> = BTreeMap::new();

    for experiment in experiments {
        let stats = by_model.entry(experiment.model_name.as_str()).or_default();
        stats.total += 1;
        match experiment.status {
            ExperimentStatus::Completed => {
                stats.completed += 1;
                if let Some(latency) = experiment.metric_value("latency") {
                    stats.latencies.push(latency);
                }
            }
            ExperimentStatus::Failed => stats.failed += 1,
            ExperimentStatus::Running => {}
        }
    }

    let mut report = String::from(
        "# Experiment Report\n\n\
         | Model | Experiments | Completed | Failed | Completion Rate | Avg Latency |\n\
         |-------|-------------|-----------|--------|-----------------|-------------|\n",
    );

    for (model, stats) in &by_model {
        let rate = stats.completed as f64 / stats.total as f64 * 100.0;
        let avg_latency = if stats.latencies.is_empty() {
            "-".to_string()
        } else {
            format!(
                "{:.3}s",
                stats.latencies.iter().sum::<f64>() / stats.latencies.len() as f64
            )
        };

        report.push_str(&format!(
            "| {} | {} | {} | {} | {:.1}% | {} |\n",
            model, stats.total, stats.completed, stats.failed, rate, avg_latency
        ));
    }

    if by_model.is_empty() {
        report.push_str("\nNo experiments recorded.\n");
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    fn experiment(model: &str, success: Option<(bool, f64)>) -> Experiment {
        let mut experiment = Experiment::new(model.to_string(), model, HashMap::new());
        if let Some((success, latency)) = success {
            experiment.record_metrics(HashMap::from([
                ("success".to_string(), json!(success)),
                ("latency".to_string(), json!(latency)),
            ]));
        }
        experiment
    }

    #[test]
    fn test_report_groups_by_model() {
        let a = experiment("llama3.2", Some((true, 0.5)));
        let b = experiment("llama3.2", Some((true, 1.5)));
        let c = experiment("mistral", Some((false, 0.0)));
        let d = experiment("mistral", None);

        let report = format_report(&[&a, &b, &c, &d]);

        assert!(report.contains("| llama3.2 | 2 | 2 | 0 | 100.0% | 1.000s |"));
        assert!(report.contains("| mistral | 2 | 0 | 1 | 0.0% | - |"));
    }

    #[test]
    fn test_report_with_no_experiments() {
        let report = format_report(&[]);
        assert!(report.contains("No experiments recorded."));
    }
}
