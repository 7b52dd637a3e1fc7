use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExperimentStatus {
    Running,
    Completed,
    Failed,
}

impl ExperimentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExperimentStatus::Running => "running",
            ExperimentStatus::Completed => "completed",
            ExperimentStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for ExperimentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One recorded attempt to invoke a generation model: the configuration it
/// ran with, the metrics reported for it, and its lifecycle state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Experiment {
    pub id: String,
    pub model_name: String,
    pub parameters: HashMap<String, serde_json::Value>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    pub metrics: HashMap<String, serde_json::Value>,
    pub status: ExperimentStatus,
}

impl Experiment {
    pub fn new(
        id: impl Into<String>,
        model_name: impl Into<String>,
        parameters: HashMap<String, serde_json::Value>,
    ) -> Self {
        Self {
            id: id.into(),
            model_name: model_name.into(),
            parameters,
            created_at: Utc::now(),
            updated_at: None,
            metrics: HashMap::new(),
            status: ExperimentStatus::Running,
        }
    }

    /// Merge a batch of metric values, overwriting keys of the same name.
    /// A boolean `success` value moves the experiment out of `Running`;
    /// the latest such value wins.
    pub fn record_metrics(&mut self, metrics: HashMap<String, serde_json::Value>) {
        if let Some(success) = metrics.get("success").and_then(|v| v.as_bool()) {
            self.status = if success {
                ExperimentStatus::Completed
            } else {
                ExperimentStatus::Failed
            };
        }
        self.metrics.extend(metrics);
        self.updated_at = Some(Utc::now());
    }

    /// Numeric value of a named metric. Non-numeric values read as absent.
    pub fn metric_value(&self, name: &str) -> Option<f64> {
        self.metrics.get(name).and_then(|v| v.as_f64())
    }

    pub fn is_completed(&self) -> bool {
        self.status == ExperimentStatus::Completed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn metrics(pairs: &[(&str, serde_json::Value)]) -> HashMap<String, serde_json::Value> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_new_experiment_is_running() {
        let experiment = Experiment::new("exp-1", "llama3.2", HashMap::new());
        assert_eq!(experiment.status, ExperimentStatus::Running);
        assert!(experiment.metrics.is_empty());
        assert!(experiment.updated_at.is_none());
    }

    #[test]
    fn test_success_flag_sets_status() {
        let mut experiment = Experiment::new("exp-1", "llama3.2", HashMap::new());

        experiment.record_metrics(metrics(&[("latency", json!(0.8)), ("success", json!(true))]));
        assert_eq!(experiment.status, ExperimentStatus::Completed);
        assert!(experiment.updated_at.is_some());

        let mut experiment = Experiment::new("exp-2", "llama3.2", HashMap::new());
        experiment.record_metrics(metrics(&[("success", json!(false))]));
        assert_eq!(experiment.status, ExperimentStatus::Failed);
    }

    #[test]
    fn test_metrics_merge_overwrites_same_keys() {
        let mut experiment = Experiment::new("exp-1", "llama3.2", HashMap::new());

        experiment.record_metrics(metrics(&[("latency", json!(2.0)), ("input_tokens", json!(5))]));
        experiment.record_metrics(metrics(&[("latency", json!(1.5))]));

        assert_eq!(experiment.metric_value("latency"), Some(1.5));
        assert_eq!(experiment.metric_value("input_tokens"), Some(5.0));
        assert_eq!(experiment.metrics.len(), 2);
    }

    #[test]
    fn test_update_without_success_keeps_status() {
        let mut experiment = Experiment::new("exp-1", "llama3.2", HashMap::new());
        experiment.record_metrics(metrics(&[("success", json!(true))]));

        experiment.record_metrics(metrics(&[("latency", json!(0.3))]));
        assert_eq!(experiment.status, ExperimentStatus::Completed);
    }

    #[test]
    fn test_metric_value_ignores_non_numeric() {
        let mut experiment = Experiment::new("exp-1", "llama3.2", HashMap::new());
        experiment.record_metrics(metrics(&[("error", json!("timeout"))]));
        assert_eq!(experiment.metric_value("error"), None);
        assert_eq!(experiment.metric_value("missing"), None);
    }

    #[test]
    fn test_status_serializes_lowercase() {
        let experiment = Experiment::new("exp-1", "llama3.2", HashMap::new());
        let json = serde_json::to_value(&experiment).unwrap();
        assert_eq!(json["status"], "running");
        assert!(json.get("updated_at").is_none());
    }
}
