use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{Result, TrackError};
use crate::experiment::{Experiment, ExperimentStatus};

/// Durable record keeper for generation experiments.
///
/// The full id-to-record map is rewritten to a JSON snapshot file on every
/// mutating call, so a restarted process resumes exactly where the last
/// write left off. Reads never touch the disk. Durability is best-effort
/// relative to the in-memory view: a failed write surfaces as an error while
/// the in-memory mutation stays applied.
pub struct ExperimentStore {
    path: PathBuf,
    experiments: HashMap<String, Experiment>,
    order: Vec<String>,
}

impl ExperimentStore {
    /// Open a store backed by the given snapshot path. A missing file yields
    /// an empty store; an unreadable or unparsable one is fatal.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let experiments: HashMap<String, Experiment> = if path.exists() {
            let contents = fs::read_to_string(&path)?;
            serde_json::from_str(&contents).map_err(|e| {
                TrackError::CorruptSnapshot(format!("{}: {}", path.display(), e))
            })?
        } else {
            HashMap::new()
        };

        // Creation order is only recoverable while the process lives; after
        // a reload it follows the snapshot map's iteration order.
        let order: Vec<String> = experiments.keys().cloned().collect();

        debug!(experiments = order.len(), "experiment store opened");

        Ok(Self {
            path,
            experiments,
            order,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.experiments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.experiments.is_empty()
    }

    /// Create a new experiment in the `running` state and persist the
    /// snapshot before returning its identifier.
    pub fn create(
        &mut self,
        model_name: impl Into<String>,
        parameters: HashMap<String, serde_json::Value>,
    ) -> Result<String> {
        let id = Uuid::new_v4().to_string();
        let experiment = Experiment::new(id.clone(), model_name, parameters);

        self.experiments.insert(id.clone(), experiment);
        self.order.push(id.clone());
        self.save()?;

        info!(%id, "experiment created");
        Ok(id)
    }

    /// Merge metric values into an experiment and persist the snapshot.
    /// Unknown identifiers are silently ignored.
    pub fn log_metrics(
        &mut self,
        id: &str,
        metrics: HashMap<String, serde_json::Value>,
    ) -> Result<()> {
        let Some(experiment) = self.experiments.get_mut(id) else {
            debug!(%id, "metrics for unknown experiment ignored");
            return Ok(());
        };

        experiment.record_metrics(metrics);
        self.save()
    }

    pub fn get(&self, id: &str) -> Option<&Experiment> {
        self.experiments.get(id)
    }

    /// Every stored experiment, in creation order for the lifetime of this
    /// instance.
    pub fn list_all(&self) -> Vec<&Experiment> {
        self.order
            .iter()
            .filter_map(|id| self.experiments.get(id))
            .collect()
    }

    /// The completed experiment with the smallest (or largest) value for the
    /// named metric. Records without a numeric value for that metric do not
    /// participate; ties keep the earliest candidate.
    pub fn best(&self, metric: &str, minimize: bool) -> Option<&Experiment> {
        let mut winner: Option<(&Experiment, f64)> = None;

        for experiment in self.list_all() {
            if experiment.status != ExperimentStatus::Completed {
                continue;
            }
            let Some(value) = experiment.metric_value(metric) else {
                continue;
            };
            winner = match winner {
                None => Some((experiment, value)),
                Some((_, best)) if (minimize && value < best) || (!minimize && value > best) => {
                    Some((experiment, value))
                }
                keep => keep,
            };
        }

        winner.map(|(experiment, _)| experiment)
    }

    fn save(&self) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.experiments)?;
        fs::write(&self.path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashSet;
    use tempfile::TempDir;

    fn open_store(dir: &TempDir) -> ExperimentStore {
        ExperimentStore::open(dir.path().join("experiments.json")).unwrap()
    }

    fn params() -> HashMap<String, serde_json::Value> {
        HashMap::from([
            ("temperature".to_string(), json!(0.7)),
            ("max_tokens".to_string(), json!(100)),
        ])
    }

    fn metrics(pairs: &[(&str, serde_json::Value)]) -> HashMap<String, serde_json::Value> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn complete_with_latency(store: &mut ExperimentStore, latency: f64) -> String {
        let id = store.create("llama3.2", params()).unwrap();
        store
            .log_metrics(
                &id,
                metrics(&[("latency", json!(latency)), ("success", json!(true))]),
            )
            .unwrap();
        id
    }

    #[test]
    fn test_create_returns_distinct_ids() {
        let dir = TempDir::new().unwrap();
        let mut store = open_store(&dir);

        let ids: HashSet<String> = (0..50)
            .map(|_| store.create("llama3.2", params()).unwrap())
            .collect();

        assert_eq!(ids.len(), 50);
        assert_eq!(store.len(), 50);
    }

    #[test]
    fn test_log_metrics_unknown_id_is_noop() {
        let dir = TempDir::new().unwrap();
        let mut store = open_store(&dir);
        let id = store.create("llama3.2", params()).unwrap();

        store
            .log_metrics("no-such-id", metrics(&[("latency", json!(1.0))]))
            .unwrap();

        assert_eq!(store.len(), 1);
        assert!(store.get(&id).unwrap().metrics.is_empty());
        assert!(store.get("no-such-id").is_none());
    }

    #[test]
    fn test_success_flag_finalizes_status() {
        let dir = TempDir::new().unwrap();
        let mut store = open_store(&dir);

        let completed = store.create("llama3.2", params()).unwrap();
        store
            .log_metrics(&completed, metrics(&[("success", json!(true))]))
            .unwrap();
        assert_eq!(
            store.get(&completed).unwrap().status,
            ExperimentStatus::Completed
        );

        let failed = store.create("llama3.2", params()).unwrap();
        store
            .log_metrics(&failed, metrics(&[("success", json!(false))]))
            .unwrap();
        assert_eq!(store.get(&failed).unwrap().status, ExperimentStatus::Failed);
    }

    #[test]
    fn test_success_flag_is_last_write_wins() {
        let dir = TempDir::new().unwrap();
        let mut store = open_store(&dir);
        let id = store.create("llama3.2", params()).unwrap();

        store
            .log_metrics(&id, metrics(&[("success", json!(true))]))
            .unwrap();
        store
            .log_metrics(&id, metrics(&[("success", json!(false))]))
            .unwrap();

        assert_eq!(store.get(&id).unwrap().status, ExperimentStatus::Failed);
    }

    #[test]
    fn test_best_selects_by_metric() {
        let dir = TempDir::new().unwrap();
        let mut store = open_store(&dir);

        complete_with_latency(&mut store, 2.0);
        let b = complete_with_latency(&mut store, 1.0);
        let c = complete_with_latency(&mut store, 3.0);

        assert_eq!(store.best("latency", true).unwrap().id, b);
        assert_eq!(store.best("latency", false).unwrap().id, c);
        assert!(store.best("accuracy", true).is_none());
    }

    #[test]
    fn test_best_ignores_unfinished_and_failed() {
        let dir = TempDir::new().unwrap();
        let mut store = open_store(&dir);

        let running = store.create("llama3.2", params()).unwrap();
        store
            .log_metrics(&running, metrics(&[("latency", json!(0.1))]))
            .unwrap();

        let failed = store.create("llama3.2", params()).unwrap();
        store
            .log_metrics(
                &failed,
                metrics(&[("latency", json!(0.2)), ("success", json!(false))]),
            )
            .unwrap();

        assert!(store.best("latency", true).is_none());
    }

    #[test]
    fn test_best_skips_non_numeric_values() {
        let dir = TempDir::new().unwrap();
        let mut store = open_store(&dir);

        let odd = store.create("llama3.2", params()).unwrap();
        store
            .log_metrics(
                &odd,
                metrics(&[("latency", json!("fast")), ("success", json!(true))]),
            )
            .unwrap();
        let numeric = complete_with_latency(&mut store, 5.0);

        assert_eq!(store.best("latency", true).unwrap().id, numeric);
    }

    #[test]
    fn test_list_all_preserves_creation_order() {
        let dir = TempDir::new().unwrap();
        let mut store = open_store(&dir);

        let first = store.create("llama3.2", params()).unwrap();
        let second = store.create("mistral", params()).unwrap();

        let listed: Vec<&str> = store.list_all().iter().map(|e| e.id.as_str()).collect();
        assert_eq!(listed, vec![first.as_str(), second.as_str()]);
    }

    #[test]
    fn test_snapshot_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("experiments.json");

        let (first, second) = {
            let mut store = ExperimentStore::open(&path).unwrap();
            let first = store.create("llama3.2", params()).unwrap();
            store
                .log_metrics(
                    &first,
                    metrics(&[("latency", json!(0.42)), ("success", json!(true))]),
                )
                .unwrap();
            let second = store.create("mistral", params()).unwrap();
            (first, second)
        };

        let reloaded = ExperimentStore::open(&path).unwrap();
        assert_eq!(reloaded.len(), 2);

        let restored = reloaded.get(&first).unwrap();
        assert_eq!(restored.model_name, "llama3.2");
        assert_eq!(restored.status, ExperimentStatus::Completed);
        assert_eq!(restored.metric_value("latency"), Some(0.42));
        assert_eq!(restored.parameters["temperature"], json!(0.7));

        assert_eq!(
            reloaded.get(&second).unwrap().status,
            ExperimentStatus::Running
        );
    }

    #[test]
    fn test_missing_snapshot_yields_empty_store() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        assert!(store.is_empty());
        assert!(store.list_all().is_empty());
    }

    #[test]
    fn test_corrupt_snapshot_is_fatal() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("experiments.json");
        fs::write(&path, "{not json").unwrap();

        let result = ExperimentStore::open(&path);
        assert!(matches!(result, Err(TrackError::CorruptSnapshot(_))));
    }

    #[test]
    fn test_failed_snapshot_write_keeps_memory_mutation() {
        let dir = TempDir::new().unwrap();
        // A snapshot path under a missing directory makes every write fail.
        let mut store = ExperimentStore::open(dir.path().join("missing/experiments.json")).unwrap();

        let result = store.create("llama3.2", params());
        assert!(result.is_err());
        assert_eq!(store.len(), 1);
    }
}
