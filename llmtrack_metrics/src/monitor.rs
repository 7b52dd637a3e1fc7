use std::collections::VecDeque;
use std::sync::Arc;

use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry};
use tokio::sync::RwLock;
use tracing::debug;

use crate::event::{MetricEvent, MAX_HISTORY};
use crate::exporters::PrometheusExporter;
use crate::summary::{summarize, MetricsSummary};

/// Rolling operational telemetry for generation calls.
///
/// Per-model counters and histograms live in an owned Prometheus registry
/// for pull-based export; a bounded event history backs the rolling summary.
/// Clones share the same state.
#[derive(Clone)]
pub struct ModelMonitor {
    registry: Arc<Registry>,
    requests_total: IntCounterVec,
    errors_total: IntCounterVec,
    request_latency: HistogramVec,
    input_length: HistogramVec,
    output_length: HistogramVec,
    history: Arc<RwLock<VecDeque<MetricEvent>>>,
}

impl ModelMonitor {
    /// Create a monitor with all metric families registered. The only
    /// failure mode is a duplicate registration.
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let requests_total = IntCounterVec::new(
            Opts::new("model_requests_total", "Total number of model requests"),
            &["model"],
        )?;

        let errors_total = IntCounterVec::new(
            Opts::new("model_errors_total", "Total number of model errors"),
            &["model"],
        )?;

        let request_latency = HistogramVec::new(
            HistogramOpts::new("model_request_latency_seconds", "Model request latency")
                .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
            &["model"],
        )?;

        let input_length = HistogramVec::new(
            HistogramOpts::new("model_input_length", "Input text length in characters")
                .buckets(prometheus::exponential_buckets(16.0, 4.0, 8)?),
            &["model"],
        )?;

        let output_length = HistogramVec::new(
            HistogramOpts::new("model_output_length", "Output text length in characters")
                .buckets(prometheus::exponential_buckets(16.0, 4.0, 8)?),
            &["model"],
        )?;

        registry.register(Box::new(requests_total.clone()))?;
        registry.register(Box::new(errors_total.clone()))?;
        registry.register(Box::new(request_latency.clone()))?;
        registry.register(Box::new(input_length.clone()))?;
        registry.register(Box::new(output_length.clone()))?;

        Ok(Self {
            registry: Arc::new(registry),
            requests_total,
            errors_total,
            request_latency,
            input_length,
            output_length,
            history: Arc::new(RwLock::new(VecDeque::new())),
        })
    }

    /// Record one successful generation call. Latency must be a finite,
    /// non-negative number of seconds; anything else is rejected before any
    /// state changes, since a single bad observation corrupts histogram
    /// percentiles.
    pub async fn record_request(
        &self,
        model: &str,
        latency: f64,
        input_length: usize,
        output_length: usize,
    ) -> Result<(), prometheus::Error> {
        if !latency.is_finite() || latency < 0.0 {
            return Err(prometheus::Error::Msg(format!(
                "latency must be a finite non-negative number of seconds, got {latency}"
            )));
        }

        self.requests_total
            .get_metric_with_label_values(&[model])?
            .inc();
        self.request_latency
            .get_metric_with_label_values(&[model])?
            .observe(latency);
        self.input_length
            .get_metric_with_label_values(&[model])?
            .observe(input_length as f64);
        self.output_length
            .get_metric_with_label_values(&[model])?
            .observe(output_length as f64);

        self.push(MetricEvent::request(model, latency, input_length, output_length))
            .await;
        Ok(())
    }

    /// Record one failed generation call.
    pub async fn record_error(&self, model: &str) -> Result<(), prometheus::Error> {
        self.errors_total
            .get_metric_with_label_values(&[model])?
            .inc();

        self.push(MetricEvent::error(model)).await;
        Ok(())
    }

    async fn push(&self, event: MetricEvent) {
        let mut history = self.history.write().await;
        history.push_back(event);
        while history.len() > MAX_HISTORY {
            history.pop_front();
            debug!("event history cap reached, oldest event evicted");
        }
    }

    /// Point-in-time statistics over the bounded history. `None` until the
    /// first event arrives. Pure read; never mutates.
    pub async fn summary(&self) -> Option<MetricsSummary> {
        let events = self.history().await;
        summarize(&events)
    }

    /// Snapshot of the bounded event history, oldest first.
    pub async fn history(&self) -> Vec<MetricEvent> {
        self.history.read().await.iter().cloned().collect()
    }

    pub async fn history_len(&self) -> usize {
        self.history.read().await.len()
    }

    /// Counter and histogram state in the Prometheus text exposition format.
    pub fn export_prometheus(&self) -> Result<String, prometheus::Error> {
        PrometheusExporter::format(&self.registry)
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}
