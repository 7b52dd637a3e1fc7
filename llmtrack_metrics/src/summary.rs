use serde::{Deserialize, Serialize};

use crate::event::MetricEvent;

/// Point-in-time statistics derived from the bounded event history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSummary {
    pub total_requests: usize,
    pub successful_requests: usize,
    pub failed_requests: usize,
    pub average_latency: f64,
    pub last_event: MetricEvent,
}

/// Summarize a slice of events, oldest first. Returns `None` for an empty
/// slice so callers can distinguish "no data yet" from an all-zero window.
pub fn summarize(events: &[MetricEvent]) -> Option<MetricsSummary> {
    let last_event = events.last()?.clone();

    let successful_requests = events.iter().filter(|e| e.success).count();
    let latencies: Vec<f64> = events.iter().filter_map(|e| e.latency).collect();
    let average_latency = if latencies.is_empty() {
        0.0
    } else {
        latencies.iter().sum::<f64>() / latencies.len() as f64
    };

    Some(MetricsSummary {
        total_requests: events.len(),
        successful_requests,
        failed_requests: events.len() - successful_requests,
        average_latency,
        last_event,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summarize_mixed_outcomes() {
        let events = vec![
            MetricEvent::request("llama3.2", 0.1, 10, 50),
            MetricEvent::request("llama3.2", 0.3, 20, 60),
            MetricEvent::error("mistral"),
        ];

        let summary = summarize(&events).unwrap();

        assert_eq!(summary.total_requests, 3);
        assert_eq!(summary.successful_requests, 2);
        assert_eq!(summary.failed_requests, 1);
        assert!((summary.average_latency - 0.2).abs() < 1e-9);
        assert_eq!(summary.last_event.model, "mistral");
        assert!(!summary.last_event.success);
    }

    #[test]
    fn test_summarize_empty_is_none() {
        assert!(summarize(&[]).is_none());
    }

    #[test]
    fn test_summarize_failures_only_has_zero_average() {
        let events = vec![MetricEvent::error("llama3.2"), MetricEvent::error("llama3.2")];

        let summary = summarize(&events).unwrap();

        assert_eq!(summary.successful_requests, 0);
        assert_eq!(summary.failed_requests, 2);
        assert_eq!(summary.average_latency, 0.0);
    }
}
