use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Upper bound on the in-memory event history. Oldest events are evicted
/// first once the cap is exceeded; this is a memory cap, not a window with
/// statistical meaning.
pub const MAX_HISTORY: usize = 1000;

/// One observed call outcome. Failure events carry no latency or lengths.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricEvent {
    pub timestamp: DateTime<Utc>,
    pub model: String,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latency: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_length: Option<usize>,
}

impl MetricEvent {
    pub fn request(
        model: impl Into<String>,
        latency: f64,
        input_length: usize,
        output_length: usize,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            model: model.into(),
            success: true,
            latency: Some(latency),
            input_length: Some(input_length),
            output_length: Some(output_length),
        }
    }

    pub fn error(model: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            model: model.into(),
            success: false,
            latency: None,
            input_length: None,
            output_length: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_event_serializes_without_optional_fields() {
        let event = MetricEvent::error("llama3.2");
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["model"], "llama3.2");
        assert_eq!(json["success"], false);
        assert!(json.get("latency").is_none());
        assert!(json.get("input_length").is_none());
    }

    #[test]
    fn test_request_event_carries_measurements() {
        let event = MetricEvent::request("llama3.2", 0.25, 12, 80);
        assert!(event.success);
        assert_eq!(event.latency, Some(0.25));
        assert_eq!(event.input_length, Some(12));
        assert_eq!(event.output_length, Some(80));
    }
}
