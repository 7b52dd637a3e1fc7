use anyhow::Result;
use std::path::Path;

use crate::summary::MetricsSummary;

pub struct JsonExporter;

impl JsonExporter {
    pub async fn export(summary: &MetricsSummary, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(summary)?;
        tokio::fs::write(path, json).await?;
        Ok(())
    }

    pub fn to_string(summary: &MetricsSummary) -> Result<String> {
        Ok(serde_json::to_string_pretty(summary)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::MetricEvent;
    use crate::summary::summarize;

    #[test]
    fn test_to_string_round_trips() {
        let events = vec![MetricEvent::request("llama3.2", 0.5, 3, 9)];
        let summary = summarize(&events).unwrap();

        let json = JsonExporter::to_string(&summary).unwrap();
        let parsed: MetricsSummary = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.total_requests, 1);
        assert_eq!(parsed.last_event.model, "llama3.2");
    }
}
