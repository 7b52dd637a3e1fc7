use prometheus::{Encoder, Registry, TextEncoder};

pub struct PrometheusExporter;

impl PrometheusExporter {
    /// Encode the registry contents in the Prometheus text exposition format.
    pub fn format(registry: &Registry) -> Result<String, prometheus::Error> {
        let metric_families = registry.gather();
        let mut buffer = Vec::new();
        let encoder = TextEncoder::new();
        encoder.encode(&metric_families, &mut buffer)?;

        String::from_utf8(buffer)
            .map_err(|e| prometheus::Error::Msg(format!("metrics are not valid UTF-8: {e}")))
    }
}
