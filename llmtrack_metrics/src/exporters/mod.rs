pub mod json;
pub mod prometheus;

pub use self::json::JsonExporter;
pub use self::prometheus::PrometheusExporter;
