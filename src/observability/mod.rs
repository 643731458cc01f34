pub mod metrics;
pub mod tracing;

use std::sync::Arc;

use anyhow::Result;
use prometheus::{Encoder, Registry, TextEncoder};

use self::metrics::Metrics;

/// Metrics plus the registry they are exported from.
#[derive(Debug, Clone)]
pub struct Telemetry {
    registry: Arc<Registry>,
    metrics: Arc<Metrics>,
}

impl Telemetry {
    /// Initializes tracing and registers the metrics.
    ///
    /// # Errors
    /// Fails when tracing or metric registration fails.
    pub fn new() -> Result<Self> {
        tracing::init()?;
        Self::without_tracing()
    }

    /// Registers metrics without touching the global subscriber.
    ///
    /// # Errors
    /// Fails when metric registration fails.
    pub fn without_tracing() -> Result<Self> {
        let registry = Arc::new(Registry::new());
        let metrics = Arc::new(Metrics::new(Arc::clone(&registry))?);
        Ok(Self { registry, metrics })
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub fn metrics_arc(&self) -> Arc<Metrics> {
        Arc::clone(&self.metrics)
    }

    pub fn record_ready_probe(&self) {
        ::tracing::debug!("service ready probe recorded");
    }

    pub fn record_live_probe(&self) {
        ::tracing::debug!("service live probe");
    }

    /// Renders this registry in the Prometheus text format.
    pub fn render_prometheus(&self) -> String {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer).ok();
        String::from_utf8(buffer).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rendered_output_contains_registered_counters() {
        let telemetry = Telemetry::without_tracing().expect("telemetry builds");
        telemetry.metrics().llm_calls.inc();

        let rendered = telemetry.render_prometheus();

        assert!(rendered.contains("logeasy_llm_calls_total 1"));
        assert!(rendered.contains("logeasy_analysis_duration_seconds"));
    }
}
