//! Prometheus counters and histograms for analysis runs.
use prometheus::{
    Counter, Histogram, Registry, register_counter_with_registry,
    register_histogram_with_registry,
};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct Metrics {
    pub analyses_total: Counter,
    pub analyses_failed: Counter,
    pub analysis_cache_hits: Counter,
    pub llm_calls: Counter,
    pub llm_failures: Counter,
    pub insight_failures: Counter,
    pub reply_lines_dropped: Counter,
    pub issues_extracted: Counter,

    pub analysis_duration: Histogram,
}

impl Metrics {
    /// Registers every collector with `registry`.
    ///
    /// # Errors
    /// Fails when a metric with the same name is already registered there.
    pub fn new(registry: Arc<Registry>) -> Result<Self, prometheus::Error> {
        Ok(Self {
            analyses_total: register_counter_with_registry!(
                "logeasy_analyses_total",
                "Total number of analysis runs started",
                registry
            )?,
            analyses_failed: register_counter_with_registry!(
                "logeasy_analyses_failed_total",
                "Total number of analysis runs that returned an error",
                registry
            )?,
            analysis_cache_hits: register_counter_with_registry!(
                "logeasy_analysis_cache_hits_total",
                "Uploads answered from the current session without a new analysis",
                registry
            )?,
            llm_calls: register_counter_with_registry!(
                "logeasy_llm_calls_total",
                "Total number of text generation calls",
                registry
            )?,
            llm_failures: register_counter_with_registry!(
                "logeasy_llm_failures_total",
                "Total number of failed text generation calls",
                registry
            )?,
            insight_failures: register_counter_with_registry!(
                "logeasy_insight_failures_total",
                "Insight calls that failed and were replaced by an empty insight",
                registry
            )?,
            reply_lines_dropped: register_counter_with_registry!(
                "logeasy_reply_lines_dropped_total",
                "Model reply lines discarded as malformed",
                registry
            )?,
            issues_extracted: register_counter_with_registry!(
                "logeasy_issues_extracted_total",
                "Errors and warnings extracted from model replies",
                registry
            )?,
            analysis_duration: register_histogram_with_registry!(
                "logeasy_analysis_duration_seconds",
                "Duration of a full analysis run",
                registry
            )?,
        })
    }

    /// Collectors on a private registry, for tests and tools that never export.
    ///
    /// # Errors
    /// See [`Metrics::new`].
    pub fn detached() -> Result<Self, prometheus::Error> {
        Self::new(Arc::new(Registry::new()))
    }
}
