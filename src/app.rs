use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{Router, extract::DefaultBodyLimit};
use tokio::sync::RwLock;
use tower_http::trace::TraceLayer;

use crate::{
    analyzer::LogAnalyzer,
    api,
    clients::TextGenerator,
    config::Config,
    observability::Telemetry,
    preprocess::LogSampler,
    session::AnalysisSession,
};

#[derive(Clone)]
pub(crate) struct AppState {
    registry: Arc<ComponentRegistry>,
}

pub struct ComponentRegistry {
    config: Arc<Config>,
    telemetry: Telemetry,
    analyzer: Arc<LogAnalyzer>,
    session: RwLock<AnalysisSession>,
}

impl AppState {
    pub(crate) fn new(registry: ComponentRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
        }
    }

    pub(crate) fn telemetry(&self) -> &Telemetry {
        &self.registry.telemetry
    }

    pub(crate) fn analyzer(&self) -> &LogAnalyzer {
        &self.registry.analyzer
    }

    pub(crate) fn session(&self) -> &RwLock<AnalysisSession> {
        &self.registry.session
    }
}

impl ComponentRegistry {
    /// Initializes telemetry and the Gemini client from configuration.
    ///
    /// # Errors
    /// Fails when telemetry cannot be initialized or the Gemini endpoint is unusable.
    pub fn build(config: Config) -> Result<Self> {
        let telemetry = Telemetry::new()?;
        let analyzer = LogAnalyzer::from_config(&config, telemetry.metrics_arc())
            .context("failed to build gemini client")?;
        if !analyzer.is_configured() {
            tracing::warn!("GEMINI_API_KEY is not set, analysis requests will be rejected");
        }
        Ok(Self::assemble(config, telemetry, analyzer))
    }

    /// Wires the registry around an arbitrary text generator.
    #[must_use]
    pub fn with_generator(
        config: Config,
        telemetry: Telemetry,
        generator: Option<Arc<dyn TextGenerator>>,
    ) -> Self {
        let analyzer = LogAnalyzer::new(
            generator,
            LogSampler::new(config.sample_cap()),
            telemetry.metrics_arc(),
        );
        Self::assemble(config, telemetry, analyzer)
    }

    fn assemble(config: Config, telemetry: Telemetry, analyzer: LogAnalyzer) -> Self {
        Self {
            config: Arc::new(config),
            telemetry,
            analyzer: Arc::new(analyzer),
            session: RwLock::new(AnalysisSession::new()),
        }
    }
}

pub fn build_router(registry: ComponentRegistry) -> Router {
    let body_limit = registry.config.max_upload_bytes();
    let state = AppState::new(registry);
    api::router(state)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn registry_without_key_is_unconfigured() {
        let telemetry = Telemetry::without_tracing().expect("telemetry builds");
        let registry = ComponentRegistry::with_generator(Config::default(), telemetry, None);
        let state = AppState::new(registry);

        state.telemetry().record_ready_probe();
        assert!(!state.analyzer().is_configured());
        assert!(state.session().read().await.current().is_none());
    }
}
