//! Runs one analysis: sample, extract, parse, then ask for an insight.
use std::{sync::Arc, time::Instant};

use tracing::{debug, info, warn};

use crate::{
    clients::{GeminiClient, GenerationError, TextGenerator},
    config::{API_KEY_ENV, Config, ConfigError},
    error::AnalysisError,
    model::{AnalysisResult, LogRecord},
    observability::metrics::Metrics,
    parser::parse_issues,
    preprocess::LogSampler,
    prompts::{render_extraction_prompt, render_insight_prompt},
};

pub struct LogAnalyzer {
    generator: Option<Arc<dyn TextGenerator>>,
    sampler: LogSampler,
    metrics: Arc<Metrics>,
}

impl LogAnalyzer {
    /// `generator` is `None` when no credential is configured; every
    /// `analyze` call then fails with a configuration error.
    #[must_use]
    pub fn new(
        generator: Option<Arc<dyn TextGenerator>>,
        sampler: LogSampler,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            generator,
            sampler,
            metrics,
        }
    }

    /// Wires a Gemini client from configuration.
    ///
    /// # Errors
    /// Fails when the configured endpoint is unusable.
    pub fn from_config(config: &Config, metrics: Arc<Metrics>) -> Result<Self, GenerationError> {
        let generator = GeminiClient::from_config(config)?
            .map(|client| Arc::new(client) as Arc<dyn TextGenerator>);
        Ok(Self::new(
            generator,
            LogSampler::new(config.sample_cap()),
            metrics,
        ))
    }

    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.generator.is_some()
    }

    /// Analyzes `records` and returns the extracted issues and insight.
    ///
    /// Makes no external call when nothing is at ERROR, WARN or SECURITY
    /// level. A failed insight call leaves `insight` empty and keeps the
    /// extracted issues.
    ///
    /// # Errors
    /// [`AnalysisError::Configuration`] without a credential,
    /// [`AnalysisError::Transport`] when the extraction call fails.
    pub async fn analyze(&self, records: &[LogRecord]) -> Result<AnalysisResult, AnalysisError> {
        let started = Instant::now();
        self.metrics.analyses_total.inc();

        let outcome = self.run(records).await;

        self.metrics
            .analysis_duration
            .observe(started.elapsed().as_secs_f64());
        match &outcome {
            Ok(result) => info!(
                errors = result.errors.len(),
                warnings = result.warnings.len(),
                dropped_lines = result.dropped_lines,
                has_insight = !result.insight.is_empty(),
                elapsed_ms = started.elapsed().as_millis(),
                "analysis complete"
            ),
            Err(error) => {
                self.metrics.analyses_failed.inc();
                warn!(code = error.code(), error = %error, "analysis failed");
            }
        }
        outcome
    }

    async fn run(&self, records: &[LogRecord]) -> Result<AnalysisResult, AnalysisError> {
        let generator = self
            .generator
            .as_deref()
            .ok_or(ConfigError::Missing(API_KEY_ENV))?;

        let sample = self.sampler.prepare(records);
        if sample.is_empty() {
            info!(rows = records.len(), "no actionable log rows, skipping text generation");
            return Ok(AnalysisResult::default());
        }

        info!(
            rows = records.len(),
            filtered = sample.filtered_total,
            sampled = sample.records.len(),
            "requesting issue extraction"
        );
        let reply = self
            .call(generator, &render_extraction_prompt(&sample.serialized))
            .await?;

        let parsed = parse_issues(&reply);
        debug!(
            errors = parsed.errors.len(),
            warnings = parsed.warnings.len(),
            dropped_lines = parsed.dropped_lines,
            "extraction reply parsed"
        );
        self.metrics
            .issues_extracted
            .inc_by((parsed.errors.len() + parsed.warnings.len()) as f64);
        self.metrics
            .reply_lines_dropped
            .inc_by(parsed.dropped_lines as f64);

        let insight = if parsed.is_empty() {
            String::new()
        } else {
            match self
                .call(generator, &render_insight_prompt(&sample.serialized))
                .await
            {
                Ok(text) => text,
                Err(error) => {
                    self.metrics.insight_failures.inc();
                    warn!(
                        error = %error,
                        "insight generation failed, returning issues without insight"
                    );
                    String::new()
                }
            }
        };

        Ok(AnalysisResult {
            warnings: parsed.warnings,
            errors: parsed.errors,
            insight,
            dropped_lines: parsed.dropped_lines,
        })
    }

    async fn call(
        &self,
        generator: &dyn TextGenerator,
        prompt: &str,
    ) -> Result<String, GenerationError> {
        self.metrics.llm_calls.inc();
        generator.generate(prompt).await.inspect_err(|_| {
            self.metrics.llm_failures.inc();
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::model::{IssueKind, LogLevel, Priority};

    /// Replays canned replies in order and records every prompt it sees.
    struct ScriptedGenerator {
        replies: Mutex<VecDeque<Result<String, GenerationError>>>,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedGenerator {
        fn new(replies: Vec<Result<String, GenerationError>>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.into()),
                prompts: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> usize {
            self.prompts.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl TextGenerator for ScriptedGenerator {
        async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(GenerationError::EmptyResponse("script exhausted".into())))
        }
    }

    fn analyzer(generator: Option<Arc<ScriptedGenerator>>) -> LogAnalyzer {
        LogAnalyzer::new(
            generator.map(|g| g as Arc<dyn TextGenerator>),
            LogSampler::default(),
            Arc::new(Metrics::detached().expect("metrics")),
        )
    }

    fn records(levels: &[LogLevel]) -> Vec<LogRecord> {
        levels
            .iter()
            .enumerate()
            .map(|(i, level)| {
                LogRecord::new(None, level.clone(), "PaymentAPI", format!("event {i}"))
            })
            .collect()
    }

    fn quota_error() -> GenerationError {
        GenerationError::Status {
            status: 429,
            body: "quota exceeded".into(),
        }
    }

    const REPLY: &str = "TYPE | PRIORITY | SUMMARY | SUGGESTION\n\
                         Error | High | PaymentAPI is down | BankConnector service is not responding.\n\
                         Warning | Low | DB pool at 80% | Heavy load.\n";

    #[tokio::test]
    async fn missing_credential_is_a_configuration_error() {
        let error = analyzer(None)
            .analyze(&records(&[LogLevel::Error]))
            .await
            .expect_err("no generator configured");

        assert!(matches!(
            error,
            AnalysisError::Configuration(ConfigError::Missing("GEMINI_API_KEY"))
        ));
    }

    #[tokio::test]
    async fn info_only_input_makes_no_calls() {
        let generator = ScriptedGenerator::new(vec![]);
        let result = analyzer(Some(Arc::clone(&generator)))
            .analyze(&records(&[LogLevel::Info, LogLevel::Info]))
            .await
            .expect("analysis succeeds");

        assert_eq!(result, AnalysisResult::default());
        assert_eq!(generator.calls(), 0);
    }

    #[tokio::test]
    async fn extraction_and_insight_are_combined() {
        let generator = ScriptedGenerator::new(vec![
            Ok(REPLY.to_string()),
            Ok("Most errors come from PaymentAPI.".to_string()),
        ]);
        let result = analyzer(Some(Arc::clone(&generator)))
            .analyze(&records(&[LogLevel::Error, LogLevel::Warn, LogLevel::Info]))
            .await
            .expect("analysis succeeds");

        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].kind, IssueKind::Error);
        assert_eq!(result.errors[0].priority, Priority::High);
        assert_eq!(result.warnings[0].summary, "DB pool at 80%");
        assert_eq!(result.insight, "Most errors come from PaymentAPI.");
        assert_eq!(generator.calls(), 2);

        let prompts = generator.prompts.lock().unwrap();
        assert!(prompts[0].contains("TYPE | PRIORITY | SUMMARY | SUGGESTION"));
        assert!(prompts[0].contains("event 0"));
        assert!(!prompts[0].contains("event 2"), "INFO rows are filtered out");
        assert!(prompts[1].contains("SINGLE MOST IMPORTANT"));
        assert!(prompts[1].contains("event 1"));
    }

    #[tokio::test]
    async fn extraction_failure_propagates_without_insight_call() {
        let generator = ScriptedGenerator::new(vec![Err(quota_error())]);
        let error = analyzer(Some(Arc::clone(&generator)))
            .analyze(&records(&[LogLevel::Security]))
            .await
            .expect_err("transport failure is fatal");

        assert!(matches!(error, AnalysisError::Transport(_)));
        assert!(error.to_string().contains("quota exceeded"));
        assert_eq!(generator.calls(), 1);
    }

    #[tokio::test]
    async fn insight_failure_keeps_the_issues() {
        let generator = ScriptedGenerator::new(vec![Ok(REPLY.to_string()), Err(quota_error())]);
        let result = analyzer(Some(Arc::clone(&generator)))
            .analyze(&records(&[LogLevel::Error]))
            .await
            .expect("insight failure is not fatal");

        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.insight, "");
        assert_eq!(generator.calls(), 2);
    }

    #[tokio::test]
    async fn unusable_reply_skips_the_insight_call() {
        let generator = ScriptedGenerator::new(vec![Ok(
            "I could not find any issues.\nInfo | Low | nothing | n/a".to_string(),
        )]);
        let result = analyzer(Some(Arc::clone(&generator)))
            .analyze(&records(&[LogLevel::Warn]))
            .await
            .expect("analysis succeeds");

        assert!(result.is_empty());
        assert_eq!(result.insight, "");
        assert_eq!(result.dropped_lines, 1);
        assert_eq!(generator.calls(), 1);
    }
}
