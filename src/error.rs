//! Failures an analysis run can surface to its caller.
//!
//! Malformed reply lines and a failed insight call never show up here: the
//! former are dropped by the parser, the latter is logged and swallowed.
use thiserror::Error;

use crate::{clients::gemini::GenerationError, config::ConfigError, ingest::IngestError};

#[derive(Debug, Error)]
pub enum AnalysisError {
    /// The text-generation credential is missing or unusable.
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigError),
    /// The extraction call failed; no partial result exists.
    #[error("text generation failed: {0}")]
    Transport(#[from] GenerationError),
    /// The uploaded file could not be read as a log table.
    #[error("malformed input: {0}")]
    MalformedInput(#[from] IngestError),
}

impl AnalysisError {
    /// Short machine-readable tag used in API error bodies and log fields.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "configuration_error",
            Self::Transport(_) => "transport_error",
            Self::MalformedInput(_) => "malformed_input",
        }
    }
}
