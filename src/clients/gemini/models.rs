use serde::{Deserialize, Serialize};
use thiserror::Error;

const MAX_ERROR_MESSAGE_LENGTH: usize = 500;

/// Truncates long upstream error bodies so they stay readable in logs and API errors.
pub(crate) fn truncate_error_message(msg: &str) -> String {
    let char_count = msg.chars().count();
    if char_count <= MAX_ERROR_MESSAGE_LENGTH {
        return msg.to_string();
    }
    let truncated: String = msg.chars().take(MAX_ERROR_MESSAGE_LENGTH).collect();
    format!("{truncated}... (truncated, {char_count} chars)")
}

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("text generation request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("text generation endpoint returned error status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("failed to decode text generation response: {0}")]
    Decode(String),
    #[error("text generation response contained no text ({0})")]
    EmptyResponse(String),
    #[error("invalid text generation endpoint: {0}")]
    InvalidEndpoint(String),
}

#[derive(Debug, Serialize)]
pub(crate) struct GenerateContentRequest<'a> {
    pub(crate) contents: Vec<RequestContent<'a>>,
}

impl<'a> GenerateContentRequest<'a> {
    pub(crate) fn from_prompt(prompt: &'a str) -> Self {
        Self {
            contents: vec![RequestContent {
                parts: vec![RequestPart { text: prompt }],
            }],
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct RequestContent<'a> {
    pub(crate) parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
pub(crate) struct RequestPart<'a> {
    pub(crate) text: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerateContentResponse {
    #[serde(default)]
    pub(crate) candidates: Vec<Candidate>,
    #[serde(default)]
    pub(crate) prompt_feedback: Option<PromptFeedback>,
}

impl GenerateContentResponse {
    /// Concatenates the text parts of the first candidate.
    pub(crate) fn into_text(self) -> Result<String, GenerationError> {
        let block_reason = self
            .prompt_feedback
            .and_then(|feedback| feedback.block_reason);
        let Some(candidate) = self.candidates.into_iter().next() else {
            let reason = block_reason.map_or_else(
                || "no candidates".to_string(),
                |reason| format!("prompt blocked: {reason}"),
            );
            return Err(GenerationError::EmptyResponse(reason));
        };

        let text: String = candidate
            .content
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|part| part.text)
                    .collect()
            })
            .unwrap_or_default();

        if text.is_empty() {
            let reason = candidate
                .finish_reason
                .map_or_else(|| "empty candidate".to_string(), |r| format!("finish reason {r}"));
            return Err(GenerationError::EmptyResponse(reason));
        }
        Ok(text)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Candidate {
    #[serde(default)]
    pub(crate) content: Option<CandidateContent>,
    #[serde(default)]
    pub(crate) finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CandidateContent {
    #[serde(default)]
    pub(crate) parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ResponsePart {
    #[serde(default)]
    pub(crate) text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PromptFeedback {
    #[serde(default)]
    pub(crate) block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ListModelsResponse {
    #[serde(default)]
    pub(crate) models: Vec<ModelInfo>,
    #[serde(default)]
    pub(crate) next_page_token: Option<String>,
}

/// A model visible to the configured key.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelInfo {
    pub name: String,
    #[serde(default)]
    pub supported_generation_methods: Vec<String>,
}

impl ModelInfo {
    #[must_use]
    pub fn supports_generate_content(&self) -> bool {
        self.supported_generation_methods
            .iter()
            .any(|method| method == "generateContent")
    }
}
