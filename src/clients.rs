pub mod gemini;

use async_trait::async_trait;

pub use gemini::{GeminiClient, GenerationError};

/// A remote text-completion capability: one prompt in, one reply out.
///
/// Implementations must not retry; the caller decides what a failure means.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError>;
}
