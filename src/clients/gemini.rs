mod client;
mod models;

pub use client::GeminiClient;
pub use models::{GenerationError, ModelInfo};
