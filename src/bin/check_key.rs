use anyhow::{Context, bail};
use tracing::{info, warn};

use logeasy::{
    clients::{GeminiClient, TextGenerator},
    config::Config,
    observability,
};

const PREFERRED_MODELS: [&str; 2] = ["models/gemini-2.5-flash", "models/gemini-pro-latest"];

/// Verifies that the configured Gemini key can list models and generate text.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    observability::tracing::init_cli()?;

    let config = Config::from_env().context("failed to load configuration")?;
    let api_key = config
        .require_api_key()
        .context("export the key before running this check")?;
    let client = GeminiClient::new(
        config.gemini_base_url(),
        api_key,
        config.gemini_model(),
        config.gemini_timeout(),
    )?;

    let models = client
        .list_models()
        .await
        .context("failed to list models, the key may be invalid")?;
    let usable: Vec<&str> = models
        .iter()
        .filter(|model| model.supports_generate_content())
        .map(|model| model.name.as_str())
        .collect();
    info!(count = usable.len(), "models supporting generateContent");

    let chosen = PREFERRED_MODELS
        .iter()
        .copied()
        .find(|preferred| usable.contains(preferred))
        .or_else(|| usable.first().copied());
    let Some(model) = chosen else {
        bail!("no model available to this key supports generateContent");
    };
    if !PREFERRED_MODELS.contains(&model) {
        warn!(model, "preferred models unavailable, falling back");
    }

    let reply = client
        .with_model(model)
        .generate("Hello")
        .await
        .with_context(|| format!("test request to {model} failed"))?;

    info!(model, reply = reply.trim(), "API key works");
    Ok(())
}
