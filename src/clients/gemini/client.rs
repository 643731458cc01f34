use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use tracing::debug;

use crate::clients::TextGenerator;
use crate::config::Config;

use super::models::{
    GenerateContentRequest, GenerateContentResponse, GenerationError, ListModelsResponse,
    ModelInfo, truncate_error_message,
};

const API_KEY_HEADER: &str = "x-goog-api-key";
const API_VERSION: &str = "v1beta";

/// Gemini `generateContent` client. No retries: every failure goes straight
/// back to the caller.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    base_url: Url,
    api_key: String,
    model: String,
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("base_url", &self.base_url.as_str())
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl GeminiClient {
    /// # Errors
    /// Fails when the base URL does not parse or the HTTP client cannot be built.
    pub fn new(
        base_url: &str,
        api_key: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, GenerationError> {
        let client = Client::builder().timeout(timeout).build()?;

        let mut base = base_url.to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base)
            .map_err(|error| GenerationError::InvalidEndpoint(format!("{base_url}: {error}")))?;

        Ok(Self {
            client,
            base_url,
            api_key: api_key.into(),
            model: normalize_model(&model.into()),
        })
    }

    /// Builds a client from configuration, or `None` when no API key is set.
    ///
    /// # Errors
    /// See [`GeminiClient::new`].
    pub fn from_config(config: &Config) -> Result<Option<Self>, GenerationError> {
        config
            .gemini_api_key()
            .map(|key| {
                Self::new(
                    config.gemini_base_url(),
                    key,
                    config.gemini_model(),
                    config.gemini_timeout(),
                )
            })
            .transpose()
    }

    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Same transport and key, different model.
    #[must_use]
    pub fn with_model(&self, model: &str) -> Self {
        Self {
            model: normalize_model(model),
            ..self.clone()
        }
    }

    /// Lists every model the key can see, following pagination.
    ///
    /// # Errors
    /// Transport, status and decode failures as [`GenerationError`].
    pub async fn list_models(&self) -> Result<Vec<ModelInfo>, GenerationError> {
        let url = self.endpoint(&format!("{API_VERSION}/models"))?;
        let mut models = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut request = self
                .client
                .get(url.clone())
                .header(API_KEY_HEADER, &self.api_key);
            if let Some(token) = &page_token {
                request = request.query(&[("pageToken", token)]);
            }

            let body = read_success_body(request.send().await?).await?;
            let page: ListModelsResponse = serde_json::from_str(&body)
                .map_err(|error| GenerationError::Decode(error.to_string()))?;
            models.extend(page.models);

            match page.next_page_token.filter(|token| !token.is_empty()) {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        debug!(count = models.len(), "listed gemini models");
        Ok(models)
    }

    fn endpoint(&self, path: &str) -> Result<Url, GenerationError> {
        self.base_url
            .join(path)
            .map_err(|error| GenerationError::InvalidEndpoint(format!("{path}: {error}")))
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let url = self.endpoint(&format!("{API_VERSION}/{}:generateContent", self.model))?;

        debug!(
            model = %self.model,
            prompt_chars = prompt.chars().count(),
            "sending generateContent request"
        );

        let response = self
            .client
            .post(url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(&GenerateContentRequest::from_prompt(prompt))
            .send()
            .await?;

        let body = read_success_body(response).await?;
        let decoded: GenerateContentResponse = serde_json::from_str(&body)
            .map_err(|error| GenerationError::Decode(error.to_string()))?;
        let text = decoded.into_text()?;

        debug!(
            model = %self.model,
            reply_chars = text.chars().count(),
            "received generateContent reply"
        );
        Ok(text)
    }
}

async fn read_success_body(response: reqwest::Response) -> Result<String, GenerationError> {
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(GenerationError::Status {
            status: status.as_u16(),
            body: truncate_error_message(&body),
        });
    }
    Ok(body)
}

fn normalize_model(model: &str) -> String {
    let model = model.trim();
    if model.starts_with("models/") || model.starts_with("tunedModels/") {
        model.to_string()
    } else {
        format!("models/{model}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> GeminiClient {
        GeminiClient::new(
            &server.uri(),
            "test-key",
            "gemini-2.5-flash",
            Duration::from_secs(5),
        )
        .expect("client should build")
    }

    #[tokio::test]
    async fn generate_returns_candidate_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-2.5-flash:generateContent"))
            .and(header("x-goog-api-key", "test-key"))
            .and(body_partial_json(serde_json::json!({
                "contents": [{"parts": [{"text": "Hello"}]}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "candidates": [{"content": {"parts": [{"text": "Hi there"}]}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let reply = client_for(&server)
            .generate("Hello")
            .await
            .expect("generate succeeds");

        assert_eq!(reply, "Hi there");
    }

    #[tokio::test]
    async fn quota_error_surfaces_status_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(429).set_body_string("Resource has been exhausted"),
            )
            .expect(1)
            .mount(&server)
            .await;

        let error = client_for(&server)
            .generate("Hello")
            .await
            .expect_err("should fail");

        assert!(matches!(error, GenerationError::Status { status: 429, .. }));
        assert!(error.to_string().contains("Resource has been exhausted"));
    }

    #[tokio::test]
    async fn non_json_body_is_a_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let error = client_for(&server)
            .generate("Hello")
            .await
            .expect_err("should fail");

        assert!(matches!(error, GenerationError::Decode(_)));
    }

    #[tokio::test]
    async fn list_models_follows_pages() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1beta/models"))
            .and(query_param("pageToken", "next"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "models": [{"name": "models/embedding-001", "supportedGenerationMethods": ["embedContent"]}]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1beta/models"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "models": [{"name": "models/gemini-2.5-flash", "supportedGenerationMethods": ["generateContent"]}],
                "nextPageToken": "next"
            })))
            .mount(&server)
            .await;

        let models = client_for(&server)
            .list_models()
            .await
            .expect("listing succeeds");

        let names: Vec<&str> = models.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["models/gemini-2.5-flash", "models/embedding-001"]);
        assert!(models[0].supports_generate_content());
        assert!(!models[1].supports_generate_content());
    }

    #[test]
    fn model_names_gain_the_models_prefix() {
        assert_eq!(normalize_model("gemini-pro-latest"), "models/gemini-pro-latest");
        assert_eq!(normalize_model("models/gemini-2.5-flash"), "models/gemini-2.5-flash");
    }

    #[test]
    fn from_config_without_key_yields_none() {
        let config = Config::default();
        assert!(GeminiClient::from_config(&config).expect("builds").is_none());

        let config = Config::default().with_gemini("http://localhost:1/", Some("k".into()));
        let client = GeminiClient::from_config(&config)
            .expect("builds")
            .expect("key present");
        assert_eq!(client.model(), "models/gemini-2.5-flash");
    }
}
