//! Locally hosted model server (Ollama-compatible HTTP API).

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{info, instrument, warn};

use super::{GenerationProvider, ProviderState};
use crate::config::{LocalModelConfig, ProviderKind};
use crate::error::{GatewayError, ProviderErrorKind, Result};
use crate::fallback;
use crate::request::RequestDescriptor;

const PROVIDER: &str = "local";

static MEMORY_ERROR: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(r"(?i)out of memory|insufficient|allocation failed|memory|\boom\b").ok()
});

fn is_memory_error(body: &str) -> bool {
    MEMORY_ERROR
        .as_ref()
        .map_or_else(|| body.to_lowercase().contains("memory"), |re| re.is_match(body))
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<ModelEntry>,
}

#[derive(Debug, Deserialize)]
struct ModelEntry {
    name: String,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f64,
    top_p: f64,
    num_predict: u32,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    images: Option<[&'a str; 1]>,
    options: GenerateOptions,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

/// Picks the model to use from the names the server lists.
///
/// `preferred` and then each of `fallbacks` is first looked up by exact name.
/// Only when none is listed verbatim are the fallbacks tried as substrings of
/// a listed name. With no match the first listed model is used.
///
/// ```
/// use sahayak_gateway::provider::resolve_model;
///
/// let listed = vec!["mistral:7b".to_string(), "llama3:latest".to_string()];
/// let model = resolve_model("llama3:8b", &["llama3".to_string()], &listed);
/// assert_eq!(model.as_deref(), Some("llama3:latest"));
/// ```
#[must_use]
pub fn resolve_model(preferred: &str, fallbacks: &[String], listed: &[String]) -> Option<String> {
    let fallbacks = fallbacks.iter().map(String::as_str).filter(|c| !c.is_empty());
    let exact = std::iter::once(preferred)
        .filter(|c| !c.is_empty())
        .chain(fallbacks.clone())
        .find_map(|candidate| listed.iter().find(|name| name.as_str() == candidate));
    let partial = || {
        fallbacks
            .clone()
            .find_map(|candidate| listed.iter().find(|name| name.contains(candidate)))
    };
    exact.or_else(partial).or_else(|| listed.first()).cloned()
}

/// Provider backed by a local model server.
#[derive(Debug)]
pub struct LocalModelProvider {
    client: Client,
    config: LocalModelConfig,
    state: RwLock<ProviderState>,
}

impl LocalModelProvider {
    /// Creates a provider that has not probed yet and reports unavailable.
    #[must_use]
    pub fn new(client: Client, config: LocalModelConfig) -> Self {
        Self {
            client,
            config,
            state: RwLock::new(ProviderState::unavailable()),
        }
    }

    /// Creates a provider and probes the server once.
    pub async fn connect(client: Client, config: LocalModelConfig) -> Self {
        let provider = Self::new(client, config);
        provider.refresh().await;
        provider
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.base_url.trim_end_matches('/'))
    }

    async fn probe(&self) -> Result<Option<String>> {
        let response = self
            .client
            .get(self.url("/api/tags"))
            .timeout(self.config.probe_timeout())
            .send()
            .await
            .map_err(classify_transport)?;
        if !response.status().is_success() {
            return Err(GatewayError::provider_api(
                PROVIDER,
                ProviderErrorKind::Server,
                format!("model listing returned {}", response.status()),
            ));
        }
        let tags: TagsResponse = response.json().await.map_err(classify_transport)?;
        let listed: Vec<String> = tags.models.into_iter().map(|m| m.name).collect();
        Ok(resolve_model(
            &self.config.preferred_model,
            &self.config.fallback_models,
            &listed,
        ))
    }

    async fn generate(
        &self,
        model: &str,
        prompt: &str,
        image_base64: Option<&str>,
    ) -> Result<String> {
        let payload = GenerateRequest {
            model,
            prompt,
            stream: false,
            images: image_base64.map(|image| [image]),
            options: GenerateOptions {
                temperature: self.config.temperature,
                top_p: self.config.top_p,
                num_predict: self.config.num_predict,
            },
        };
        let timeout = if image_base64.is_some() {
            self.config.vision_timeout()
        } else {
            self.config.timeout()
        };

        let response = self
            .client
            .post(self.url("/api/generate"))
            .timeout(timeout)
            .json(&payload)
            .send()
            .await
            .map_err(classify_transport)?;

        match response.status() {
            StatusCode::OK => {
                let body: GenerateResponse = response.json().await.map_err(classify_transport)?;
                let text = body.response.trim();
                if text.is_empty() {
                    return Err(GatewayError::provider_api(
                        PROVIDER,
                        ProviderErrorKind::EmptyResponse,
                        format!("model {model} returned no text"),
                    ));
                }
                Ok(text.to_string())
            }
            status => {
                let body = response.text().await.unwrap_or_default();
                let kind = if status == StatusCode::INTERNAL_SERVER_ERROR && is_memory_error(&body)
                {
                    ProviderErrorKind::ResourceExhausted
                } else {
                    ProviderErrorKind::Server
                };
                Err(GatewayError::provider_api(
                    PROVIDER,
                    kind,
                    format!("{status}: {}", body.chars().take(200).collect::<String>()),
                ))
            }
        }
    }
}

fn classify_transport(err: reqwest::Error) -> GatewayError {
    let kind = if err.is_timeout() {
        ProviderErrorKind::Timeout
    } else if err.is_decode() {
        ProviderErrorKind::Other
    } else {
        ProviderErrorKind::Network
    };
    GatewayError::provider_api(PROVIDER, kind, err.to_string())
}

#[async_trait]
impl GenerationProvider for LocalModelProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Local
    }

    async fn state(&self) -> ProviderState {
        self.state.read().await.clone()
    }

    #[instrument(skip(self), fields(base_url = %self.config.base_url))]
    async fn refresh(&self) -> ProviderState {
        let state = match self.probe().await {
            Ok(Some(model)) => {
                info!(model = %model, "Local model server available");
                ProviderState::available(model)
            }
            Ok(None) => {
                warn!("Local model server lists no models");
                ProviderState::unavailable()
            }
            Err(e) => {
                warn!(error = %e, "Local model server unavailable");
                ProviderState::unavailable()
            }
        };
        *self.state.write().await = state.clone();
        state
    }

    async fn try_complete(&self, prompt: &str) -> Result<String> {
        let Some(model) = self.state().await.model else {
            return Err(GatewayError::provider_unavailable(
                PROVIDER,
                "Start the local model server and pull a model",
            ));
        };
        self.generate(&model, prompt, None).await
    }

    async fn complete(&self, prompt: &str, descriptor: &RequestDescriptor) -> String {
        let language = &descriptor.language;
        match self.try_complete(prompt).await {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "Local generation failed");
                match e.provider_kind() {
                    Some(ProviderErrorKind::Timeout) => {
                        fallback::timeout_message(language).to_string()
                    }
                    Some(ProviderErrorKind::ResourceExhausted) => {
                        fallback::resource_message(language).to_string()
                    }
                    Some(ProviderErrorKind::Server | ProviderErrorKind::Other) => {
                        fallback::model_error_message(language).to_string()
                    }
                    _ => fallback::fallback_text(language, &descriptor.topic, descriptor.grade()),
                }
            }
        }
    }

    async fn describe_image(&self, prompt: &str, image_base64: &str) -> Result<String> {
        if !self.is_available().await {
            return Err(GatewayError::provider_unavailable(
                PROVIDER,
                "Start the local model server",
            ));
        }
        let model = self.config.vision_model.clone();
        self.generate(&model, prompt, Some(image_base64)).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use std::time::Duration;

    use httpmock::prelude::*;

    use super::*;
    use crate::request::GradeBand;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(ToString::to_string).collect()
    }

    fn config(server: &MockServer) -> LocalModelConfig {
        LocalModelConfig {
            base_url: server.base_url(),
            ..LocalModelConfig::default()
        }
    }

    async fn mock_tags(server: &MockServer, models: &[&str]) {
        let entries: Vec<_> = models
            .iter()
            .map(|name| serde_json::json!({ "name": name }))
            .collect();
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api/tags");
                then.status(200)
                    .json_body(serde_json::json!({ "models": entries }));
            })
            .await;
    }

    #[test]
    fn resolve_prefers_exact_preferred() {
        let listed = names(&["llama3:latest", "llama3:8b"]);
        let model = resolve_model("llama3:8b", &names(&["llama3:latest"]), &listed);
        assert_eq!(model.as_deref(), Some("llama3:8b"));
    }

    #[test]
    fn resolve_walks_fallbacks_then_first_listed() {
        let listed = names(&["mistral:7b", "phi3:mini"]);
        assert_eq!(
            resolve_model("llama3:8b", &names(&["phi3"]), &listed).as_deref(),
            Some("phi3:mini")
        );
        assert_eq!(
            resolve_model("llama3:8b", &names(&["llama"]), &listed).as_deref(),
            Some("mistral:7b")
        );
        assert_eq!(resolve_model("llama3:8b", &[], &[]), None);
    }

    #[test]
    fn resolve_prefers_exact_fallback_over_partial_preferred() {
        let listed = names(&["llama3:8b-instruct-q4", "llama3:latest"]);
        let fallbacks = LocalModelConfig::default().fallback_models;
        assert_eq!(
            resolve_model("llama3:8b", &fallbacks, &listed).as_deref(),
            Some("llama3:latest")
        );
    }

    #[test]
    fn resolve_partial_matches_follow_fallback_order() {
        let listed = names(&["llama2:7b", "llama3.1:8b", "llama3:70b"]);
        let fallbacks = LocalModelConfig::default().fallback_models;
        assert_eq!(
            resolve_model("llama3:8b", &fallbacks, &listed).as_deref(),
            Some("llama3.1:8b")
        );
    }

    #[test]
    fn memory_errors_are_detected() {
        assert!(is_memory_error("model requires more system memory"));
        assert!(is_memory_error("CUDA error: out of memory"));
        assert!(is_memory_error("OOM killed"));
        assert!(!is_memory_error("model not found"));
    }

    #[tokio::test]
    async fn unreachable_server_is_unavailable_and_falls_back() {
        let config = LocalModelConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            probe_timeout_secs: 1,
            ..LocalModelConfig::default()
        };
        let provider = LocalModelProvider::connect(Client::new(), config).await;
        assert!(!provider.is_available().await);

        let descriptor = RequestDescriptor::new("Rain").with_language("mr");
        let text = provider.complete("prompt", &descriptor).await;
        assert_eq!(
            text,
            fallback::fallback_text(&descriptor.language, "Rain", GradeBand::Three)
        );
    }

    #[tokio::test]
    async fn generates_with_resolved_model() {
        let server = MockServer::start_async().await;
        mock_tags(&server, &["llama3:latest"]).await;
        let generate = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/api/generate")
                    .json_body_partial(r#"{"model":"llama3:latest","stream":false}"#);
                then.status(200)
                    .json_body(serde_json::json!({ "response": "  Rain falls from clouds.  " }));
            })
            .await;

        let provider = LocalModelProvider::connect(Client::new(), config(&server)).await;
        let state = provider.state().await;
        assert!(state.available);
        assert_eq!(state.model.as_deref(), Some("llama3:latest"));

        let text = provider
            .generate_text(&RequestDescriptor::new("Rain"))
            .await;
        generate.assert_async().await;
        assert_eq!(text, "Rain falls from clouds.");
    }

    #[tokio::test]
    async fn slow_generation_yields_timeout_message() {
        let server = MockServer::start_async().await;
        mock_tags(&server, &["llama3:8b"]).await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/api/generate");
                then.status(200)
                    .delay(Duration::from_secs(3))
                    .json_body(serde_json::json!({ "response": "too late" }));
            })
            .await;

        let config = LocalModelConfig {
            timeout_secs: 1,
            ..config(&server)
        };
        let provider = LocalModelProvider::connect(Client::new(), config).await;
        let descriptor = RequestDescriptor::new("Rain").with_language("hi");
        let text = provider.complete("prompt", &descriptor).await;
        assert_eq!(text, fallback::timeout_message(&descriptor.language));
    }

    #[tokio::test]
    async fn memory_failure_yields_resource_message() {
        let server = MockServer::start_async().await;
        mock_tags(&server, &["llama3:8b"]).await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/api/generate");
                then.status(500)
                    .body(r#"{"error":"model requires more system memory (5.6 GiB)"}"#);
            })
            .await;

        let provider = LocalModelProvider::connect(Client::new(), config(&server)).await;
        let descriptor = RequestDescriptor::new("Rain").with_language("hi");
        let text = provider.complete("prompt", &descriptor).await;
        assert_eq!(text, fallback::resource_message(&descriptor.language));
    }

    #[tokio::test]
    async fn other_server_failure_yields_model_error_message() {
        let server = MockServer::start_async().await;
        mock_tags(&server, &["llama3:8b"]).await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/api/generate");
                then.status(500).body("model crashed");
            })
            .await;

        let provider = LocalModelProvider::connect(Client::new(), config(&server)).await;
        let text = provider
            .complete("prompt", &RequestDescriptor::new("Rain"))
            .await;
        assert_eq!(text, fallback::model_error_message(&crate::request::Language::English));
    }

    #[tokio::test]
    async fn empty_reply_yields_fallback_text() {
        let server = MockServer::start_async().await;
        mock_tags(&server, &["llama3:8b"]).await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/api/generate");
                then.status(200).json_body(serde_json::json!({ "response": "   " }));
            })
            .await;

        let provider = LocalModelProvider::connect(Client::new(), config(&server)).await;
        let text = provider
            .complete("prompt", &RequestDescriptor::new("Rain"))
            .await;
        assert!(text.starts_with("About \"Rain\""));
    }

    #[tokio::test]
    async fn describe_image_sends_vision_model() {
        let server = MockServer::start_async().await;
        mock_tags(&server, &["llama3:8b"]).await;
        let vision = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/api/generate")
                    .json_body_partial(r#"{"model":"llava-phi3:latest","images":["aGk="]}"#);
                then.status(200)
                    .json_body(serde_json::json!({ "response": "A page of sums." }));
            })
            .await;

        let provider = LocalModelProvider::connect(Client::new(), config(&server)).await;
        let text = provider.describe_image("Describe", "aGk=").await.unwrap();
        vision.assert_async().await;
        assert_eq!(text, "A page of sums.");
    }
}
