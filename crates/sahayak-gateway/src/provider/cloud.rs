//! Cloud-hosted model (Gemini `generateContent` REST API).

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{instrument, warn};

use super::{GenerationProvider, ProviderState};
use crate::config::{CloudModelConfig, ProviderKind};
use crate::error::{GatewayError, ProviderErrorKind, Result};
use crate::fallback;
use crate::request::RequestDescriptor;

const PROVIDER: &str = "cloud";

#[derive(Debug, Serialize)]
struct InlineData<'a> {
    mime_type: &'static str,
    data: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part<'a> {
    Text { text: &'a str },
    Image { inline_data: InlineData<'a> },
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f64,
    top_p: f64,
    top_k: u32,
    max_output_tokens: u32,
    candidate_count: u8,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: [Content<'a>; 1],
    generation_config: GenerationConfig,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

/// Classifies a failed cloud call from its HTTP status and message.
///
/// ```
/// use sahayak_gateway::provider::classify_cloud_failure;
/// use sahayak_gateway::ProviderErrorKind;
///
/// assert_eq!(classify_cloud_failure(Some(429), ""), ProviderErrorKind::Quota);
/// assert_eq!(
///     classify_cloud_failure(Some(400), "API key not valid"),
///     ProviderErrorKind::Authentication
/// );
/// ```
#[must_use]
pub fn classify_cloud_failure(status: Option<u16>, message: &str) -> ProviderErrorKind {
    let lower = message.to_lowercase();
    if status == Some(429) || lower.contains("quota") || lower.contains("resource_exhausted") {
        ProviderErrorKind::Quota
    } else if matches!(status, Some(401 | 403))
        || lower.contains("api_key")
        || lower.contains("api key")
    {
        ProviderErrorKind::Authentication
    } else {
        ProviderErrorKind::Server
    }
}

/// Provider backed by the cloud model API. Available iff a key is configured.
#[derive(Debug, Clone)]
pub struct CloudModelProvider {
    client: Client,
    config: CloudModelConfig,
}

impl CloudModelProvider {
    /// Creates a provider from configuration.
    #[must_use]
    pub const fn new(client: Client, config: CloudModelConfig) -> Self {
        Self { client, config }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        )
    }

    async fn generate(&self, parts: Vec<Part<'_>>) -> Result<String> {
        let Some(api_key) = self.config.api_key() else {
            return Err(GatewayError::provider_unavailable(
                PROVIDER,
                "Set GOOGLE_AI_API_KEY to enable the cloud model",
            ));
        };
        let payload = GenerateContentRequest {
            contents: [Content { parts }],
            generation_config: GenerationConfig {
                temperature: self.config.temperature,
                top_p: self.config.top_p,
                top_k: self.config.top_k,
                max_output_tokens: self.config.max_output_tokens,
                candidate_count: 1,
            },
        };

        let response = self
            .client
            .post(self.endpoint())
            .query(&[("key", api_key)])
            .timeout(self.config.timeout())
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                let kind = if e.is_timeout() {
                    ProviderErrorKind::Timeout
                } else {
                    ProviderErrorKind::Network
                };
                GatewayError::provider_api(PROVIDER, kind, e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let kind = classify_cloud_failure(Some(status.as_u16()), &body);
            return Err(GatewayError::provider_api(
                PROVIDER,
                kind,
                format!("{status}: {}", body.chars().take(200).collect::<String>()),
            ));
        }

        let body: GenerateContentResponse = response.json().await.map_err(|e| {
            GatewayError::provider_api(PROVIDER, ProviderErrorKind::Other, e.to_string())
        })?;
        let text: String = body
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .map(|content| content.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();
        let text = text.trim();
        if text.is_empty() {
            return Err(GatewayError::provider_api(
                PROVIDER,
                ProviderErrorKind::EmptyResponse,
                "no candidate text",
            ));
        }
        Ok(text.to_string())
    }
}

#[async_trait]
impl GenerationProvider for CloudModelProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Cloud
    }

    async fn state(&self) -> ProviderState {
        if self.config.api_key().is_some() {
            ProviderState::available(self.config.model.clone())
        } else {
            ProviderState::unavailable()
        }
    }

    async fn refresh(&self) -> ProviderState {
        self.state().await
    }

    #[instrument(skip(self, prompt), fields(model = %self.config.model))]
    async fn try_complete(&self, prompt: &str) -> Result<String> {
        self.generate(vec![Part::Text { text: prompt }]).await
    }

    async fn complete(&self, prompt: &str, descriptor: &RequestDescriptor) -> String {
        match self.try_complete(prompt).await {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "Cloud generation failed, using fallback text");
                fallback::fallback_text(&descriptor.language, &descriptor.topic, descriptor.grade())
            }
        }
    }

    async fn describe_image(&self, prompt: &str, image_base64: &str) -> Result<String> {
        self.generate(vec![
            Part::Text { text: prompt },
            Part::Image {
                inline_data: InlineData {
                    mime_type: "image/jpeg",
                    data: image_base64,
                },
            },
        ])
        .await
    }
}
