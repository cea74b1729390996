//! Text-to-image generation through the Stability REST API.
//!
//! A successful response carries base64 PNG artifacts; the first one is
//! decoded and written through the [`ImageStore`]. A 503 means the model is
//! still loading and is retried a bounded number of times.

use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::Utc;
use reqwest::{header, Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::provider::ImageSource;
use crate::store::ImageStore;
use crate::{Result, VisualConfig, VisualError, VisualRequest, VisualStrategy};

/// Quality and child-safety modifiers appended to every generation prompt.
const PROMPT_MODIFIERS: &str = "high quality, detailed, vibrant colors, child-friendly, \
classroom appropriate, professional educational material, clear visual elements, engaging design, \
suitable for learning, digital art, clean composition, educational illustration, safe for children";

/// Content the model is steered away from.
pub const NEGATIVE_PROMPT: &str =
    "blurry, low quality, inappropriate, violent, scary, dark, adult content, nsfw";

/// Longest description, in characters, used as the prompt base.
const MAX_DESCRIPTION_CHARS: usize = 1200;

/// Longest error body excerpt kept in errors.
const MAX_ERROR_BODY_CHARS: usize = 200;

#[derive(Debug, Serialize)]
struct TextPrompt<'a> {
    text: &'a str,
    weight: i8,
}

#[derive(Debug, Serialize)]
struct GenerationPayload<'a> {
    text_prompts: [TextPrompt<'a>; 2],
    cfg_scale: u8,
    height: u16,
    width: u16,
    steps: u8,
    samples: u8,
    style_preset: &'static str,
}

#[derive(Debug, Deserialize)]
struct GenerationResponse {
    #[serde(default)]
    artifacts: Vec<Artifact>,
}

#[derive(Debug, Deserialize)]
struct Artifact {
    base64: Option<String>,
}

/// Builds the positive generation prompt for `request`.
///
/// The base is the request description when present, otherwise
/// `Educational {style} about {prompt} for {subject}`.
///
/// ```
/// use sahayak_visual::{generation::generation_prompt, VisualRequest};
///
/// let prompt = generation_prompt(&VisualRequest::new("volcano", "diagram", "science"));
/// assert!(prompt.starts_with("Educational diagram about volcano for science"));
/// assert!(prompt.contains("safe for children"));
/// ```
#[must_use]
pub fn generation_prompt(request: &VisualRequest) -> String {
    let base = request.description.as_deref().map_or_else(
        || {
            format!(
                "Educational {} about {} for {}",
                request.style.trim(),
                request.prompt.trim(),
                request.subject.trim()
            )
        },
        |description| description.trim().chars().take(MAX_DESCRIPTION_CHARS).collect(),
    );
    format!(
        "{base}, educational {}, {PROMPT_MODIFIERS}",
        request.style.trim()
    )
}

/// Generation strategy backed by the Stability text-to-image endpoint.
#[derive(Debug, Clone)]
pub struct StabilityGenerator {
    client: Client,
    api_key: Option<String>,
    endpoint: String,
    timeout: Duration,
    loading_retries: u32,
    loading_wait: Duration,
    store: ImageStore,
}

impl StabilityGenerator {
    /// Creates a generator from configuration.
    #[must_use]
    pub fn new(client: Client, config: &VisualConfig) -> Self {
        Self {
            client,
            api_key: config.stability_key().map(ToString::to_string),
            endpoint: config.stability_url.clone(),
            timeout: config.generation_timeout(),
            loading_retries: config.model_loading_retries,
            loading_wait: config.model_loading_wait(),
            store: ImageStore::new(&config.upload_dir, &config.public_prefix),
        }
    }

    async fn persist(&self, response: GenerationResponse, request: &VisualRequest) -> Result<String> {
        let encoded = response
            .artifacts
            .into_iter()
            .find_map(|artifact| artifact.base64)
            .ok_or(VisualError::NoArtifacts)?;
        let bytes = STANDARD.decode(encoded.trim())?;

        let file_name = format!(
            "stability_generated_{}_{}_{}.png",
            Utc::now().timestamp_millis(),
            request.style.trim(),
            request.subject.trim()
        );
        let url = self.store.save(&file_name, &bytes).await?;
        info!(url = %url, bytes = bytes.len(), "Generated image stored");
        Ok(url)
    }
}

#[async_trait]
impl ImageSource for StabilityGenerator {
    fn strategy(&self) -> VisualStrategy {
        VisualStrategy::Generated
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    #[instrument(skip(self, request), fields(style = %request.style, subject = %request.subject))]
    async fn fetch(&self, request: &VisualRequest) -> Result<Option<String>> {
        let Some(api_key) = self.api_key.as_deref() else {
            debug!("Image generation key not configured, skipping");
            return Ok(None);
        };

        let prompt = generation_prompt(request);
        let payload = GenerationPayload {
            text_prompts: [
                TextPrompt {
                    text: &prompt,
                    weight: 1,
                },
                TextPrompt {
                    text: NEGATIVE_PROMPT,
                    weight: -1,
                },
            ],
            cfg_scale: 7,
            height: 1024,
            width: 1024,
            steps: 30,
            samples: 1,
            style_preset: "digital-art",
        };

        let mut attempts = 0u32;
        loop {
            attempts += 1;
            let response = self
                .client
                .post(&self.endpoint)
                .bearer_auth(api_key)
                .header(header::ACCEPT, "application/json")
                .timeout(self.timeout)
                .json(&payload)
                .send()
                .await?;

            match response.status() {
                StatusCode::OK => {
                    let body: GenerationResponse = response.json().await?;
                    return self.persist(body, request).await.map(Some);
                }
                StatusCode::UNAUTHORIZED => return Err(VisualError::Unauthorized),
                StatusCode::PAYMENT_REQUIRED => return Err(VisualError::InsufficientCredits),
                StatusCode::SERVICE_UNAVAILABLE if attempts <= self.loading_retries => {
                    warn!(
                        attempt = attempts,
                        wait_secs = self.loading_wait.as_secs(),
                        "Image model loading, retrying"
                    );
                    tokio::time::sleep(self.loading_wait).await;
                }
                StatusCode::SERVICE_UNAVAILABLE => {
                    return Err(VisualError::ModelLoading { attempts });
                }
                status => {
                    let body = response.text().await.unwrap_or_default();
                    return Err(VisualError::Api {
                        status: status.as_u16(),
                        message: body.chars().take(MAX_ERROR_BODY_CHARS).collect(),
                    });
                }
            }
        }
    }
}
