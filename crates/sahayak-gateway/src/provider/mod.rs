//! Text generation providers and the ordered chain that routes between them.
//!
//! A provider never fails a generation call: every failure mode is logged and
//! converted into localized text from [`crate::fallback`].

mod cloud;
mod local;

use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::ProviderKind;
use crate::error::{GatewayError, Result};
use crate::fallback;
use crate::prompt;
use crate::request::RequestDescriptor;

pub use cloud::{classify_cloud_failure, CloudModelProvider};
pub use local::{resolve_model, LocalModelProvider};

/// Availability snapshot of a provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderState {
    /// Whether the provider can currently serve requests.
    pub available: bool,
    /// Model the provider resolved, if any.
    pub model: Option<String>,
    /// When the state was last computed.
    pub checked_at: DateTime<Utc>,
}

impl ProviderState {
    /// An available provider serving `model`.
    #[must_use]
    pub fn available(model: impl Into<String>) -> Self {
        Self {
            available: true,
            model: Some(model.into()),
            checked_at: Utc::now(),
        }
    }

    /// An unavailable provider.
    #[must_use]
    pub fn unavailable() -> Self {
        Self {
            available: false,
            model: None,
            checked_at: Utc::now(),
        }
    }
}

/// A backend that turns prompts into text.
#[async_trait]
pub trait GenerationProvider: Send + Sync + Debug {
    /// Which kind of provider this is.
    fn kind(&self) -> ProviderKind;

    /// Current availability without re-probing.
    async fn state(&self) -> ProviderState;

    /// Whether the provider can currently serve requests.
    async fn is_available(&self) -> bool {
        self.state().await.available
    }

    /// Re-probe the backend and update the cached state.
    async fn refresh(&self) -> ProviderState;

    /// Send an already built prompt and report failures to the caller.
    async fn try_complete(&self, prompt: &str) -> Result<String>;

    /// Send an already built prompt. Returns model text or localized fallback text.
    async fn complete(&self, prompt: &str, descriptor: &RequestDescriptor) -> String;

    /// Build the topic prompt for `descriptor` and complete it.
    async fn generate_text(&self, descriptor: &RequestDescriptor) -> String {
        self.complete(&prompt::build(descriptor), descriptor).await
    }

    /// Describe a base64-encoded image.
    async fn describe_image(&self, _prompt: &str, _image_base64: &str) -> Result<String> {
        Err(GatewayError::provider_unavailable(
            self.kind().as_str(),
            "This provider does not accept images",
        ))
    }
}

/// Providers tried in order; the first available one answers.
#[derive(Debug, Clone)]
pub struct ProviderChain {
    providers: Vec<Arc<dyn GenerationProvider>>,
}

impl ProviderChain {
    /// Creates a chain from an explicit order.
    #[must_use]
    pub fn new(providers: Vec<Arc<dyn GenerationProvider>>) -> Self {
        Self { providers }
    }

    /// The routed order for a flow: `primary` first, then the other kind.
    #[must_use]
    pub fn routed(
        primary: ProviderKind,
        local: &Arc<dyn GenerationProvider>,
        cloud: &Arc<dyn GenerationProvider>,
    ) -> Self {
        let providers = match primary {
            ProviderKind::Local => vec![Arc::clone(local), Arc::clone(cloud)],
            ProviderKind::Cloud => vec![Arc::clone(cloud), Arc::clone(local)],
        };
        Self::new(providers)
    }

    /// The first available provider, if any.
    async fn first_available(&self) -> Option<&Arc<dyn GenerationProvider>> {
        for provider in &self.providers {
            if provider.is_available().await {
                return Some(provider);
            }
            debug!(provider = %provider.kind(), "Provider unavailable, trying next");
        }
        None
    }

    /// Whether any provider in the chain is available.
    pub async fn has_available(&self) -> bool {
        self.first_available().await.is_some()
    }

    /// Generate topic content with the first available provider.
    pub async fn generate_text(&self, descriptor: &RequestDescriptor) -> String {
        match self.first_available().await {
            Some(provider) => provider.generate_text(descriptor).await,
            None => {
                warn!(topic = %descriptor.topic, "No provider available, using fallback text");
                fallback::fallback_text(&descriptor.language, &descriptor.topic, descriptor.grade())
            }
        }
    }

    /// Send an already built prompt with the first available provider.
    pub async fn complete(&self, prompt: &str, descriptor: &RequestDescriptor) -> String {
        match self.first_available().await {
            Some(provider) => provider.complete(prompt, descriptor).await,
            None => {
                warn!(topic = %descriptor.topic, "No provider available, using fallback text");
                fallback::fallback_text(&descriptor.language, &descriptor.topic, descriptor.grade())
            }
        }
    }

    /// Send a prompt with the first available provider, without fallback text.
    pub async fn try_complete(&self, prompt: &str) -> Result<String> {
        match self.first_available().await {
            Some(provider) => provider.try_complete(prompt).await,
            None => Err(GatewayError::provider_unavailable(
                "any",
                "Start the local model server or set GOOGLE_AI_API_KEY",
            )),
        }
    }

    /// Describe an image with each available provider in turn.
    pub async fn describe_image(&self, prompt: &str, image_base64: &str) -> Result<String> {
        let mut last_error = None;
        for provider in &self.providers {
            if !provider.is_available().await {
                continue;
            }
            match provider.describe_image(prompt, image_base64).await {
                Ok(text) => return Ok(text),
                Err(e) => {
                    warn!(provider = %provider.kind(), error = %e, "Image description failed");
                    last_error = Some(e);
                }
            }
        }
        Err(last_error.unwrap_or_else(|| {
            GatewayError::provider_unavailable(
                "any",
                "Start the local model server or set GOOGLE_AI_API_KEY",
            )
        }))
    }
}
