//! Settings for the visual strategies.

use std::time::Duration;

use serde::{Deserialize, Serialize};

fn default_stability_url() -> String {
    "https://api.stability.ai/v1/generation/stable-diffusion-xl-1024-v1-0/text-to-image".to_string()
}

fn default_stock_photo_base() -> String {
    "https://source.unsplash.com".to_string()
}

fn default_placeholder_base() -> String {
    "https://via.placeholder.com".to_string()
}

fn default_upload_dir() -> String {
    "uploads/visuals".to_string()
}

fn default_public_prefix() -> String {
    "/uploads/visuals".to_string()
}

const fn default_generation_timeout() -> u64 {
    60
}

const fn default_stock_timeout() -> u64 {
    5
}

const fn default_model_loading_retries() -> u32 {
    2
}

const fn default_model_loading_wait() -> u64 {
    5
}

/// Visual strategy configuration, the `visual` section of `sahayak.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisualConfig {
    /// Text-to-image API key. Absent or placeholder values disable generation.
    #[serde(default, skip_serializing)]
    pub stability_api_key: Option<String>,

    /// Text-to-image endpoint.
    #[serde(default = "default_stability_url")]
    pub stability_url: String,

    /// Base URL of the keyword stock photo service.
    #[serde(default = "default_stock_photo_base")]
    pub stock_photo_base: String,

    /// Base URL of the placeholder image service.
    #[serde(default = "default_placeholder_base")]
    pub placeholder_base: String,

    /// Directory generated images are written to.
    #[serde(default = "default_upload_dir")]
    pub upload_dir: String,

    /// Public path prefix under which `upload_dir` is served.
    #[serde(default = "default_public_prefix")]
    pub public_prefix: String,

    /// Timeout for one generation request, in seconds.
    #[serde(default = "default_generation_timeout")]
    pub generation_timeout_secs: u64,

    /// Timeout for the stock photo existence check, in seconds.
    #[serde(default = "default_stock_timeout")]
    pub stock_timeout_secs: u64,

    /// Extra attempts made while the generation model reports it is loading.
    #[serde(default = "default_model_loading_retries")]
    pub model_loading_retries: u32,

    /// Wait between model-loading retries, in seconds.
    #[serde(default = "default_model_loading_wait")]
    pub model_loading_wait_secs: u64,
}

impl Default for VisualConfig {
    fn default() -> Self {
        Self {
            stability_api_key: None,
            stability_url: default_stability_url(),
            stock_photo_base: default_stock_photo_base(),
            placeholder_base: default_placeholder_base(),
            upload_dir: default_upload_dir(),
            public_prefix: default_public_prefix(),
            generation_timeout_secs: default_generation_timeout(),
            stock_timeout_secs: default_stock_timeout(),
            model_loading_retries: default_model_loading_retries(),
            model_loading_wait_secs: default_model_loading_wait(),
        }
    }
}

impl VisualConfig {
    /// Returns the generation key if it is set to a real value.
    ///
    /// Empty keys and template values such as `your-stability-ai-api-key-here`
    /// count as absent.
    #[must_use]
    pub fn stability_key(&self) -> Option<&str> {
        self.stability_api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty() && !(key.starts_with("your-") && key.ends_with("-here")))
    }

    /// Generation request timeout.
    #[must_use]
    pub const fn generation_timeout(&self) -> Duration {
        Duration::from_secs(self.generation_timeout_secs)
    }

    /// Stock photo existence check timeout.
    #[must_use]
    pub const fn stock_timeout(&self) -> Duration {
        Duration::from_secs(self.stock_timeout_secs)
    }

    /// Wait between model-loading retries.
    #[must_use]
    pub const fn model_loading_wait(&self) -> Duration {
        Duration::from_secs(self.model_loading_wait_secs)
    }
}
