//! Configuration types for the Sahayak gateway.
//!
//! Configuration is read from `sahayak.json` (camelCase keys, every field
//! optional) and then overlaid with API keys and the local model URL from the
//! environment.

use std::path::Path;
use std::time::Duration;

use sahayak_visual::VisualConfig;
use serde::{Deserialize, Serialize};

use crate::error::{GatewayError, Result};

/// The default config file name.
const CONFIG_FILE_NAME: &str = "sahayak.json";

/// Environment variable holding the cloud model API key.
pub const CLOUD_API_KEY_ENV: &str = "GOOGLE_AI_API_KEY";

/// Environment variable holding the image generation API key.
pub const STABILITY_API_KEY_ENV: &str = "STABILITY_API_KEY";

/// Environment variable overriding the local model server URL.
pub const LOCAL_BASE_URL_ENV: &str = "OLLAMA_BASE_URL";

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    8000
}

fn default_static_dir() -> String {
    "uploads".to_string()
}

fn default_local_base_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_preferred_model() -> String {
    "llama3:8b".to_string()
}

fn default_fallback_models() -> Vec<String> {
    ["llama3:latest", "llama3.1", "llama3", "llama"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_vision_model() -> String {
    "llava-phi3:latest".to_string()
}

const fn default_probe_timeout() -> u64 {
    5
}

const fn default_generation_timeout() -> u64 {
    60
}

const fn default_vision_timeout() -> u64 {
    120
}

const fn default_local_temperature() -> f64 {
    0.7
}

const fn default_local_top_p() -> f64 {
    0.9
}

const fn default_num_predict() -> u32 {
    500
}

fn default_cloud_model() -> String {
    "gemini-1.5-flash".to_string()
}

fn default_cloud_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

const fn default_cloud_temperature() -> f64 {
    0.3
}

const fn default_cloud_top_p() -> f64 {
    0.95
}

const fn default_top_k() -> u32 {
    40
}

const fn default_max_output_tokens() -> u32 {
    800
}

const fn default_local() -> ProviderKind {
    ProviderKind::Local
}

const fn default_cloud() -> ProviderKind {
    ProviderKind::Cloud
}

/// Returns `key` unless it is empty or a template value like `your-api-key-here`.
fn usable_key(key: Option<&str>) -> Option<&str> {
    key.map(str::trim)
        .filter(|key| !key.is_empty() && !(key.starts_with("your-") && key.ends_with("-here")))
}

/// Main configuration for the gateway.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// HTTP listener settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Locally hosted model server.
    #[serde(default)]
    pub local_model: LocalModelConfig,

    /// Cloud-hosted model.
    #[serde(default)]
    pub cloud_model: CloudModelConfig,

    /// Visual strategy chain.
    #[serde(default)]
    pub visual: VisualConfig,

    /// Which provider serves each flow.
    #[serde(default)]
    pub routing: RoutingConfig,
}

impl Config {
    /// Loads configuration from the current working directory.
    ///
    /// Looks for `sahayak.json` in the current directory. If not found,
    /// returns default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but contains invalid JSON.
    pub fn load() -> Result<Self> {
        let current_dir = std::env::current_dir().map_err(|e| {
            GatewayError::config_parse(
                "<current directory>",
                format!("cannot determine current directory: {e}"),
            )
        })?;
        Self::load_from_dir(&current_dir)
    }

    /// Loads `sahayak.json` from a specific directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but contains invalid JSON.
    pub fn load_from_dir(dir: &Path) -> Result<Self> {
        Self::load_from_file(&dir.join(CONFIG_FILE_NAME))
    }

    /// Loads configuration from a specific file path.
    ///
    /// If the file does not exist, returns default configuration.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::ConfigParseError` if the file exists but
    /// contains invalid JSON or invalid enum values.
    ///
    /// Returns `GatewayError::ConfigValidationError` if the configuration
    /// values are invalid.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let config = Self::default();
                config.validate()?;
                return Ok(config);
            }
            Err(e) => {
                return Err(GatewayError::config_parse(
                    path,
                    format!("failed to read file: {e}"),
                ));
            }
        };

        let config: Self = serde_json::from_str(&contents)
            .map_err(|e| GatewayError::config_parse(path, e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Overlays API keys and the local model URL from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_env_from(|name| std::env::var(name).ok());
    }

    /// Overlays values from `lookup`, which maps variable names to values.
    ///
    /// Empty values are ignored.
    pub fn apply_env_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let value = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        if let Some(key) = value(CLOUD_API_KEY_ENV) {
            self.cloud_model.api_key = Some(key);
        }
        if let Some(key) = value(STABILITY_API_KEY_ENV) {
            self.visual.stability_api_key = Some(key);
        }
        if let Some(url) = value(LOCAL_BASE_URL_ENV) {
            self.local_model.base_url = url;
        }
    }

    /// Validates the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::ConfigValidationError` if any validation check fails.
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(GatewayError::config_validation(
                "server.port must be greater than 0",
                "Set server.port to a free port such as 8000 in your sahayak.json",
            ));
        }

        if self.local_model.base_url.trim().is_empty() {
            return Err(GatewayError::config_validation(
                "localModel.baseUrl must not be empty",
                "Set localModel.baseUrl or OLLAMA_BASE_URL, e.g. http://localhost:11434",
            ));
        }

        if self.cloud_model.base_url.trim().is_empty() {
            return Err(GatewayError::config_validation(
                "cloudModel.baseUrl must not be empty",
                "Remove cloudModel.baseUrl from your sahayak.json to use the default endpoint",
            ));
        }

        let timeouts = [
            ("localModel.probeTimeoutSecs", self.local_model.probe_timeout_secs),
            ("localModel.timeoutSecs", self.local_model.timeout_secs),
            ("localModel.visionTimeoutSecs", self.local_model.vision_timeout_secs),
            ("cloudModel.timeoutSecs", self.cloud_model.timeout_secs),
            ("visual.generationTimeoutSecs", self.visual.generation_timeout_secs),
            ("visual.stockTimeoutSecs", self.visual.stock_timeout_secs),
        ];
        if let Some((name, _)) = timeouts.iter().find(|(_, secs)| *secs == 0) {
            return Err(GatewayError::config_validation(
                format!("{name} must be greater than 0"),
                format!("Set {name} to at least 1 second in your sahayak.json"),
            ));
        }

        let temperatures = [
            ("localModel.temperature", self.local_model.temperature),
            ("cloudModel.temperature", self.cloud_model.temperature),
        ];
        if let Some((name, value)) = temperatures
            .iter()
            .find(|(_, value)| !(0.0..=2.0).contains(value))
        {
            return Err(GatewayError::config_validation(
                format!("{name} must be between 0.0 and 2.0, got {value}"),
                format!("Set {name} to a value such as 0.7 in your sahayak.json"),
            ));
        }

        let top_ps = [
            ("localModel.topP", self.local_model.top_p),
            ("cloudModel.topP", self.cloud_model.top_p),
        ];
        if let Some((name, value)) = top_ps
            .iter()
            .find(|(_, value)| *value <= 0.0 || *value > 1.0)
        {
            return Err(GatewayError::config_validation(
                format!("{name} must be in (0.0, 1.0], got {value}"),
                format!("Set {name} to a value such as 0.9 in your sahayak.json"),
            ));
        }

        if self.local_model.num_predict == 0 || self.cloud_model.max_output_tokens == 0 {
            return Err(GatewayError::config_validation(
                "output token limits must be greater than 0",
                "Set localModel.numPredict and cloudModel.maxOutputTokens to at least 1",
            ));
        }

        Ok(())
    }
}

/// HTTP listener settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfig {
    /// Interface to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Directory served under `/uploads`.
    #[serde(default = "default_static_dir")]
    pub static_dir: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            static_dir: default_static_dir(),
        }
    }
}

/// Local model server settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalModelConfig {
    /// Base URL of the local model server.
    #[serde(default = "default_local_base_url")]
    pub base_url: String,

    /// Model used when it is installed.
    #[serde(default = "default_preferred_model")]
    pub preferred_model: String,

    /// Names tried, in order, when the preferred model is missing.
    ///
    /// A name matches an installed model exactly or as a substring.
    #[serde(default = "default_fallback_models")]
    pub fallback_models: Vec<String>,

    /// Vision-capable model for image-grounded tasks.
    #[serde(default = "default_vision_model")]
    pub vision_model: String,

    /// Model listing probe timeout, in seconds.
    #[serde(default = "default_probe_timeout")]
    pub probe_timeout_secs: u64,

    /// Text generation timeout, in seconds.
    #[serde(default = "default_generation_timeout")]
    pub timeout_secs: u64,

    /// Vision generation timeout, in seconds.
    #[serde(default = "default_vision_timeout")]
    pub vision_timeout_secs: u64,

    /// Sampling temperature.
    #[serde(default = "default_local_temperature")]
    pub temperature: f64,

    /// Nucleus sampling threshold.
    #[serde(default = "default_local_top_p")]
    pub top_p: f64,

    /// Maximum tokens generated.
    #[serde(default = "default_num_predict")]
    pub num_predict: u32,
}

impl Default for LocalModelConfig {
    fn default() -> Self {
        Self {
            base_url: default_local_base_url(),
            preferred_model: default_preferred_model(),
            fallback_models: default_fallback_models(),
            vision_model: default_vision_model(),
            probe_timeout_secs: default_probe_timeout(),
            timeout_secs: default_generation_timeout(),
            vision_timeout_secs: default_vision_timeout(),
            temperature: default_local_temperature(),
            top_p: default_local_top_p(),
            num_predict: default_num_predict(),
        }
    }
}

impl LocalModelConfig {
    /// Model listing probe timeout.
    #[must_use]
    pub const fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }

    /// Text generation timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Vision generation timeout.
    #[must_use]
    pub const fn vision_timeout(&self) -> Duration {
        Duration::from_secs(self.vision_timeout_secs)
    }
}

/// Cloud model settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloudModelConfig {
    /// API key. Absent or template values leave the provider unavailable.
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,

    /// Model identifier.
    #[serde(default = "default_cloud_model")]
    pub model: String,

    /// API base URL.
    #[serde(default = "default_cloud_base_url")]
    pub base_url: String,

    /// Request timeout, in seconds.
    #[serde(default = "default_generation_timeout")]
    pub timeout_secs: u64,

    /// Sampling temperature; kept low for factual content.
    #[serde(default = "default_cloud_temperature")]
    pub temperature: f64,

    /// Nucleus sampling threshold.
    #[serde(default = "default_cloud_top_p")]
    pub top_p: f64,

    /// Top-k sampling.
    #[serde(default = "default_top_k")]
    pub top_k: u32,

    /// Maximum tokens generated.
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,
}

impl Default for CloudModelConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_cloud_model(),
            base_url: default_cloud_base_url(),
            timeout_secs: default_generation_timeout(),
            temperature: default_cloud_temperature(),
            top_p: default_cloud_top_p(),
            top_k: default_top_k(),
            max_output_tokens: default_max_output_tokens(),
        }
    }
}

impl CloudModelConfig {
    /// Returns the API key if it is set to a real value.
    #[must_use]
    pub fn api_key(&self) -> Option<&str> {
        usable_key(self.api_key.as_deref())
    }

    /// Request timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// The two generation provider kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    /// Locally hosted model server.
    Local,
    /// Cloud-hosted model.
    Cloud,
}

impl ProviderKind {
    /// Parses a string into a `ProviderKind`, case-insensitively.
    fn from_str_case_insensitive(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "local" => Some(Self::Local),
            "cloud" => Some(Self::Cloud),
            _ => None,
        }
    }

    /// The other kind.
    #[must_use]
    pub const fn other(self) -> Self {
        match self {
            Self::Local => Self::Cloud,
            Self::Cloud => Self::Local,
        }
    }

    /// Lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Cloud => "cloud",
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ProviderKind {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::from_str_case_insensitive(&s).ok_or_else(|| {
            serde::de::Error::custom(format!(
                "invalid provider '{s}': expected one of 'local', 'cloud'"
            ))
        })
    }
}

impl Serialize for ProviderKind {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

/// Which provider kind serves each flow first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutingConfig {
    /// Local content generation.
    #[serde(default = "default_local")]
    pub content: ProviderKind,

    /// Knowledge base answers.
    #[serde(default = "default_local")]
    pub knowledge: ProviderKind,

    /// Lesson plans.
    #[serde(default = "default_cloud")]
    pub lessons: ProviderKind,

    /// Worksheets.
    #[serde(default = "default_local")]
    pub worksheets: ProviderKind,

    /// Reading feedback and reading passages.
    #[serde(default = "default_cloud")]
    pub assessment: ProviderKind,

    /// Visual descriptions.
    #[serde(default = "default_cloud")]
    pub visuals: ProviderKind,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            content: default_local(),
            knowledge: default_local(),
            lessons: default_cloud(),
            worksheets: default_local(),
            assessment: default_cloud(),
            visuals: default_cloud(),
        }
    }
}
