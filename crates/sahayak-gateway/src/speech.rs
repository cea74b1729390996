//! Client-side speech synthesis configuration.
//!
//! The gateway does not synthesize audio; it returns an encoded settings blob
//! that the browser feeds to its speech API.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::request::Language;

/// Settings handed to the client speech engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeechConfig {
    /// Text to speak.
    pub text: String,
    /// BCP 47 voice locale.
    pub lang: String,
    /// Speaking rate; slowed for young readers.
    pub rate: f64,
    /// Voice pitch.
    pub pitch: f64,
    /// Output volume.
    pub volume: f64,
    /// Always true: synthesis happens in the browser.
    #[serde(rename = "useWebSpeechAPI")]
    pub use_web_speech_api: bool,
}

impl SpeechConfig {
    /// Settings for `text` spoken in `language`.
    #[must_use]
    pub fn new(text: impl Into<String>, language: &Language) -> Self {
        Self {
            text: text.into(),
            lang: voice_locale(language).to_string(),
            rate: 0.8,
            pitch: 1.0,
            volume: 1.0,
            use_web_speech_api: true,
        }
    }

    /// Base64 of the JSON encoding.
    pub fn encode(&self) -> Result<String> {
        Ok(STANDARD.encode(serde_json::to_vec(self)?))
    }
}

/// Voice locale for a language. Languages without a mapped voice use `en-US`.
#[must_use]
pub const fn voice_locale(language: &Language) -> &'static str {
    match language {
        Language::Hindi => "hi-IN",
        Language::Marathi => "mr-IN",
        _ => "en-US",
    }
}

/// Encoded speech settings for `text`.
///
/// ```
/// use sahayak_gateway::{speech, Language};
///
/// let encoded = speech::speech_config("नमस्ते", &Language::Hindi).unwrap();
/// assert!(!encoded.is_empty());
/// ```
pub fn speech_config(text: &str, language: &Language) -> Result<String> {
    SpeechConfig::new(text, language).encode()
}
