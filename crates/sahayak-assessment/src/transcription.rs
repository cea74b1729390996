//! Speech-to-text seam used by the reading assessment flow.
//!
//! No production speech recognizer is wired in yet. [`CannedTranscriber`]
//! returns fixed passages keyed by language; a real backend implements
//! [`Transcriber`].

use async_trait::async_trait;
use tracing::debug;

use crate::{AssessmentError, Result};

/// Converts recorded audio into text.
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Short identifier used in logs and errors.
    fn name(&self) -> &'static str;

    /// Transcribes `audio`, using `language_hint` (a short code such as
    /// `"hi"` or `"en-US"`) to pick the recognition language.
    async fn transcribe(&self, audio: &[u8], language_hint: &str) -> Result<String>;
}

/// Returns a fixed passage per language instead of recognizing speech.
#[derive(Debug, Clone, Copy, Default)]
pub struct CannedTranscriber;

impl CannedTranscriber {
    const ENGLISH: &'static str =
        "The cat sat on the mat. It was a big cat. The cat was black and white.";
    const HINDI: &'static str = "बिल्ली चटाई पर बैठी थी। वह एक बड़ी बिल्ली थी।";
    const MARATHI: &'static str = "मांजर चटईवर बसली होती. ती एक मोठी मांजर होती.";

    /// Returns the canned passage for a language hint.
    ///
    /// Only the primary subtag is considered, so `"hi-IN"` maps to Hindi.
    /// Unknown languages fall back to English.
    #[must_use]
    pub fn passage_for(language_hint: &str) -> &'static str {
        let primary = language_hint
            .split(['-', '_'])
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();
        match primary.as_str() {
            "hi" => Self::HINDI,
            "mr" => Self::MARATHI,
            _ => Self::ENGLISH,
        }
    }
}

#[async_trait]
impl Transcriber for CannedTranscriber {
    fn name(&self) -> &'static str {
        "canned"
    }

    async fn transcribe(&self, audio: &[u8], language_hint: &str) -> Result<String> {
        if audio.is_empty() {
            return Err(AssessmentError::EmptyAudio);
        }
        debug!(
            bytes = audio.len(),
            language = %language_hint,
            "Returning canned transcription"
        );
        Ok(Self::passage_for(language_hint).to_string())
    }
}
