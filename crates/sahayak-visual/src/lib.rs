//! Sahayak Visual Aids
//!
//! Produces an image for an educational prompt by walking a ranked list of
//! strategies until one yields a URL:
//!
//! 1. [`generation::StabilityGenerator`] - text-to-image generation, persisted
//!    through an [`store::ImageStore`]
//! 2. [`stock::StockPhotoSearch`] - keyword stock photo, checked for
//!    reachability
//! 3. [`placeholder::PlaceholderBuilder`] - deterministic placeholder URL,
//!    the terminal fallback
//!
//! [`VisualProvider::create_visual`] never fails.

pub mod config;
pub mod generation;
pub mod placeholder;
mod provider;
pub mod stock;
pub mod store;

pub use config::VisualConfig;
pub use provider::{ImageSource, StrategyStatus, VisualProvider};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised by individual visual strategies.
///
/// These never escape [`VisualProvider::create_visual`]; they are logged and
/// the next strategy is tried.
#[derive(Debug, Error)]
pub enum VisualError {
    /// The image generation API rejected the key.
    #[error("image generation authentication failed\n\nSuggestion: Check STABILITY_API_KEY")]
    Unauthorized,

    /// The image generation account has no credits left.
    #[error("image generation account has insufficient credits\n\nSuggestion: Top up the account or unset STABILITY_API_KEY to skip generation")]
    InsufficientCredits,

    /// The model was still loading after every retry.
    #[error("image model still loading after {attempts} attempts")]
    ModelLoading {
        /// Number of requests made.
        attempts: u32,
    },

    /// The API answered with an unexpected status.
    #[error("image API returned HTTP {status}: {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body excerpt.
        message: String,
    },

    /// A successful generation response carried no image.
    #[error("image generation response contained no artifacts")]
    NoArtifacts,

    /// A candidate URL did not answer with 200.
    #[error("image URL '{url}' is not reachable (HTTP {status})")]
    Unreachable {
        /// URL that was checked.
        url: String,
        /// Status returned by the existence check.
        status: u16,
    },

    /// A constructed URL failed to parse.
    #[error("invalid image URL '{url}': {message}")]
    InvalidUrl {
        /// The offending URL.
        url: String,
        /// Parser message.
        message: String,
    },

    /// Transport failure talking to an image service.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The returned raster was not valid base64.
    #[error("invalid image encoding: {0}")]
    Decode(#[from] base64::DecodeError),

    /// Writing the image to disk failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl VisualError {
    /// Returns `true` if retrying later may succeed.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::ModelLoading { .. } | Self::Http(_) | Self::Unreachable { .. }
        )
    }
}

/// Result type for visual strategy operations.
pub type Result<T> = std::result::Result<T, VisualError>;

/// Which strategy produced a visual.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum VisualStrategy {
    /// Generated by the text-to-image API and stored locally.
    Generated,
    /// Externally hosted stock photo.
    StockPhoto,
    /// Computed placeholder image URL.
    Placeholder,
}

impl std::fmt::Display for VisualStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Generated => write!(f, "generated"),
            Self::StockPhoto => write!(f, "stock_photo"),
            Self::Placeholder => write!(f, "placeholder"),
        }
    }
}

/// The visual handed back to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisualResult {
    /// Public URL or local reference path of the image.
    pub url: String,
    /// Strategy that produced `url`.
    pub strategy_used: VisualStrategy,
}

/// What to draw.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisualRequest {
    /// Free-text prompt from the teacher.
    pub prompt: String,
    /// Requested style name, e.g. `"diagram"`.
    pub style: String,
    /// Subject name, e.g. `"science"`.
    pub subject: String,
    /// Optional illustrator-ready description, used as the generation base.
    pub description: Option<String>,
}

impl VisualRequest {
    /// Creates a request without a description.
    #[must_use]
    pub fn new(
        prompt: impl Into<String>,
        style: impl Into<String>,
        subject: impl Into<String>,
    ) -> Self {
        Self {
            prompt: prompt.into(),
            style: style.into(),
            subject: subject.into(),
            description: None,
        }
    }

    /// Attaches a description, ignoring blank text.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        let description = description.into();
        if !description.trim().is_empty() {
            self.description = Some(description);
        }
        self
    }

    /// The recognized style, if any.
    #[must_use]
    pub fn visual_style(&self) -> Option<VisualStyle> {
        VisualStyle::from_name(&self.style)
    }

    /// The subject theme, defaulting to [`SubjectTheme::General`].
    #[must_use]
    pub fn subject_theme(&self) -> SubjectTheme {
        SubjectTheme::from_name(&self.subject)
    }
}

/// Styles with dedicated palettes and descriptions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisualStyle {
    /// Colorful illustration (default palette).
    Illustration,
    /// Labelled diagram.
    Diagram,
    /// Child-friendly cartoon.
    Cartoon,
    /// Photograph-like rendering.
    Realistic,
}

impl VisualStyle {
    /// Parses a style name case-insensitively.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "illustration" => Some(Self::Illustration),
            "diagram" => Some(Self::Diagram),
            "cartoon" => Some(Self::Cartoon),
            "realistic" => Some(Self::Realistic),
            _ => None,
        }
    }

    /// Background hex, foreground hex and emoji for placeholders.
    #[must_use]
    pub const fn palette(self) -> (&'static str, &'static str, &'static str) {
        match self {
            Self::Illustration => ("E3F2FD", "1565C0", "🎨"),
            Self::Diagram => ("F3E5F5", "7B1FA2", "📊"),
            Self::Cartoon => ("FFF3E0", "F57C00", "🎭"),
            Self::Realistic => ("E8F5E8", "388E3C", "📷"),
        }
    }

    /// Opening line of the description request sent to a text model.
    #[must_use]
    pub const fn description_lead(self) -> &'static str {
        match self {
            Self::Illustration => {
                "Create a detailed description for a colorful educational illustration"
            }
            Self::Diagram => "Create a detailed description for a clear educational diagram with labels",
            Self::Cartoon => {
                "Create a detailed description for a child-friendly cartoon-style educational visual"
            }
            Self::Realistic => {
                "Create a detailed description for a realistic educational photograph or illustration"
            }
        }
    }
}

/// Subject families with their own emoji, theme and search terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubjectTheme {
    /// Science.
    Science,
    /// Mathematics.
    Mathematics,
    /// Social studies.
    SocialStudies,
    /// Language and literature.
    Language,
    /// Geography.
    Geography,
    /// History.
    History,
    /// Anything else.
    General,
}

impl SubjectTheme {
    /// Parses a subject name case-insensitively; unknown names are `General`.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_lowercase().replace([' ', '-'], "_").as_str() {
            "science" => Self::Science,
            "mathematics" | "math" | "maths" => Self::Mathematics,
            "social_studies" => Self::SocialStudies,
            "language" => Self::Language,
            "geography" => Self::Geography,
            "history" => Self::History,
            _ => Self::General,
        }
    }

    /// Emoji and theme word shown on placeholders.
    #[must_use]
    pub const fn badge(self) -> (&'static str, &'static str) {
        match self {
            Self::Science => ("🔬", "Scientific"),
            Self::Mathematics => ("🔢", "Mathematical"),
            Self::SocialStudies => ("🌍", "Cultural"),
            Self::Language => ("📚", "Literary"),
            Self::Geography => ("🗺️", "Geographic"),
            Self::History => ("🏛️", "Historical"),
            Self::General => ("🎓", "Educational"),
        }
    }

    /// Keywords seeding the stock photo query.
    #[must_use]
    pub const fn stock_terms(self) -> &'static [&'static str] {
        match self {
            Self::Science => &["science", "education", "learning", "student"],
            Self::Mathematics => &["math", "numbers", "education", "learning"],
            Self::SocialStudies => &["history", "geography", "culture", "education"],
            Self::Language => &["books", "reading", "writing", "education"],
            Self::Geography | Self::History | Self::General => &["education", "learning", "school"],
        }
    }

    /// Emphasis requested from the description model.
    #[must_use]
    pub const fn description_context(self) -> &'static str {
        match self {
            Self::Science => "focusing on scientific accuracy and clear explanation of concepts",
            Self::Mathematics => {
                "emphasizing mathematical concepts, numbers, and geometric relationships"
            }
            Self::SocialStudies => {
                "highlighting cultural, historical, or social elements appropriately"
            }
            Self::Language => "incorporating text, writing, reading, or language learning elements",
            Self::Geography => {
                "showing geographical features, maps, or location-based information"
            }
            Self::History => "depicting historical accuracy and age-appropriate historical context",
            Self::General => "with general educational value",
        }
    }
}

/// Upper-cases the first letter of every alphabetic run.
///
/// ```
/// assert_eq!(sahayak_visual::title_case("social_studies"), "Social_Studies");
/// ```
#[must_use]
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut at_word_start = true;
    for ch in text.chars() {
        if ch.is_alphabetic() {
            if at_word_start {
                out.extend(ch.to_uppercase());
            } else {
                out.extend(ch.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(ch);
            at_word_start = true;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strategy_serializes_camel_case() {
        let json = serde_json::to_string(&VisualStrategy::StockPhoto).unwrap_or_default();
        assert_eq!(json, r#""stockPhoto""#);
    }

    #[test]
    fn strategy_display() {
        assert_eq!(VisualStrategy::Generated.to_string(), "generated");
        assert_eq!(VisualStrategy::Placeholder.to_string(), "placeholder");
    }

    #[test]
    fn style_lookup_is_case_insensitive() {
        assert_eq!(VisualStyle::from_name("Diagram"), Some(VisualStyle::Diagram));
        assert_eq!(VisualStyle::from_name("watercolor"), None);
    }

    #[test]
    fn subject_lookup_normalizes_names() {
        assert_eq!(SubjectTheme::from_name("Social Studies"), SubjectTheme::SocialStudies);
        assert_eq!(SubjectTheme::from_name("maths"), SubjectTheme::Mathematics);
        assert_eq!(SubjectTheme::from_name("art"), SubjectTheme::General);
    }

    #[test]
    fn blank_description_is_ignored() {
        let request = VisualRequest::new("plants", "diagram", "science").with_description("  ");
        assert!(request.description.is_none());
    }

    #[test]
    fn title_case_handles_separators() {
        assert_eq!(title_case("illustration"), "Illustration");
        assert_eq!(title_case("two words"), "Two Words");
        assert_eq!(title_case(""), "");
    }

    #[test]
    fn transient_errors() {
        assert!(VisualError::ModelLoading { attempts: 3 }.is_transient());
        assert!(!VisualError::Unauthorized.is_transient());
        assert!(!VisualError::InsufficientCredits.is_transient());
    }
}
