//! Terminal fallback: a placeholder-service URL computed from lookup tables.

use tracing::warn;

use crate::{title_case, Result, VisualError, VisualRequest, VisualStyle};

/// Returned when even the basic placeholder URL cannot be built.
pub const MINIMAL_PLACEHOLDER_URL: &str =
    "https://via.placeholder.com/600x400/E5E7EB/374151?text=Educational+Visual";

/// Prompt characters kept in a styled placeholder label.
const STYLED_PROMPT_CHARS: usize = 40;

/// Prompt characters kept in the basic placeholder label.
const BASIC_PROMPT_CHARS: usize = 30;

/// Builds placeholder image URLs.
#[derive(Debug, Clone)]
pub struct PlaceholderBuilder {
    base: String,
}

impl PlaceholderBuilder {
    /// Creates a builder for the placeholder service at `base`.
    #[must_use]
    pub fn new(base: impl Into<String>) -> Self {
        Self {
            base: base.into().trim_end_matches('/').to_string(),
        }
    }

    /// Returns a placeholder URL for `request`. Never fails.
    ///
    /// Tries the styled URL, then the basic URL, then
    /// [`MINIMAL_PLACEHOLDER_URL`].
    #[must_use]
    pub fn build(&self, request: &VisualRequest) -> String {
        match self.styled_url(request) {
            Ok(url) => url,
            Err(styled_err) => {
                warn!(error = %styled_err, "Styled placeholder failed, using basic placeholder");
                self.basic_url(&request.prompt).unwrap_or_else(|basic_err| {
                    warn!(error = %basic_err, "Basic placeholder failed, using minimal placeholder");
                    MINIMAL_PLACEHOLDER_URL.to_string()
                })
            }
        }
    }

    /// Colors and badge chosen from style and subject.
    pub fn styled_url(&self, request: &VisualRequest) -> Result<String> {
        let (background, foreground, style_emoji) = request
            .visual_style()
            .unwrap_or(VisualStyle::Illustration)
            .palette();
        let (subject_emoji, theme) = request.subject_theme().badge();
        let style_label = if request.style.trim().is_empty() {
            "Illustration".to_string()
        } else {
            title_case(request.style.trim())
        };

        let url = format!(
            "{}/600x400/{background}/{foreground}?text={subject_emoji} {theme} {style_emoji}%0A{}%0A{}+Style",
            self.base,
            plus_encode(&request.prompt, STYLED_PROMPT_CHARS),
            plus_encode(&style_label, usize::MAX),
        );
        ensure_parses(url)
    }

    /// Neutral gray placeholder carrying only the prompt.
    pub fn basic_url(&self, prompt: &str) -> Result<String> {
        let url = format!(
            "{}/600x400/E5E7EB/374151?text=Educational+Visual%0A{}",
            self.base,
            plus_encode(prompt, BASIC_PROMPT_CHARS)
        );
        ensure_parses(url)
    }
}

/// Spaces become `+`, then the text is cut to `max_chars` characters.
fn plus_encode(text: &str, max_chars: usize) -> String {
    text.trim().replace(' ', "+").chars().take(max_chars).collect()
}

fn ensure_parses(url: String) -> Result<String> {
    match reqwest::Url::parse(&url) {
        Ok(_) => Ok(url),
        Err(e) => Err(VisualError::InvalidUrl {
            url,
            message: e.to_string(),
        }),
    }
}
