//! Keyword stock photos.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tracing::{debug, instrument};

use crate::provider::ImageSource;
use crate::{Result, VisualConfig, VisualError, VisualRequest, VisualStrategy};

/// Most keywords placed in a stock query.
const MAX_QUERY_TERMS: usize = 5;

/// Prompt words appended after the subject terms.
const PROMPT_TERMS: usize = 3;

/// Builds the `+`-joined keyword query for `request`.
///
/// Subject search terms come first, followed by up to three prompt words with
/// non-alphanumeric characters removed.
///
/// ```
/// use sahayak_visual::{stock::stock_query, VisualRequest};
///
/// let query = stock_query(&VisualRequest::new("solar system!", "diagram", "history"));
/// assert_eq!(query, "education+learning+school+solar+system");
/// ```
#[must_use]
pub fn stock_query(request: &VisualRequest) -> String {
    let subject_terms = request
        .subject_theme()
        .stock_terms()
        .iter()
        .map(|term| (*term).to_string());
    let prompt_terms = request
        .prompt
        .split_whitespace()
        .map(|word| {
            word.chars()
                .filter(|c| c.is_alphanumeric())
                .collect::<String>()
                .to_lowercase()
        })
        .filter(|word| !word.is_empty())
        .take(PROMPT_TERMS);

    subject_terms
        .chain(prompt_terms)
        .take(MAX_QUERY_TERMS)
        .collect::<Vec<_>>()
        .join("+")
}

/// Stock photo strategy: builds a keyword URL and checks that it resolves.
#[derive(Debug, Clone)]
pub struct StockPhotoSearch {
    client: Client,
    base: String,
    timeout: Duration,
}

impl StockPhotoSearch {
    /// Creates a search against the configured stock photo service.
    #[must_use]
    pub fn new(client: Client, config: &VisualConfig) -> Self {
        Self {
            client,
            base: config.stock_photo_base.trim_end_matches('/').to_string(),
            timeout: config.stock_timeout(),
        }
    }

    /// Candidate URL for `request`.
    #[must_use]
    pub fn url_for(&self, request: &VisualRequest) -> String {
        format!("{}/800x600/?{}", self.base, stock_query(request))
    }
}

#[async_trait]
impl ImageSource for StockPhotoSearch {
    fn strategy(&self) -> VisualStrategy {
        VisualStrategy::StockPhoto
    }

    #[instrument(skip(self, request), fields(subject = %request.subject))]
    async fn fetch(&self, request: &VisualRequest) -> Result<Option<String>> {
        let url = self.url_for(request);
        let status = self
            .client
            .head(&url)
            .timeout(self.timeout)
            .send()
            .await?
            .status();

        if status == StatusCode::OK {
            debug!(url = %url, "Stock photo reachable");
            Ok(Some(url))
        } else {
            Err(VisualError::Unreachable {
                url,
                status: status.as_u16(),
            })
        }
    }
}
