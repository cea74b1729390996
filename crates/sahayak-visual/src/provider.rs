//! The strategy chain.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::generation::StabilityGenerator;
use crate::placeholder::PlaceholderBuilder;
use crate::stock::StockPhotoSearch;
use crate::{Result, VisualConfig, VisualRequest, VisualResult, VisualStrategy};

/// One way of obtaining an image URL.
#[async_trait]
pub trait ImageSource: Send + Sync + std::fmt::Debug {
    /// Strategy reported when this source succeeds.
    fn strategy(&self) -> VisualStrategy;

    /// Whether the source has what it needs to be attempted.
    fn is_configured(&self) -> bool {
        true
    }

    /// Attempts to produce a URL.
    ///
    /// `Ok(None)` means the source declined without trying, for example
    /// because it has no credentials.
    async fn fetch(&self, request: &VisualRequest) -> Result<Option<String>>;
}

/// Whether a strategy is ready to be attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyStatus {
    /// The strategy.
    pub strategy: VisualStrategy,
    /// `true` if it will be attempted.
    pub configured: bool,
}

/// Walks image sources in rank order, ending at the placeholder.
#[derive(Debug, Clone)]
pub struct VisualProvider {
    sources: Vec<Arc<dyn ImageSource>>,
    placeholder: PlaceholderBuilder,
}

impl VisualProvider {
    /// Generation, then stock photo, then placeholder.
    #[must_use]
    pub fn from_config(config: &VisualConfig, client: Client) -> Self {
        let sources: Vec<Arc<dyn ImageSource>> = vec![
            Arc::new(StabilityGenerator::new(client.clone(), config)),
            Arc::new(StockPhotoSearch::new(client, config)),
        ];
        Self::with_sources(sources, PlaceholderBuilder::new(&config.placeholder_base))
    }

    /// Uses custom sources ahead of the placeholder.
    #[must_use]
    pub fn with_sources(sources: Vec<Arc<dyn ImageSource>>, placeholder: PlaceholderBuilder) -> Self {
        Self {
            sources,
            placeholder,
        }
    }

    /// Returns a visual for `request`. Never fails.
    ///
    /// Source errors are logged and the next source is tried; the placeholder
    /// is used when no source yields a URL.
    #[instrument(skip(self, request), fields(prompt = %request.prompt, style = %request.style))]
    pub async fn create_visual(&self, request: &VisualRequest) -> VisualResult {
        for source in &self.sources {
            let strategy = source.strategy();
            if !source.is_configured() {
                continue;
            }
            match source.fetch(request).await {
                Ok(Some(url)) => {
                    info!(strategy = %strategy, url = %url, "Visual created");
                    return VisualResult {
                        url,
                        strategy_used: strategy,
                    };
                }
                Ok(None) => {}
                Err(e) => {
                    warn!(strategy = %strategy, error = %e, transient = e.is_transient(), "Visual strategy failed");
                }
            }
        }

        let url = self.placeholder.build(request);
        info!(url = %url, "Using placeholder visual");
        VisualResult {
            url,
            strategy_used: VisualStrategy::Placeholder,
        }
    }

    /// Readiness of every strategy, placeholder last.
    #[must_use]
    pub fn strategies(&self) -> Vec<StrategyStatus> {
        self.sources
            .iter()
            .map(|source| StrategyStatus {
                strategy: source.strategy(),
                configured: source.is_configured(),
            })
            .chain(std::iter::once(StrategyStatus {
                strategy: VisualStrategy::Placeholder,
                configured: true,
            }))
            .collect()
    }
}
