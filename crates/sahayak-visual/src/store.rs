//! Persistence for generated rasters.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::Result;

/// Writes images into a directory that is served publicly.
#[derive(Debug, Clone)]
pub struct ImageStore {
    root: PathBuf,
    public_prefix: String,
}

impl ImageStore {
    /// Creates a store rooted at `root`, served under `public_prefix`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, public_prefix: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_prefix: public_prefix.into().trim_end_matches('/').to_string(),
        }
    }

    /// Directory images are written to.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Writes `bytes` as `file_name` and returns its public path.
    ///
    /// `file_name` is sanitized so it can never leave the store directory.
    pub async fn save(&self, file_name: &str, bytes: &[u8]) -> Result<String> {
        let file_name = sanitize_file_name(file_name);
        tokio::fs::create_dir_all(&self.root).await?;
        let path = self.root.join(&file_name);
        tokio::fs::write(&path, bytes).await?;
        debug!(path = %path.display(), bytes = bytes.len(), "Stored image");
        Ok(format!("{}/{file_name}", self.public_prefix))
    }
}

/// Replaces everything except ASCII alphanumerics, `.`, `_` and `-`.
///
/// ```
/// use sahayak_visual::store::sanitize_file_name;
///
/// assert_eq!(sanitize_file_name("../a b.png"), "__a_b.png");
/// ```
#[must_use]
pub fn sanitize_file_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    cleaned.replace("..", "_")
}
