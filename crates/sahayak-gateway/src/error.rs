//! Error types for the Sahayak gateway.
//!
//! Provider failures are classified with [`ProviderErrorKind`] so operators get
//! actionable log lines, while callers only ever see localized, user-safe text.

use std::path::PathBuf;

/// A specialized `Result` type for gateway operations.
pub type Result<T> = std::result::Result<T, GatewayError>;

/// Errors that can occur inside the gateway.
///
/// Most of these never reach an HTTP caller: generation providers log them and
/// degrade to fallback text. Configuration errors abort startup.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Invalid JSON syntax in the configuration file.
    #[error("Invalid JSON in config file '{path}': {message}\n\nSuggestion: Validate your sahayak.json with a JSON linter")]
    ConfigParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Description of the parse error.
        message: String,
    },

    /// Configuration validation failed.
    #[error("Invalid configuration: {message}\n\nSuggestion: {suggestion}")]
    ConfigValidationError {
        /// Description of the validation failure.
        message: String,
        /// Actionable suggestion for the user.
        suggestion: String,
    },

    // ========================================================================
    // Provider Errors
    // ========================================================================
    /// The provider is not configured or did not answer its probe.
    #[error("{provider} provider is unavailable\n\nSuggestion: {suggestion}")]
    ProviderUnavailable {
        /// Provider name ("local" or "cloud").
        provider: String,
        /// Actionable suggestion for the operator.
        suggestion: String,
    },

    /// A provider call failed and was classified.
    #[error("{provider} provider error ({kind}): {message}\n\nSuggestion: {suggestion}")]
    ProviderApiError {
        /// Provider name ("local" or "cloud").
        provider: String,
        /// Classified failure kind.
        kind: ProviderErrorKind,
        /// Detail for the logs.
        message: String,
        /// Actionable suggestion for the operator.
        suggestion: String,
    },

    // ========================================================================
    // General I/O Errors
    // ========================================================================
    /// General I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Categories of provider failures, used for operator-facing logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderErrorKind {
    /// The local model ran out of memory.
    ResourceExhausted,
    /// Cloud quota or rate limit exhausted.
    Quota,
    /// Invalid or missing credentials.
    Authentication,
    /// The call exceeded its timeout.
    Timeout,
    /// The backend answered with an error status.
    Server,
    /// Connection failure.
    Network,
    /// The backend answered with no text.
    EmptyResponse,
    /// Other unclassified errors.
    Other,
}

impl std::fmt::Display for ProviderErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ResourceExhausted => write!(f, "resource_exhausted"),
            Self::Quota => write!(f, "quota"),
            Self::Authentication => write!(f, "authentication"),
            Self::Timeout => write!(f, "timeout"),
            Self::Server => write!(f, "server"),
            Self::Network => write!(f, "network"),
            Self::EmptyResponse => write!(f, "empty_response"),
            Self::Other => write!(f, "other"),
        }
    }
}

impl ProviderErrorKind {
    /// Returns a suggestion message for this error kind.
    #[must_use]
    pub const fn suggestion(&self) -> &'static str {
        match self {
            Self::ResourceExhausted => {
                "Restart the local model server or close other applications to free memory"
            }
            Self::Quota => "Wait for the quota to reset or upgrade the API plan",
            Self::Authentication => "Check GOOGLE_AI_API_KEY or the configured credentials",
            Self::Timeout => "Retry, or use a smaller model or shorter length",
            Self::Server => "Retry later; the model service may be experiencing issues",
            Self::Network => "Check that the model service is running and reachable",
            Self::EmptyResponse => "Retry; the model returned no text",
            Self::Other => "Check the model service logs",
        }
    }

    /// Returns `true` if retrying later may succeed.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Quota | Self::Timeout | Self::Server | Self::Network | Self::EmptyResponse
        )
    }
}

impl GatewayError {
    /// Creates a new `ConfigParseError` with the given path and message.
    #[must_use]
    pub fn config_parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::ConfigParseError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a new `ConfigValidationError` with the given message and suggestion.
    #[must_use]
    pub fn config_validation(message: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Self::ConfigValidationError {
            message: message.into(),
            suggestion: suggestion.into(),
        }
    }

    /// Creates a new `ProviderUnavailable` error.
    #[must_use]
    pub fn provider_unavailable(provider: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Self::ProviderUnavailable {
            provider: provider.into(),
            suggestion: suggestion.into(),
        }
    }

    /// Creates a new `ProviderApiError` with automatic suggestion based on error kind.
    #[must_use]
    pub fn provider_api(
        provider: impl Into<String>,
        kind: ProviderErrorKind,
        message: impl Into<String>,
    ) -> Self {
        Self::ProviderApiError {
            provider: provider.into(),
            kind,
            message: message.into(),
            suggestion: kind.suggestion().to_string(),
        }
    }

    /// The classified provider failure kind, if any.
    #[must_use]
    pub const fn provider_kind(&self) -> Option<ProviderErrorKind> {
        match self {
            Self::ProviderApiError { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    /// Returns `true` if this error is transient and may be retried.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        match self {
            Self::ProviderApiError { kind, .. } => kind.is_transient(),
            _ => false,
        }
    }

    /// Returns `true` if this error should abort startup.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::ConfigParseError { .. } | Self::ConfigValidationError { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_messages() {
        let err = GatewayError::config_validation("server.port must be greater than 0", "Set server.port");
        let msg = err.to_string();
        assert!(msg.contains("server.port must be greater than 0"));
        assert!(msg.contains("Suggestion: Set server.port"));
    }

    #[test]
    fn test_provider_error_kind_display() {
        assert_eq!(ProviderErrorKind::ResourceExhausted.to_string(), "resource_exhausted");
        assert_eq!(ProviderErrorKind::EmptyResponse.to_string(), "empty_response");
        assert_eq!(ProviderErrorKind::Quota.to_string(), "quota");
    }

    #[test]
    fn test_provider_api_error_carries_suggestion() {
        let err = GatewayError::provider_api("cloud", ProviderErrorKind::Authentication, "API key not valid");
        let msg = err.to_string();
        assert!(msg.contains("cloud provider error (authentication)"));
        assert!(msg.contains("GOOGLE_AI_API_KEY"));
        assert_eq!(err.provider_kind(), Some(ProviderErrorKind::Authentication));
    }

    #[test]
    fn test_is_transient() {
        assert!(GatewayError::provider_api("cloud", ProviderErrorKind::Quota, "quota").is_transient());
        assert!(GatewayError::provider_api("local", ProviderErrorKind::Timeout, "slow").is_transient());
        assert!(
            !GatewayError::provider_api("local", ProviderErrorKind::ResourceExhausted, "oom")
                .is_transient()
        );
        assert!(!GatewayError::provider_unavailable("local", "start it").is_transient());
    }

    #[test]
    fn test_is_fatal() {
        assert!(GatewayError::config_parse("sahayak.json", "bad").is_fatal());
        assert!(!GatewayError::provider_api("cloud", ProviderErrorKind::Server, "500").is_fatal());
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: GatewayError = io_err.into();
        assert!(matches!(err, GatewayError::Io(_)));
    }
}
