//! Sahayak Gateway
//!
//! Turns structured teaching requests (topic, grade, language, content type)
//! into calls to interchangeable generative backends and shapes the replies
//! for the HTTP frontend.
//!
//! - [`prompt`] builds deterministic, locale- and grade-calibrated prompts
//! - [`provider`] wraps the local and cloud models behind
//!   [`GenerationProvider`] and routes between them with [`ProviderChain`]
//! - [`fallback`] holds the localized text returned when no model answers
//! - [`api`] exposes everything over HTTP

pub mod api;
pub mod config;
pub mod error;
pub mod fallback;
pub mod prompt;
pub mod provider;
pub mod request;
pub mod speech;

pub use api::{create_router, AppState, ErrorResponse};
pub use config::{Config, ProviderKind, RoutingConfig};
pub use error::{GatewayError, ProviderErrorKind, Result};
pub use provider::{
    CloudModelProvider, GenerationProvider, LocalModelProvider, ProviderChain, ProviderState,
};
pub use request::{ContentType, GradeBand, Language, Length, RequestDescriptor};
