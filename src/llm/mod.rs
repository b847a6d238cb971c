//! LLM integration for the analytics agent.
//!
//! Supports:
//! - **Gemini**: the public `generateContent` REST API via `reqwest`
//!
//! Callers depend only on the `LlmProvider` trait, so tests can swap in a
//! scripted provider.

pub mod gemini;
pub mod provider;

pub use gemini::GeminiProvider;
pub use provider::*;

use std::sync::Arc;

use crate::config::AppConfig;

/// Create the configured provider, or `None` when no API key is set.
pub fn create_provider(config: &AppConfig) -> Option<Arc<dyn LlmProvider>> {
    let Some(ref api_key) = config.gemini_api_key else {
        tracing::warn!("GEMINI_API_KEY not set; analytics queries are disabled");
        return None;
    };
    tracing::info!("Using Gemini (model: {})", config.model);
    Some(Arc::new(GeminiProvider::new(
        api_key.clone(),
        config.model.clone(),
    )))
}
