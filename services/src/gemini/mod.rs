//! Client for the hosted multimodal model.
//!
//! Handlers talk to [`GenerativeBackend`] so tests can swap in a scripted
//! backend without a network.

mod client;
mod types;

pub use client::GeminiClient;
pub use types::{
    ApiErrorDetail, ApiErrorEnvelope, Candidate, Content, GenerateContentRequest,
    GenerateContentResponse, GenerationConfig, InlineData, Part, PromptFeedback, UsageMetadata,
};

use std::future::Future;
use thiserror::Error;

/// Which configured model a request targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelKind {
    /// Image synthesis (try-on).
    Image,
    /// Text only (suggestions).
    Text,
}

#[derive(Debug, Error)]
pub enum GeminiError {
    #[error("GEMINI_API_KEY is not configured")]
    MissingApiKey,

    #[error("{message}")]
    Api { status: u16, message: String },

    #[error("Failed to reach model provider: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Unexpected response from model provider: {0}")]
    Decode(String),
}

pub trait GenerativeBackend: Clone + Send + Sync + 'static {
    fn generate_content(
        &self,
        model: ModelKind,
        request: GenerateContentRequest,
    ) -> impl Future<Output = Result<GenerateContentResponse, GeminiError>> + Send;
}
