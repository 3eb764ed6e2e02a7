//! The try-on and suggestion endpoints under `/api/nano-banana`.

mod generate;
mod prompts;
mod suggest;
mod types;

pub use generate::{NO_IMAGE_DATA, extract_image, generate};
pub use prompts::{default_try_on_prompt, suggestion_prompt};
pub use suggest::{NO_JSON, parse_suggestion, suggest};
pub use types::{
    AvailableItems, CandidateItem, GenerateRequest, GenerateResponse, SuggestRequest,
    SuggestResponse,
};

use axum::{Router, routing::post};
use std::sync::Arc;

use crate::gemini::GenerativeBackend;

/// Shared handler state: the model backend plus the client used to fetch images.
#[derive(Clone)]
pub struct AppState<B> {
    inner: Arc<Inner<B>>,
}

struct Inner<B> {
    backend: B,
    http: reqwest::Client,
}

impl<B: GenerativeBackend> AppState<B> {
    pub fn new(backend: B, http: reqwest::Client) -> Self {
        Self {
            inner: Arc::new(Inner { backend, http }),
        }
    }

    pub fn backend(&self) -> &B {
        &self.inner.backend
    }

    pub fn http(&self) -> &reqwest::Client {
        &self.inner.http
    }
}

pub fn routes<B: GenerativeBackend>() -> Router<AppState<B>> {
    Router::new()
        .route("/generate", post(generate::<B>))
        .route("/suggest", post(suggest::<B>))
}
