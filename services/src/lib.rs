//! HTTP proxy between the outfit front end and the hosted generative model.

use crate::config::Config;
use crate::error::ErrorBody;
use crate::gemini::GenerativeBackend;
use crate::nano_banana::AppState;
use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Extension, Request},
    http::{HeaderName, HeaderValue, StatusCode},
    middleware,
    response::IntoResponse,
    routing::{any, get},
};
use opentelemetry::{global, propagation::Extractor};
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_opentelemetry::OpenTelemetrySpanExt;

pub mod auth;
pub mod config;
pub mod error;
pub mod gemini;
pub mod images;
pub mod nano_banana;
pub mod telemetry;

struct HeaderExtractor<'a>(&'a axum::http::HeaderMap);

impl Extractor for HeaderExtractor<'_> {
    fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(|v| v.to_str().ok())
    }

    fn keys(&self) -> Vec<&str> {
        self.0.keys().map(|k| k.as_str()).collect()
    }
}

/// Builds the proxy router around `backend`.
pub fn routes<B: GenerativeBackend>(backend: B, config: Config) -> Router {
    let state = AppState::new(backend, reqwest::Client::new());

    let api = nano_banana::routes::<B>().route_layer(middleware::from_fn_with_state(
        config.proxy_auth().clone(),
        auth::require_proxy_auth,
    ));

    Router::new()
        .route("/health", get(health_check))
        .nest("/api/nano-banana", api)
        .fallback(any(catch_all))
        .layer(DefaultBodyLimit::max(config.body_limit_bytes()))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<_>| {
                let parent_context = global::get_text_map_propagator(|propagator| {
                    propagator.extract(&HeaderExtractor(request.headers()))
                });

                let span = tracing::info_span!(
                    "http_request",
                    http_request.method = ?request.method(),
                    http_request.uri = ?request.uri(),
                    http_request.version = ?request.version(),
                    http_request.user_agent = ?request.headers().get(axum::http::header::USER_AGENT),
                );

                span.set_parent(parent_context);

                span
            }),
        )
        .layer(Extension(config))
        .with_state(state)
}

async fn health_check(Extension(config): Extension<Config>) -> impl IntoResponse {
    let mut response = (StatusCode::OK, Json(json!({ "status": "ok" }))).into_response();

    if let Ok(env_value) = HeaderValue::from_str(&config.environment().to_string()) {
        response
            .headers_mut()
            .insert(HeaderName::from_static("x-service-env"), env_value);
    }
    response.headers_mut().insert(
        HeaderName::from_static("x-service-version"),
        HeaderValue::from_static(env!("CARGO_PKG_VERSION")),
    );

    response
}

async fn catch_all() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Json(ErrorBody::new("not found")))
}
