//! Shared fixtures for the proxy's integration tests.
//!
//! One `MockServer` plays both the model provider and the image host.

use axum_test::TestServer;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use outfits_services::{
    config::{Config, ProxyAuth},
    gemini::GeminiClient,
    routes,
};
use serde_json::{Value, json};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const USER_PHOTO_BYTES: &[u8] = b"user-photo-jpeg";
pub const TOP_BYTES: &[u8] = b"top-png";
pub const BOTTOM_BYTES: &[u8] = b"bottom-png";

#[allow(dead_code)]
pub const IMAGE_MODEL_PATH: &str = "/v1beta/models/gemini-2.5-flash-image:generateContent";
#[allow(dead_code)]
pub const TEXT_MODEL_PATH: &str = "/v1beta/models/gemini-2.5-flash:generateContent";

pub struct Harness {
    pub upstream: MockServer,
    pub server: TestServer,
}

impl Harness {
    pub async fn new() -> Self {
        Self::with_auth(ProxyAuth::Open).await
    }

    pub async fn with_auth(auth: ProxyAuth) -> Self {
        let upstream = MockServer::start().await;
        mount_images(&upstream).await;

        let config = Config::new_for_test(upstream.uri()).with_proxy_auth(auth);
        let gemini = GeminiClient::new(reqwest::Client::new(), &config);
        let server = TestServer::new(routes(gemini, config)).expect("test server starts");

        Self { upstream, server }
    }

    pub fn image_url(&self, name: &str) -> String {
        format!("{}/images/{name}", self.upstream.uri())
    }

    /// Bodies of every request the model provider received, in order.
    #[allow(dead_code)]
    pub async fn model_requests(&self) -> Vec<Value> {
        self.upstream
            .received_requests()
            .await
            .unwrap_or_default()
            .into_iter()
            .filter(|request| request.url.path().starts_with("/v1beta/"))
            .map(|request| serde_json::from_slice(&request.body).expect("model request is JSON"))
            .collect()
    }
}

async fn mount_images(server: &MockServer) {
    for (name, content_type, bytes) in [
        ("user.jpg", "image/jpeg", USER_PHOTO_BYTES),
        ("top.png", "image/png", TOP_BYTES),
        ("bottom.png", "image/png", BOTTOM_BYTES),
    ] {
        Mock::given(method("GET"))
            .and(path(format!("/images/{name}")))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", content_type)
                    .set_body_bytes(bytes.to_vec()),
            )
            .mount(server)
            .await;
    }
}

/// Mounts a model reply for `model_path`.
#[allow(dead_code)]
pub async fn mount_model_reply(server: &MockServer, model_path: &str, body: Value) {
    Mock::given(method("POST"))
        .and(path(model_path))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

#[allow(dead_code)]
pub fn image_reply(mime_type: &str, bytes: &[u8]) -> Value {
    json!({
        "candidates": [{
            "content": {"role": "model", "parts": [
                {"inlineData": {"mimeType": mime_type, "data": STANDARD.encode(bytes)}}
            ]},
            "finishReason": "STOP"
        }],
        "usageMetadata": {"totalTokenCount": 1290}
    })
}

#[allow(dead_code)]
pub fn text_reply(text: &str) -> Value {
    json!({
        "candidates": [{"content": {"role": "model", "parts": [{"text": text}]}}]
    })
}

#[allow(dead_code)]
pub fn b64(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}
