use reqwest::Client;
use tracing::{debug, instrument};

use super::{
    ApiErrorEnvelope, GeminiError, GenerateContentRequest, GenerateContentResponse,
    GenerativeBackend, ModelKind,
};
use crate::config::Config;

const API_KEY_HEADER: &str = "x-goog-api-key";

/// `generateContent` over HTTPS with the key kept server-side.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    image_model: String,
    text_model: String,
}

impl GeminiClient {
    pub fn new(client: Client, config: &Config) -> Self {
        Self {
            client,
            base_url: config.gemini_base_url().to_owned(),
            api_key: config.gemini_api_key().map(str::to_owned),
            image_model: config.gemini_image_model().to_owned(),
            text_model: config.gemini_text_model().to_owned(),
        }
    }

    fn model_name(&self, model: ModelKind) -> &str {
        match model {
            ModelKind::Image => &self.image_model,
            ModelKind::Text => &self.text_model,
        }
    }

    fn endpoint(&self, model: ModelKind) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url,
            self.model_name(model)
        )
    }

    #[instrument(skip_all, fields(model = self.model_name(model)))]
    async fn send(
        &self,
        model: ModelKind,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, GeminiError> {
        let api_key = self.api_key.as_deref().ok_or(GeminiError::MissingApiKey)?;

        let response = self
            .client
            .post(self.endpoint(model))
            .header(API_KEY_HEADER, api_key)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        let body = response.bytes().await?;
        debug!(status = status.as_u16(), bytes = body.len(), "Model provider responded");

        if !status.is_success() {
            let message = serde_json::from_slice::<ApiErrorEnvelope>(&body)
                .map(|envelope| envelope.error.message)
                .ok()
                .filter(|message| !message.is_empty())
                .unwrap_or_else(|| format!("Model provider returned {status}"));
            return Err(GeminiError::Api {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_slice(&body).map_err(|err| GeminiError::Decode(err.to_string()))
    }
}

impl GenerativeBackend for GeminiClient {
    async fn generate_content(
        &self,
        model: ModelKind,
        request: GenerateContentRequest,
    ) -> Result<GenerateContentResponse, GeminiError> {
        self.send(model, &request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gemini::Part;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn posts_to_configured_model_with_key_header() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-2.5-flash:generateContent"))
            .and(header("x-goog-api-key", "test-gemini-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{"content": {"parts": [{"text": "{}"}]}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = GeminiClient::new(Client::new(), &Config::new_for_test(server.uri()));
        let response = client
            .generate_content(
                ModelKind::Text,
                GenerateContentRequest::user(vec![Part::text("hi")]),
            )
            .await
            .expect("request should succeed");

        assert_eq!(response.first_candidate_parts(), &[Part::text("{}")]);
    }

    #[tokio::test]
    async fn provider_error_message_is_surfaced() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_json(json!({
                "error": {"code": 429, "message": "Quota exceeded", "status": "RESOURCE_EXHAUSTED"}
            })))
            .mount(&server)
            .await;

        let client = GeminiClient::new(Client::new(), &Config::new_for_test(server.uri()));
        let err = client
            .generate_content(ModelKind::Image, GenerateContentRequest::user(vec![]))
            .await
            .unwrap_err();

        assert!(matches!(err, GeminiError::Api { status: 429, .. }));
        assert_eq!(err.to_string(), "Quota exceeded");
    }
}
