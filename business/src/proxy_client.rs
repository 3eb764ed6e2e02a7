//! Client for the generation proxy (`/generate` and `/suggest`).

use serde::{Deserialize, Serialize};
use std::future::Future;
use uuid::Uuid;

use crate::config::BusinessConfig;
use crate::http::Client;
use crate::models::ClothingItem;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProxyClientError {
    /// Non-2xx from the proxy, carrying its `{error}` message.
    #[error("{0}")]
    Upstream(String),

    #[error("Nano Banana response did not include a generated image URL")]
    MissingImage,

    #[error("Suggestion missing required clothing IDs")]
    MissingSuggestion,

    #[error("Unexpected response from generation service: {0}")]
    Malformed(String),

    #[error("Connection error: {0}")]
    Connection(String),
}

/// Image references for one try-on. Garments are optional.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TryOnRequest {
    pub user_photo_url: String,
    pub top_image_url: Option<String>,
    pub bottom_image_url: Option<String>,
    pub instruction: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TryOnResult {
    /// `data:` URL or remote http(s) URL.
    pub image_url: String,
    pub processing_time: Option<u64>,
}

/// Vibe plus the wardrobe to choose from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuggestionRequest {
    pub vibe: String,
    pub available_tags: Vec<String>,
    pub tops: Vec<SuggestionCandidate>,
    pub bottoms: Vec<SuggestionCandidate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SuggestionCandidate {
    pub id: Uuid,
    pub tags: Vec<String>,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutfitSuggestion {
    pub top_id: Uuid,
    pub bottom_id: Uuid,
    pub reasoning: String,
}

#[derive(Serialize)]
struct GenerateBody<'a> {
    user_photo: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_image: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    bottom_image: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    prompt: Option<&'a str>,
}

#[derive(Deserialize)]
struct GenerateReply {
    generated_image_url: Option<String>,
    #[serde(default)]
    processing_time: Option<u64>,
}

#[derive(Serialize)]
struct SuggestBody<'a> {
    prompt: String,
    available_tags: &'a [String],
    available_items: SuggestItems<'a>,
}

#[derive(Serialize)]
struct SuggestItems<'a> {
    tops: &'a [SuggestionCandidate],
    bottoms: &'a [SuggestionCandidate],
}

#[derive(Deserialize)]
struct SuggestReply {
    suggested_top_id: Option<String>,
    suggested_bottom_id: Option<String>,
    #[serde(default)]
    reasoning: String,
}

/// The instruction wrapped around a free-text vibe.
pub fn suggest_prompt(vibe: &str) -> String {
    format!("Based on the vibe \"{}\", suggest clothing items that match", vibe.trim())
}

impl SuggestionRequest {
    /// Labels candidates "Top 1", "Bottom 2", … in list order.
    pub fn from_wardrobe(
        vibe: impl Into<String>,
        tops: &[ClothingItem],
        bottoms: &[ClothingItem],
    ) -> Self {
        let label = |prefix: &str, items: &[ClothingItem]| -> Vec<SuggestionCandidate> {
            items
                .iter()
                .enumerate()
                .map(|(i, item)| SuggestionCandidate {
                    id: item.id,
                    tags: item.tags.clone(),
                    label: format!("{prefix} {}", i + 1),
                })
                .collect()
        };
        Self {
            vibe: vibe.into(),
            available_tags: crate::tags::all_tags(tops.iter().chain(bottoms)),
            tops: label("Top", tops),
            bottoms: label("Bottom", bottoms),
        }
    }
}

fn is_image_reference(url: &str) -> bool {
    url.starts_with("data:image/") || url.starts_with("https://") || url.starts_with("http://")
}

/// AI operations the wardrobe needs.
pub trait OutfitProxy: Clone + Send + Sync + 'static {
    fn generate_try_on(
        &self,
        request: TryOnRequest,
    ) -> impl Future<Output = Result<TryOnResult, ProxyClientError>> + Send;

    fn suggest_outfit(
        &self,
        request: SuggestionRequest,
    ) -> impl Future<Output = Result<OutfitSuggestion, ProxyClientError>> + Send;
}

#[derive(Debug, Clone)]
pub struct NanoBananaClient {
    config: BusinessConfig,
    bearer: Option<String>,
}

impl NanoBananaClient {
    /// Sends the shared proxy key when configured, else `access_token`.
    pub fn new(config: BusinessConfig, access_token: Option<String>) -> Self {
        let bearer = config.nano_banana_api_key.clone().or(access_token);
        Self { config, bearer }
    }

    async fn post<B: Serialize>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> Result<crate::http::Response, ProxyClientError> {
        let mut builder = Client::post(self.config.nano_banana_url(endpoint))
            .json(body)
            .map_err(|e| ProxyClientError::Malformed(e.to_string()))?;
        if let Some(token) = &self.bearer {
            builder = builder.bearer(token);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| ProxyClientError::Connection(e.message))?;

        if !response.is_success() {
            let message = response.error_message();
            log::error!("nano banana {endpoint} failed ({}): {message}", response.status);
            return Err(ProxyClientError::Upstream(message));
        }
        Ok(response)
    }
}

impl OutfitProxy for NanoBananaClient {
    async fn generate_try_on(&self, request: TryOnRequest) -> Result<TryOnResult, ProxyClientError> {
        let body = GenerateBody {
            user_photo: &request.user_photo_url,
            top_image: request.top_image_url.as_deref(),
            bottom_image: request.bottom_image_url.as_deref(),
            prompt: request.instruction.as_deref(),
        };
        let response = self.post("generate", &body).await?;

        let reply: GenerateReply = response.json().map_err(|e| {
            log::warn!("unrecognized generate response: {e}");
            ProxyClientError::Malformed(e.to_string())
        })?;
        let image_url = reply
            .generated_image_url
            .filter(|url| !url.is_empty())
            .ok_or(ProxyClientError::MissingImage)?;
        if !is_image_reference(&image_url) {
            log::warn!("generate response carried a non-image reference");
            return Err(ProxyClientError::Malformed(
                "generated_image_url is neither a data URL nor an http(s) URL".to_owned(),
            ));
        }

        Ok(TryOnResult {
            image_url,
            processing_time: reply.processing_time,
        })
    }

    async fn suggest_outfit(
        &self,
        request: SuggestionRequest,
    ) -> Result<OutfitSuggestion, ProxyClientError> {
        let body = SuggestBody {
            prompt: suggest_prompt(&request.vibe),
            available_tags: &request.available_tags,
            available_items: SuggestItems {
                tops: &request.tops,
                bottoms: &request.bottoms,
            },
        };
        let response = self.post("suggest", &body).await?;

        let reply: SuggestReply = response.json().map_err(|e| {
            log::warn!("unrecognized suggest response: {e}");
            ProxyClientError::Malformed(e.to_string())
        })?;
        let parse = |id: Option<String>| {
            id.and_then(|id| Uuid::parse_str(id.trim()).ok())
                .ok_or(ProxyClientError::MissingSuggestion)
        };

        Ok(OutfitSuggestion {
            top_id: parse(reply.suggested_top_id)?,
            bottom_id: parse(reply.suggested_bottom_id)?,
            reasoning: reply.reasoning,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{clothing_item, mock_config};
    use crate::models::ClothingType;
    use serde_json::json;
    use wiremock::matchers::{body_json, body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn wardrobe_candidates_are_labelled_in_order() {
        let tops = [
            clothing_item(ClothingType::Top, &["work"]),
            clothing_item(ClothingType::Top, &["casual"]),
        ];
        let bottoms = [clothing_item(ClothingType::Bottom, &["work"])];
        let request = SuggestionRequest::from_wardrobe("office", &tops, &bottoms);

        assert_eq!(request.available_tags, vec!["casual", "work"]);
        assert_eq!(request.tops[1].label, "Top 2");
        assert_eq!(request.bottoms[0].label, "Bottom 1");
    }

    #[tokio::test]
    async fn generate_uses_api_key_and_forwards_references_as_stored() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/nano-banana/generate"))
            .and(header("authorization", "Bearer proxy-key"))
            .and(body_json(json!({"user_photo": "https://x/me.jpg?t=99"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "generated_image_url": "data:image/png;base64,iVBORw0KGgo=",
                "processing_time": 1290
            })))
            .expect(1)
            .mount(&server)
            .await;

        let config = mock_config(&server).with_nano_banana_api_key("proxy-key");
        let client = NanoBananaClient::new(config, Some("user-jwt".to_owned()));
        let result = client
            .generate_try_on(TryOnRequest {
                user_photo_url: "https://x/me.jpg?t=99".to_owned(),
                ..Default::default()
            })
            .await
            .expect("generation succeeds");

        assert!(result.image_url.starts_with("data:image/"));
        assert_eq!(result.processing_time, Some(1290));
    }

    #[tokio::test]
    async fn generate_surfaces_proxy_error_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/nano-banana/generate"))
            .respond_with(
                ResponseTemplate::new(500).set_body_json(json!({"error": "I can't see a person"})),
            )
            .mount(&server)
            .await;

        let client = NanoBananaClient::new(mock_config(&server), Some("user-jwt".to_owned()));
        let err = client
            .generate_try_on(TryOnRequest {
                user_photo_url: "https://x/me.jpg".to_owned(),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert_eq!(err, ProxyClientError::Upstream("I can't see a person".to_owned()));
    }

    #[tokio::test]
    async fn generate_rejects_unrecognized_reply() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"url": "https://x/y.png"})))
            .mount(&server)
            .await;

        let client = NanoBananaClient::new(mock_config(&server), None);
        let err = client
            .generate_try_on(TryOnRequest {
                user_photo_url: "https://x/me.jpg".to_owned(),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert_eq!(err, ProxyClientError::MissingImage);
    }

    #[tokio::test]
    async fn suggest_sends_wrapped_prompt_and_parses_ids() {
        let server = MockServer::start().await;
        let top = clothing_item(ClothingType::Top, &["casual"]);
        let bottom = clothing_item(ClothingType::Bottom, &["denim"]);

        Mock::given(method("POST"))
            .and(path("/api/nano-banana/suggest"))
            .and(header("authorization", "Bearer user-jwt"))
            .and(body_partial_json(json!({
                "prompt": "Based on the vibe \"weekend\", suggest clothing items that match",
                "available_items": {"tops": [{"id": top.id, "tags": ["casual"], "label": "Top 1"}]}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "suggested_top_id": top.id,
                "suggested_bottom_id": bottom.id,
                "reasoning": "Top 1 with Bottom 1"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = NanoBananaClient::new(mock_config(&server), Some("user-jwt".to_owned()));
        let suggestion = client
            .suggest_outfit(SuggestionRequest::from_wardrobe(
                "weekend",
                std::slice::from_ref(&top),
                std::slice::from_ref(&bottom),
            ))
            .await
            .expect("suggestion succeeds");

        assert_eq!(suggestion.top_id, top.id);
        assert_eq!(suggestion.bottom_id, bottom.id);
    }

    #[tokio::test]
    async fn suggest_without_bottom_id_fails() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "suggested_top_id": Uuid::new_v4(),
                "reasoning": "only a top"
            })))
            .mount(&server)
            .await;

        let client = NanoBananaClient::new(mock_config(&server), None);
        let err = client
            .suggest_outfit(SuggestionRequest::from_wardrobe("x", &[], &[]))
            .await
            .unwrap_err();
        assert_eq!(err, ProxyClientError::MissingSuggestion);
    }
}
