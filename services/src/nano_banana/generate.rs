use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use tracing::{info, instrument};

use super::AppState;
use super::prompts::default_try_on_prompt;
use super::types::{GenerateRequest, GenerateResponse};
use crate::error::ProxyError;
use crate::gemini::{GenerateContentRequest, GenerateContentResponse, GenerativeBackend, ModelKind, Part};
use crate::images::{self, JPEG, PNG};

pub const NO_IMAGE_DATA: &str = "No image data returned from model";
const DEFAULT_OUTPUT_MIME: &str = "image/png";

/// Converts an extractor rejection into the `{error}` body.
pub(super) fn reject(rejection: &JsonRejection) -> ProxyError {
    ProxyError::InvalidRequest {
        status: rejection.status(),
        message: rejection.body_text(),
    }
}

#[instrument(skip_all, name = "nano_banana.generate")]
pub async fn generate<B: GenerativeBackend>(
    State(state): State<AppState<B>>,
    payload: Result<Json<GenerateRequest>, JsonRejection>,
) -> Result<Json<GenerateResponse>, ProxyError> {
    let Json(request) = payload.map_err(|rejection| reject(&rejection))?;

    let user_photo = request
        .user_photo
        .as_deref()
        .map(str::trim)
        .filter(|photo| !photo.is_empty())
        .ok_or(ProxyError::MissingUserPhoto)?;

    let (user, top, bottom) = tokio::try_join!(
        images::fetch_as_base64(state.http(), user_photo, JPEG),
        images::fetch_optional(state.http(), request.top_image.as_deref(), PNG),
        images::fetch_optional(state.http(), request.bottom_image.as_deref(), PNG),
    )?;

    let garments = usize::from(top.is_some()) + usize::from(bottom.is_some());
    let instruction = request
        .prompt
        .as_deref()
        .map(str::trim)
        .filter(|prompt| !prompt.is_empty())
        .unwrap_or_else(|| default_try_on_prompt(garments));

    let mut parts = vec![Part::text(instruction), user.into_part()];
    parts.extend(top.map(images::EncodedImage::into_part));
    parts.extend(bottom.map(images::EncodedImage::into_part));

    info!(garments, "Requesting try-on composite");
    let response = state
        .backend()
        .generate_content(ModelKind::Image, GenerateContentRequest::user(parts))
        .await?;

    Ok(Json(extract_image(&response)?))
}

/// Pulls the first inline image out of the first candidate.
///
/// Without one, the first text part becomes the error verbatim.
pub fn extract_image(response: &GenerateContentResponse) -> Result<GenerateResponse, ProxyError> {
    let parts = response.first_candidate_parts();

    if let Some(inline) = parts
        .iter()
        .filter_map(|part| part.inline_data.as_ref())
        .find(|inline| !inline.data.is_empty())
    {
        let mime_type = if inline.mime_type.is_empty() {
            DEFAULT_OUTPUT_MIME
        } else {
            inline.mime_type.as_str()
        };
        return Ok(GenerateResponse {
            generated_image_url: format!("data:{mime_type};base64,{}", inline.data),
            processing_time: response.total_token_count(),
        });
    }

    if let Some(text) = parts
        .iter()
        .filter_map(|part| part.text.as_deref())
        .find(|text| !text.trim().is_empty())
    {
        return Err(ProxyError::Model(text.to_owned()));
    }

    if let Some(reason) = response.block_reason() {
        return Err(ProxyError::Model(format!("Request blocked by model: {reason}")));
    }

    Err(ProxyError::Model(NO_IMAGE_DATA.to_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn response(value: serde_json::Value) -> GenerateContentResponse {
        serde_json::from_value(value).expect("fixture deserializes")
    }

    #[test]
    fn first_inline_image_wins_over_text() {
        let result = extract_image(&response(json!({
            "candidates": [{"content": {"parts": [
                {"text": "Here you go"},
                {"inlineData": {"mimeType": "image/jpeg", "data": "AAA"}},
                {"inlineData": {"mimeType": "image/png", "data": "BBB"}}
            ]}}],
            "usageMetadata": {"totalTokenCount": 42}
        })))
        .expect("image present");

        assert_eq!(result.generated_image_url, "data:image/jpeg;base64,AAA");
        assert_eq!(result.processing_time, Some(42));
    }

    #[test]
    fn missing_mime_defaults_to_png() {
        let result = extract_image(&response(json!({
            "candidates": [{"content": {"parts": [{"inlineData": {"data": "AAA"}}]}}]
        })))
        .expect("image present");

        assert_eq!(result.generated_image_url, "data:image/png;base64,AAA");
        assert_eq!(result.processing_time, None);
    }

    #[test]
    fn text_only_reply_is_the_error() {
        let err = extract_image(&response(json!({
            "candidates": [{"content": {"parts": [{"text": "I cannot edit photos of minors."}]}}]
        })))
        .unwrap_err();

        assert_eq!(err.to_string(), "I cannot edit photos of minors.");
    }

    #[test]
    fn empty_candidates_report_no_image() {
        let err = extract_image(&response(json!({"candidates": []}))).unwrap_err();
        assert_eq!(err.to_string(), NO_IMAGE_DATA);

        let err = extract_image(&response(json!({
            "candidates": [{"content": {"parts": []}, "finishReason": "SAFETY"}]
        })))
        .unwrap_err();
        assert_eq!(err.to_string(), NO_IMAGE_DATA);
    }

    #[test]
    fn blocked_prompt_names_reason() {
        let err =
            extract_image(&response(json!({"promptFeedback": {"blockReason": "SAFETY"}})))
                .unwrap_err();
        assert_eq!(err.to_string(), "Request blocked by model: SAFETY");
    }
}
