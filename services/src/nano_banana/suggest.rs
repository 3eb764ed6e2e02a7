use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use serde::Deserialize;
use tracing::{info, instrument};

use super::AppState;
use super::generate::reject;
use super::prompts::{suggestion_prompt, suggestion_schema};
use super::types::{AvailableItems, CandidateItem, SuggestRequest, SuggestResponse};
use crate::error::ProxyError;
use crate::gemini::{
    GenerateContentRequest, GenerateContentResponse, GenerationConfig, GenerativeBackend,
    ModelKind, Part,
};

pub const NO_JSON: &str = "No JSON returned from model";

#[instrument(skip_all, name = "nano_banana.suggest")]
pub async fn suggest<B: GenerativeBackend>(
    State(state): State<AppState<B>>,
    payload: Result<Json<SuggestRequest>, JsonRejection>,
) -> Result<Json<SuggestResponse>, ProxyError> {
    let Json(request) = payload.map_err(|rejection| reject(&rejection))?;

    let prompt = request.prompt.trim();
    if prompt.is_empty() {
        return Err(ProxyError::bad_request("prompt is required"));
    }
    let items = &request.available_items;
    if items.tops.is_empty() || items.bottoms.is_empty() {
        return Err(ProxyError::bad_request(
            "available_items must include at least one top and one bottom",
        ));
    }

    let model_request =
        GenerateContentRequest::user(vec![Part::text(suggestion_prompt(
            prompt,
            &request.available_tags,
            items,
        ))])
        .with_generation_config(GenerationConfig {
            response_mime_type: Some("application/json".to_owned()),
            response_schema: Some(suggestion_schema()),
        });

    info!(
        tops = items.tops.len(),
        bottoms = items.bottoms.len(),
        "Requesting outfit suggestion"
    );
    let response = state
        .backend()
        .generate_content(ModelKind::Text, model_request)
        .await?;

    Ok(Json(parse_suggestion(&response, items)?))
}

#[derive(Debug, Deserialize)]
struct RawSuggestion {
    #[serde(default)]
    suggested_top_id: Option<String>,
    #[serde(default)]
    suggested_bottom_id: Option<String>,
    #[serde(default)]
    reasoning: Option<String>,
}

/// Models sometimes wrap JSON in a Markdown fence despite the MIME type.
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let inner = inner.strip_prefix("json").unwrap_or(inner);
    inner.strip_suffix("```").unwrap_or(inner).trim()
}

fn require_candidate(
    id: Option<String>,
    field: &str,
    candidates: &[CandidateItem],
) -> Result<String, ProxyError> {
    let id = id
        .map(|id| id.trim().to_owned())
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ProxyError::Model(format!("Suggestion missing {field}")))?;

    if candidates.iter().any(|candidate| candidate.id == id) {
        Ok(id)
    } else {
        Err(ProxyError::Model(format!(
            "Suggestion {field} {id} is not one of the available items"
        )))
    }
}

/// Parses the model's JSON and checks both ids against the candidates.
pub fn parse_suggestion(
    response: &GenerateContentResponse,
    items: &AvailableItems,
) -> Result<SuggestResponse, ProxyError> {
    let text: String = response
        .first_candidate_parts()
        .iter()
        .filter_map(|part| part.text.as_deref())
        .collect();
    let text = strip_code_fence(&text);
    if text.is_empty() {
        return Err(ProxyError::Model(NO_JSON.to_owned()));
    }

    let raw: RawSuggestion = serde_json::from_str(text)
        .map_err(|err| ProxyError::Model(format!("Model returned invalid JSON: {err}")))?;

    Ok(SuggestResponse {
        suggested_top_id: require_candidate(raw.suggested_top_id, "suggested_top_id", &items.tops)?,
        suggested_bottom_id: require_candidate(
            raw.suggested_bottom_id,
            "suggested_bottom_id",
            &items.bottoms,
        )?,
        reasoning: raw.reasoning.unwrap_or_default(),
    })
}
