//! Instruction text sent to the model.

use serde::Serialize;
use serde_json::json;

use super::types::{AvailableItems, CandidateItem};

pub const TWO_GARMENTS: &str = "Place these clothing items naturally on the person in the image, maintaining realistic fit, shadows, and proportions.";
pub const ONE_GARMENT: &str = "Place this clothing item naturally on the person in the image, maintaining realistic fit, shadows, and proportions.";
pub const FALLBACK: &str = "Place this clothing naturally on the person in the image, maintaining realistic fit, shadows, and proportions";

/// Default try-on instruction for the number of garments supplied.
pub fn default_try_on_prompt(garments: usize) -> &'static str {
    match garments {
        0 => FALLBACK,
        1 => ONE_GARMENT,
        _ => TWO_GARMENTS,
    }
}

/// A candidate as the model sees it: always labelled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LabelledItem<'a> {
    pub label: String,
    pub id: &'a str,
    pub tags: &'a [String],
}

fn label_all<'a>(items: &'a [CandidateItem], prefix: &str) -> Vec<LabelledItem<'a>> {
    items
        .iter()
        .enumerate()
        .map(|(index, item)| LabelledItem {
            label: item
                .label
                .as_deref()
                .map(str::trim)
                .filter(|label| !label.is_empty())
                .map(str::to_owned)
                .unwrap_or_else(|| format!("{prefix} {}", index + 1)),
            id: &item.id,
            tags: &item.tags,
        })
        .collect()
}

pub fn label_candidates(items: &AvailableItems) -> (Vec<LabelledItem<'_>>, Vec<LabelledItem<'_>>) {
    (label_all(&items.tops, "Top"), label_all(&items.bottoms, "Bottom"))
}

/// Builds the suggestion instruction with the candidates embedded as JSON.
pub fn suggestion_prompt(prompt: &str, tags: &[String], items: &AvailableItems) -> String {
    let (tops, bottoms) = label_candidates(items);
    let candidates = json!({ "tops": tops, "bottoms": bottoms });

    format!(
        "You are a fashion advisor. Output STRICT JSON only, with keys: suggested_top_id, suggested_bottom_id, reasoning.\n\
         Choose exactly one top and one bottom from the candidates below and copy their \"id\" values verbatim.\n\
         In \"reasoning\", refer to items only by their \"label\" (for example \"Top 1\"); never mention ids.\n\
         \n\
         User request: {prompt}\n\
         Tags in use: {tags}\n\
         Candidates: {candidates}",
        tags = json!(tags),
    )
}

/// Response schema forcing the three string fields.
pub fn suggestion_schema() -> serde_json::Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "suggested_top_id": { "type": "STRING" },
            "suggested_bottom_id": { "type": "STRING" },
            "reasoning": { "type": "STRING" }
        },
        "required": ["suggested_top_id", "suggested_bottom_id", "reasoning"]
    })
}
