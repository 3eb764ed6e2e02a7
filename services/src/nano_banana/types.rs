use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerateRequest {
    #[serde(default)]
    pub user_photo: Option<String>,
    #[serde(default)]
    pub top_image: Option<String>,
    #[serde(default)]
    pub bottom_image: Option<String>,
    #[serde(default)]
    pub prompt: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub generated_image_url: String,
    /// Total token count reported by the provider; kept under its historical name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processing_time: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SuggestRequest {
    #[serde(default)]
    pub prompt: String,
    #[serde(default)]
    pub available_tags: Vec<String>,
    #[serde(default)]
    pub available_items: AvailableItems,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AvailableItems {
    #[serde(default)]
    pub tops: Vec<CandidateItem>,
    #[serde(default)]
    pub bottoms: Vec<CandidateItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateItem {
    pub id: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestResponse {
    pub suggested_top_id: String,
    pub suggested_bottom_id: String,
    pub reasoning: String,
}
