//! Rows stored by the data service, and the shapes used to create them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClothingType {
    Top,
    Bottom,
}

impl ClothingType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Top => "top",
            Self::Bottom => "bottom",
        }
    }
}

impl Display for ClothingType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ClothingType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "top" => Ok(Self::Top),
            "bottom" => Ok(Self::Bottom),
            other => Err(format!("unknown clothing type: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClothingItem {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(rename = "type")]
    pub clothing_type: ClothingType,
    pub image_url: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewClothingItem {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(rename = "type")]
    pub clothing_type: ClothingType,
    pub image_url: String,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedOutfit {
    pub id: Uuid,
    pub user_id: Uuid,
    pub top_id: Option<Uuid>,
    pub bottom_id: Option<Uuid>,
    #[serde(default)]
    pub rating: Option<u8>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewSavedOutfit {
    pub user_id: Uuid,
    pub top_id: Option<Uuid>,
    pub bottom_id: Option<Uuid>,
    pub rating: Option<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedPhoto {
    pub id: Uuid,
    pub user_id: Uuid,
    pub outfit_id: Uuid,
    pub image_url: String,
    #[serde(default)]
    pub prompt_used: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewGeneratedPhoto {
    pub id: Uuid,
    pub user_id: Uuid,
    pub outfit_id: Uuid,
    pub image_url: String,
    pub prompt_used: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPhoto {
    pub id: Uuid,
    pub user_id: Uuid,
    pub image_url: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPreferences {
    pub user_id: Uuid,
    pub last_viewed_top_id: Option<Uuid>,
    pub last_viewed_bottom_id: Option<Uuid>,
    pub updated_at: DateTime<Utc>,
}

/// Upsert body for `user_preferences`; both ids are always written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreferencesUpdate {
    pub user_id: Uuid,
    pub last_viewed_top_id: Option<Uuid>,
    pub last_viewed_bottom_id: Option<Uuid>,
    pub updated_at: DateTime<Utc>,
}

/// An outfit with its garments and composites resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedOutfitWithItems {
    pub outfit: SavedOutfit,
    pub top: Option<ClothingItem>,
    pub bottom: Option<ClothingItem>,
    /// Newest first.
    pub generated_photos: Vec<GeneratedPhoto>,
}

impl SavedOutfitWithItems {
    pub fn latest_photo(&self) -> Option<&GeneratedPhoto> {
        self.generated_photos.first()
    }
}

pub const MIN_RATING: u8 = 1;
pub const MAX_RATING: u8 = 5;

pub fn is_valid_rating(rating: Option<u8>) -> bool {
    rating.is_none_or(|r| (MIN_RATING..=MAX_RATING).contains(&r))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn clothing_item_reads_type_column() {
        let item: ClothingItem = serde_json::from_value(json!({
            "id": "00000000-0000-0000-0000-000000000001",
            "user_id": "00000000-0000-0000-0000-0000000000aa",
            "type": "bottom",
            "image_url": "https://x/a.jpg",
            "tags": ["denim"],
            "created_at": "2025-01-01T00:00:00Z",
            "updated_at": "2025-01-01T00:00:00+00:00"
        }))
        .expect("row deserializes");

        assert_eq!(item.clothing_type, ClothingType::Bottom);
        assert_eq!(item.tags, vec!["denim".to_owned()]);
    }

    #[test]
    fn clothing_type_parses_loosely() {
        assert_eq!("Top".parse::<ClothingType>(), Ok(ClothingType::Top));
        assert_eq!(" bottom ".parse::<ClothingType>(), Ok(ClothingType::Bottom));
        assert!("shoes".parse::<ClothingType>().is_err());
    }

    #[test]
    fn ratings_are_one_to_five_or_absent() {
        assert!(is_valid_rating(None));
        assert!(is_valid_rating(Some(1)));
        assert!(is_valid_rating(Some(5)));
        assert!(!is_valid_rating(Some(0)));
        assert!(!is_valid_rating(Some(6)));
    }
}
