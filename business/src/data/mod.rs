//! Relational rows behind the wardrobe: items, outfits, composites,
//! the subject photo, and cycling preferences.

mod memory;
mod rest;

pub use memory::MemoryDataService;
pub use rest::RestDataService;

use std::future::Future;
use uuid::Uuid;

use crate::models::{
    ClothingItem, ClothingType, GeneratedPhoto, NewClothingItem, NewGeneratedPhoto, NewSavedOutfit,
    PreferencesUpdate, SavedOutfit, UserPhoto, UserPreferences,
};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DataError {
    #[error("{table} row {id} not found")]
    NotFound { table: &'static str, id: Uuid },

    #[error("{0}")]
    Constraint(String),

    #[error("Database error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Unexpected response: {0}")]
    Decode(String),
}

pub type DataResult<T> = Result<T, DataError>;

/// Table access as one signed-in user. Every call is scoped to that user's rows.
pub trait DataService: Clone + Send + Sync + 'static {
    /// Newest first, optionally narrowed to one type.
    fn list_clothing_items(
        &self,
        user_id: Uuid,
        clothing_type: Option<ClothingType>,
    ) -> impl Future<Output = DataResult<Vec<ClothingItem>>> + Send;

    fn get_clothing_item(
        &self,
        id: Uuid,
    ) -> impl Future<Output = DataResult<Option<ClothingItem>>> + Send;

    fn insert_clothing_item(
        &self,
        item: NewClothingItem,
    ) -> impl Future<Output = DataResult<ClothingItem>> + Send;

    fn update_clothing_tags(
        &self,
        id: Uuid,
        tags: Vec<String>,
    ) -> impl Future<Output = DataResult<ClothingItem>> + Send;

    fn delete_clothing_item(&self, id: Uuid) -> impl Future<Output = DataResult<()>> + Send;

    /// Newest first.
    fn list_saved_outfits(
        &self,
        user_id: Uuid,
    ) -> impl Future<Output = DataResult<Vec<SavedOutfit>>> + Send;

    fn insert_saved_outfit(
        &self,
        outfit: NewSavedOutfit,
    ) -> impl Future<Output = DataResult<SavedOutfit>> + Send;

    fn update_outfit_rating(
        &self,
        id: Uuid,
        rating: Option<u8>,
    ) -> impl Future<Output = DataResult<SavedOutfit>> + Send;

    fn delete_saved_outfit(&self, id: Uuid) -> impl Future<Output = DataResult<()>> + Send;

    /// Newest first.
    fn list_generated_photos(
        &self,
        outfit_id: Uuid,
    ) -> impl Future<Output = DataResult<Vec<GeneratedPhoto>>> + Send;

    fn insert_generated_photo(
        &self,
        photo: NewGeneratedPhoto,
    ) -> impl Future<Output = DataResult<GeneratedPhoto>> + Send;

    /// Returns the removed rows so their files can be cleaned up.
    fn delete_generated_photos_for_outfit(
        &self,
        outfit_id: Uuid,
    ) -> impl Future<Output = DataResult<Vec<GeneratedPhoto>>> + Send;

    fn get_user_photo(
        &self,
        user_id: Uuid,
    ) -> impl Future<Output = DataResult<Option<UserPhoto>>> + Send;

    /// Insert or replace the single row for `user_id`.
    fn upsert_user_photo(
        &self,
        user_id: Uuid,
        image_url: String,
    ) -> impl Future<Output = DataResult<UserPhoto>> + Send;

    fn delete_user_photo(&self, user_id: Uuid) -> impl Future<Output = DataResult<()>> + Send;

    fn get_preferences(
        &self,
        user_id: Uuid,
    ) -> impl Future<Output = DataResult<Option<UserPreferences>>> + Send;

    fn upsert_preferences(
        &self,
        update: PreferencesUpdate,
    ) -> impl Future<Output = DataResult<UserPreferences>> + Send;
}
