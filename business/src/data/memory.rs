//! In-memory [`DataService`] with the row invariants the hosted schema enforces.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::Utc;
use uuid::Uuid;

use super::{DataError, DataResult, DataService};
use crate::models::{
    ClothingItem, ClothingType, GeneratedPhoto, NewClothingItem, NewGeneratedPhoto, NewSavedOutfit,
    PreferencesUpdate, SavedOutfit, UserPhoto, UserPreferences, is_valid_rating,
};
use crate::tags::normalize_tags;

#[derive(Default)]
struct Tables {
    clothing_items: HashMap<Uuid, ClothingItem>,
    saved_outfits: HashMap<Uuid, SavedOutfit>,
    generated_photos: HashMap<Uuid, GeneratedPhoto>,
    /// Keyed by user; one row each.
    user_photos: HashMap<Uuid, UserPhoto>,
    preferences: HashMap<Uuid, UserPreferences>,
}

impl Tables {
    fn check_reference(
        &self,
        user_id: Uuid,
        id: Option<Uuid>,
        expected: ClothingType,
    ) -> DataResult<()> {
        let Some(id) = id else {
            return Ok(());
        };
        match self.clothing_items.get(&id) {
            Some(item) if item.user_id == user_id && item.clothing_type == expected => Ok(()),
            Some(_) => Err(DataError::Constraint(format!(
                "{id} is not a {expected} owned by {user_id}"
            ))),
            None => Err(DataError::Constraint(format!(
                "clothing item {id} does not exist"
            ))),
        }
    }
}

#[derive(Clone, Default)]
pub struct MemoryDataService {
    tables: Arc<RwLock<Tables>>,
}

fn newest_first<T>(mut rows: Vec<T>, created_at: impl Fn(&T) -> chrono::DateTime<Utc>) -> Vec<T> {
    rows.sort_by_key(|row| std::cmp::Reverse(created_at(row)));
    rows
}

impl MemoryDataService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clothing_item_count(&self) -> usize {
        self.tables.read().expect("lock poisoned").clothing_items.len()
    }

    pub fn generated_photo_count(&self) -> usize {
        self.tables.read().expect("lock poisoned").generated_photos.len()
    }
}

impl DataService for MemoryDataService {
    async fn list_clothing_items(
        &self,
        user_id: Uuid,
        clothing_type: Option<ClothingType>,
    ) -> DataResult<Vec<ClothingItem>> {
        let tables = self.tables.read().expect("lock poisoned");
        let rows = tables
            .clothing_items
            .values()
            .filter(|item| item.user_id == user_id)
            .filter(|item| clothing_type.is_none_or(|kind| item.clothing_type == kind))
            .cloned()
            .collect();
        Ok(newest_first(rows, |item| item.created_at))
    }

    async fn get_clothing_item(&self, id: Uuid) -> DataResult<Option<ClothingItem>> {
        let tables = self.tables.read().expect("lock poisoned");
        Ok(tables.clothing_items.get(&id).cloned())
    }

    async fn insert_clothing_item(&self, item: NewClothingItem) -> DataResult<ClothingItem> {
        let mut tables = self.tables.write().expect("lock poisoned");
        if tables.clothing_items.contains_key(&item.id) {
            return Err(DataError::Constraint(format!(
                "duplicate key value violates unique constraint: {}",
                item.id
            )));
        }
        let now = Utc::now();
        let row = ClothingItem {
            id: item.id,
            user_id: item.user_id,
            clothing_type: item.clothing_type,
            image_url: item.image_url,
            tags: normalize_tags(item.tags),
            created_at: now,
            updated_at: now,
        };
        tables.clothing_items.insert(row.id, row.clone());
        Ok(row)
    }

    async fn update_clothing_tags(&self, id: Uuid, tags: Vec<String>) -> DataResult<ClothingItem> {
        let mut tables = self.tables.write().expect("lock poisoned");
        let item = tables
            .clothing_items
            .get_mut(&id)
            .ok_or(DataError::NotFound {
                table: "clothing_items",
                id,
            })?;
        item.tags = normalize_tags(tags);
        item.updated_at = Utc::now();
        Ok(item.clone())
    }

    async fn delete_clothing_item(&self, id: Uuid) -> DataResult<()> {
        let mut tables = self.tables.write().expect("lock poisoned");
        if tables.clothing_items.remove(&id).is_some() {
            // Outfits keep their row with the reference cleared
            for outfit in tables.saved_outfits.values_mut() {
                if outfit.top_id == Some(id) {
                    outfit.top_id = None;
                }
                if outfit.bottom_id == Some(id) {
                    outfit.bottom_id = None;
                }
            }
        }
        Ok(())
    }

    async fn list_saved_outfits(&self, user_id: Uuid) -> DataResult<Vec<SavedOutfit>> {
        let tables = self.tables.read().expect("lock poisoned");
        let rows = tables
            .saved_outfits
            .values()
            .filter(|outfit| outfit.user_id == user_id)
            .cloned()
            .collect();
        Ok(newest_first(rows, |outfit| outfit.created_at))
    }

    async fn insert_saved_outfit(&self, outfit: NewSavedOutfit) -> DataResult<SavedOutfit> {
        let mut tables = self.tables.write().expect("lock poisoned");
        tables.check_reference(outfit.user_id, outfit.top_id, ClothingType::Top)?;
        tables.check_reference(outfit.user_id, outfit.bottom_id, ClothingType::Bottom)?;
        if !is_valid_rating(outfit.rating) {
            return Err(DataError::Constraint(format!(
                "rating {:?} is outside 1..=5",
                outfit.rating
            )));
        }

        let now = Utc::now();
        let row = SavedOutfit {
            id: Uuid::new_v4(),
            user_id: outfit.user_id,
            top_id: outfit.top_id,
            bottom_id: outfit.bottom_id,
            rating: outfit.rating,
            created_at: now,
            updated_at: now,
        };
        tables.saved_outfits.insert(row.id, row.clone());
        Ok(row)
    }

    async fn update_outfit_rating(&self, id: Uuid, rating: Option<u8>) -> DataResult<SavedOutfit> {
        if !is_valid_rating(rating) {
            return Err(DataError::Constraint(format!(
                "rating {rating:?} is outside 1..=5"
            )));
        }
        let mut tables = self.tables.write().expect("lock poisoned");
        let outfit = tables
            .saved_outfits
            .get_mut(&id)
            .ok_or(DataError::NotFound {
                table: "saved_outfits",
                id,
            })?;
        outfit.rating = rating;
        outfit.updated_at = Utc::now();
        Ok(outfit.clone())
    }

    async fn delete_saved_outfit(&self, id: Uuid) -> DataResult<()> {
        let mut tables = self.tables.write().expect("lock poisoned");
        if tables
            .generated_photos
            .values()
            .any(|photo| photo.outfit_id == id)
        {
            return Err(DataError::Constraint(format!(
                "saved outfit {id} is still referenced by generated_photos"
            )));
        }
        tables.saved_outfits.remove(&id);
        Ok(())
    }

    async fn list_generated_photos(&self, outfit_id: Uuid) -> DataResult<Vec<GeneratedPhoto>> {
        let tables = self.tables.read().expect("lock poisoned");
        let rows = tables
            .generated_photos
            .values()
            .filter(|photo| photo.outfit_id == outfit_id)
            .cloned()
            .collect();
        Ok(newest_first(rows, |photo| photo.created_at))
    }

    async fn insert_generated_photo(&self, photo: NewGeneratedPhoto) -> DataResult<GeneratedPhoto> {
        let mut tables = self.tables.write().expect("lock poisoned");
        match tables.saved_outfits.get(&photo.outfit_id) {
            Some(outfit) if outfit.user_id == photo.user_id => {}
            _ => {
                return Err(DataError::Constraint(format!(
                    "saved outfit {} does not exist for {}",
                    photo.outfit_id, photo.user_id
                )));
            }
        }
        let row = GeneratedPhoto {
            id: photo.id,
            user_id: photo.user_id,
            outfit_id: photo.outfit_id,
            image_url: photo.image_url,
            prompt_used: photo.prompt_used,
            created_at: Utc::now(),
        };
        tables.generated_photos.insert(row.id, row.clone());
        Ok(row)
    }

    async fn delete_generated_photos_for_outfit(
        &self,
        outfit_id: Uuid,
    ) -> DataResult<Vec<GeneratedPhoto>> {
        let mut tables = self.tables.write().expect("lock poisoned");
        let ids: Vec<Uuid> = tables
            .generated_photos
            .values()
            .filter(|photo| photo.outfit_id == outfit_id)
            .map(|photo| photo.id)
            .collect();
        Ok(ids
            .into_iter()
            .filter_map(|id| tables.generated_photos.remove(&id))
            .collect())
    }

    async fn get_user_photo(&self, user_id: Uuid) -> DataResult<Option<UserPhoto>> {
        let tables = self.tables.read().expect("lock poisoned");
        Ok(tables.user_photos.get(&user_id).cloned())
    }

    async fn upsert_user_photo(&self, user_id: Uuid, image_url: String) -> DataResult<UserPhoto> {
        let mut tables = self.tables.write().expect("lock poisoned");
        let now = Utc::now();
        let row = tables
            .user_photos
            .entry(user_id)
            .and_modify(|row| {
                row.image_url = image_url.clone();
                row.updated_at = now;
            })
            .or_insert_with(|| UserPhoto {
                id: Uuid::new_v4(),
                user_id,
                image_url: image_url.clone(),
                created_at: now,
                updated_at: now,
            });
        Ok(row.clone())
    }

    async fn delete_user_photo(&self, user_id: Uuid) -> DataResult<()> {
        self.tables
            .write()
            .expect("lock poisoned")
            .user_photos
            .remove(&user_id);
        Ok(())
    }

    async fn get_preferences(&self, user_id: Uuid) -> DataResult<Option<UserPreferences>> {
        let tables = self.tables.read().expect("lock poisoned");
        Ok(tables.preferences.get(&user_id).cloned())
    }

    async fn upsert_preferences(&self, update: PreferencesUpdate) -> DataResult<UserPreferences> {
        let row = UserPreferences {
            user_id: update.user_id,
            last_viewed_top_id: update.last_viewed_top_id,
            last_viewed_bottom_id: update.last_viewed_bottom_id,
            updated_at: update.updated_at,
        };
        self.tables
            .write()
            .expect("lock poisoned")
            .preferences
            .insert(row.user_id, row.clone());
        Ok(row)
    }
}
