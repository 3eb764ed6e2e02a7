//! Saved outfits gallery.

use uuid::Uuid;

use crate::data::DataService;
use crate::error::{ActionError, ActionResult};
use crate::fetch::load_image;
use crate::images::ImageFile;
use crate::models::{
    ClothingItem, GeneratedPhoto, SavedOutfit, SavedOutfitWithItems, is_valid_rating,
};
use crate::storage::paths::key_from_public_url;
use crate::storage::{FileStorage, FileStorageError};

pub struct OutfitGallery<D, S> {
    data: D,
    storage: S,
    user_id: Uuid,
}

impl<D, S> OutfitGallery<D, S>
where
    D: DataService,
    S: FileStorage<Error = FileStorageError>,
{
    pub fn new(data: D, storage: S, user_id: Uuid) -> Self {
        Self {
            data,
            storage,
            user_id,
        }
    }

    async fn item(&self, id: Option<Uuid>) -> ActionResult<Option<ClothingItem>> {
        match id {
            Some(id) => Ok(self.data.get_clothing_item(id).await?),
            None => Ok(None),
        }
    }

    /// Every outfit, newest first, with garments and composites resolved.
    pub async fn load(&self) -> ActionResult<Vec<SavedOutfitWithItems>> {
        let outfits = self.data.list_saved_outfits(self.user_id).await?;
        let mut resolved = Vec::with_capacity(outfits.len());
        for outfit in outfits {
            let (top, bottom, generated_photos) = tokio::try_join!(
                self.item(outfit.top_id),
                self.item(outfit.bottom_id),
                async { Ok::<_, ActionError>(self.data.list_generated_photos(outfit.id).await?) },
            )?;
            resolved.push(SavedOutfitWithItems {
                outfit,
                top,
                bottom,
                generated_photos,
            });
        }
        Ok(resolved)
    }

    async fn owned(&self, id: Uuid) -> ActionResult<SavedOutfit> {
        self.data
            .list_saved_outfits(self.user_id)
            .await?
            .into_iter()
            .find(|outfit| outfit.id == id)
            .ok_or_else(|| ActionError::NotFound(format!("Outfit {id}")))
    }

    pub async fn rate(&self, id: Uuid, rating: Option<u8>) -> ActionResult<SavedOutfit> {
        if !is_valid_rating(rating) {
            return Err(ActionError::InvalidRating);
        }
        self.owned(id).await?;
        Ok(self.data.update_outfit_rating(id, rating).await?)
    }

    /// Removes the outfit's composites (rows and files) before the outfit itself.
    pub async fn delete(&self, id: Uuid) -> ActionResult<()> {
        self.owned(id).await?;
        let photos = self.data.delete_generated_photos_for_outfit(id).await?;
        for photo in &photos {
            let Some(key) = key_from_public_url(&photo.image_url) else {
                continue;
            };
            if let Err(err) = self.storage.delete_file(&key).await {
                log::warn!("Failed to remove generated photo {key}: {err}");
            }
        }
        self.data.delete_saved_outfit(id).await?;
        log::info!("Deleted outfit {id} and {} generated photos", photos.len());
        Ok(())
    }

    /// The composite's bytes, read through storage when it lives there.
    pub async fn photo(&self, photo: &GeneratedPhoto) -> ActionResult<ImageFile> {
        load_image(&self.storage, &photo.image_url).await
    }
}
