//! Upload, storage and tag screens: the user's garments.

use uuid::Uuid;

use crate::data::DataService;
use crate::error::{ActionError, ActionResult};
use crate::images::{self, ImageError, ImageFile};
use crate::models::{ClothingItem, ClothingType, NewClothingItem};
use crate::storage::paths::{clothing_item_key, key_from_public_url, public_url};
use crate::storage::{FileStorage, FileStorageError, FileUploadRequest};
use crate::tags::{self, TagFilter, normalize_tags};

pub struct Closet<D, S> {
    data: D,
    storage: S,
    user_id: Uuid,
    supabase_url: String,
}

impl<D, S> Closet<D, S>
where
    D: DataService,
    S: FileStorage<Error = FileStorageError>,
{
    pub fn new(data: D, storage: S, user_id: Uuid, supabase_url: impl Into<String>) -> Self {
        Self {
            data,
            storage,
            user_id,
            supabase_url: supabase_url.into(),
        }
    }

    /// Validates, compresses, stores, then records a new garment.
    pub async fn upload(
        &self,
        kind: ClothingType,
        file: ImageFile,
        tags: Vec<String>,
    ) -> ActionResult<ClothingItem> {
        images::validate(&file)?;
        let compressed = tokio::task::spawn_blocking(move || images::compress(&file))
            .await
            .map_err(|e| ImageError::Compression(e.to_string()))??;

        let id = Uuid::new_v4();
        let key = clothing_item_key(self.user_id, id);
        self.storage
            .upload_file(FileUploadRequest::new(
                key.clone(),
                compressed.bytes,
                compressed.mime_type,
            ))
            .await?;

        let inserted = self
            .data
            .insert_clothing_item(NewClothingItem {
                id,
                user_id: self.user_id,
                clothing_type: kind,
                image_url: public_url(&self.supabase_url, &key),
                tags: normalize_tags(tags),
            })
            .await;

        match inserted {
            Ok(item) => {
                log::info!("Uploaded {kind} {}", item.id);
                Ok(item)
            }
            Err(err) => {
                if let Err(cleanup) = self.storage.delete_file(&key).await {
                    log::warn!("Failed to remove orphaned upload {key}: {cleanup}");
                }
                Err(err.into())
            }
        }
    }

    /// Items of `kind` (or all) carrying every selected tag, newest first.
    pub async fn list(
        &self,
        kind: Option<ClothingType>,
        filter: &TagFilter,
    ) -> ActionResult<Vec<ClothingItem>> {
        let items = self.data.list_clothing_items(self.user_id, kind).await?;
        Ok(items.into_iter().filter(|item| filter.matches(item)).collect())
    }

    pub async fn all_tags(&self) -> ActionResult<Vec<String>> {
        let items = self.data.list_clothing_items(self.user_id, None).await?;
        Ok(tags::all_tags(&items))
    }

    async fn owned(&self, id: Uuid) -> ActionResult<ClothingItem> {
        self.data
            .get_clothing_item(id)
            .await?
            .filter(|item| item.user_id == self.user_id)
            .ok_or_else(|| ActionError::NotFound(format!("Clothing item {id}")))
    }

    /// Replaces the item's tags with the normalized set.
    pub async fn retag(&self, id: Uuid, tags: Vec<String>) -> ActionResult<ClothingItem> {
        self.owned(id).await?;
        Ok(self
            .data
            .update_clothing_tags(id, normalize_tags(tags))
            .await?)
    }

    /// Removes the backing image, then the row.
    pub async fn delete(&self, id: Uuid) -> ActionResult<()> {
        let item = self.owned(id).await?;
        let key = key_from_public_url(&item.image_url)
            .unwrap_or_else(|| clothing_item_key(self.user_id, id));

        if !self.storage.delete_file(&key).await? {
            log::warn!("No stored image for clothing item {id} at {key}");
        }
        self.data.delete_clothing_item(id).await?;
        Ok(())
    }
}
