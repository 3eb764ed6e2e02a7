//! The subject photo every try-on is composited onto.

use chrono::Utc;
use uuid::Uuid;

use crate::data::DataService;
use crate::error::ActionResult;
use crate::images::{self, ImageError, ImageFile};
use crate::models::UserPhoto;
use crate::storage::paths::{all_user_photo_keys, key_from_public_url, public_url, user_photo_key};
use crate::storage::{FileStorage, FileStorageError, FileUploadRequest};

pub struct UserPhotoManager<D, S> {
    data: D,
    storage: S,
    user_id: Uuid,
    supabase_url: String,
}

impl<D, S> UserPhotoManager<D, S>
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

    pub async fn current(&self) -> ActionResult<Option<UserPhoto>> {
        Ok(self.data.get_user_photo(self.user_id).await?)
    }

    /// Clears both extensions so a JPEG never shadows a newer PNG.
    async fn remove_files(&self) -> ActionResult<()> {
        for key in all_user_photo_keys(self.user_id) {
            if self.storage.delete_file(&key).await? {
                log::debug!("Removed {key}");
            }
        }
        Ok(())
    }

    /// Stores a new subject photo in place of the old one.
    ///
    /// The new file and row are written before the previous file is removed,
    /// so a failure leaves the current photo usable. The recorded URL carries
    /// a `?t=` stamp so cached copies of the previous photo are not reused.
    pub async fn replace(&self, file: ImageFile) -> ActionResult<UserPhoto> {
        images::validate(&file)?;
        let compressed = tokio::task::spawn_blocking(move || images::compress(&file))
            .await
            .map_err(|e| ImageError::Compression(e.to_string()))??;

        let previous_key = self
            .current()
            .await?
            .and_then(|photo| key_from_public_url(&photo.image_url));

        let key = user_photo_key(self.user_id, &compressed.mime_type);
        self.storage
            .upload_file(
                FileUploadRequest::new(key.clone(), compressed.bytes, compressed.mime_type)
                    .upsert()
                    .cache_max_age(0),
            )
            .await?;

        let image_url = format!(
            "{}?t={}",
            public_url(&self.supabase_url, &key),
            Utc::now().timestamp_millis()
        );
        let photo = match self.data.upsert_user_photo(self.user_id, image_url).await {
            Ok(photo) => photo,
            Err(err) => {
                // Only drop the upload if the old row does not point at it
                if previous_key.as_deref() != Some(key.as_str())
                    && let Err(cleanup) = self.storage.delete_file(&key).await
                {
                    log::warn!("Failed to remove unused upload {key}: {cleanup}");
                }
                return Err(err.into());
            }
        };

        for stale in all_user_photo_keys(self.user_id)
            .into_iter()
            .chain(previous_key)
            .filter(|stale| *stale != key)
        {
            match self.storage.delete_file(&stale).await {
                Ok(true) => log::debug!("Removed {stale}"),
                Ok(false) => {}
                Err(err) => log::warn!("Failed to remove previous photo {stale}: {err}"),
            }
        }
        log::info!("Replaced photo for user {}", self.user_id);
        Ok(photo)
    }

    /// Removes the stored files and the row. Succeeds when there is no photo.
    pub async fn delete(&self) -> ActionResult<()> {
        if let Some(photo) = self.current().await? {
            // An older row may point at a path outside the fixed pair
            if let Some(key) = key_from_public_url(&photo.image_url) {
                if !all_user_photo_keys(self.user_id).contains(&key) {
                    self.storage.delete_file(&key).await?;
                }
            }
        }
        self.remove_files().await?;
        self.data.delete_user_photo(self.user_id).await?;
        Ok(())
    }
}
