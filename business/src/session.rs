//! Try-on generation for the wardrobe screen.
//!
//! A composite lives only in the session ([`GenerationHandoff`]) until the
//! user saves it with a rating. The subject photo is cached as a data URL
//! before the first generation so the display can be reset to it.

use uuid::Uuid;

use crate::data::DataService;
use crate::error::{ActionError, ActionResult};
use crate::fetch::load_image;
use crate::images;
use crate::models::{
    ClothingItem, GeneratedPhoto, NewGeneratedPhoto, NewSavedOutfit, SavedOutfit, is_valid_rating,
};
use crate::proxy_client::{OutfitProxy, TryOnRequest};
use crate::status::OperationStatus;
use crate::storage::paths::{generated_photo_key, public_url};
use crate::storage::{FileStorage, FileStorageError, FileUploadRequest};

/// Generation state that survives leaving and re-entering the wardrobe.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationHandoff {
    /// Latest composite, data URL or remote URL.
    pub generated_url: Option<String>,
    pub source_top_id: Option<Uuid>,
    pub source_bottom_id: Option<Uuid>,
    /// Subject photo as a data URL, taken before the first generation.
    pub original_photo_backup: Option<String>,
}

/// What a save produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedGeneration {
    pub outfit: SavedOutfit,
    pub photo: GeneratedPhoto,
}

pub struct GenerationSession<D, S, P> {
    data: D,
    storage: S,
    proxy: P,
    user_id: Uuid,
    supabase_url: String,
    handoff: GenerationHandoff,
    last_instruction: Option<String>,
    status: OperationStatus,
}

impl<D, S, P> GenerationSession<D, S, P>
where
    D: DataService,
    S: FileStorage<Error = FileStorageError>,
    P: OutfitProxy,
{
    pub fn new(data: D, storage: S, proxy: P, user_id: Uuid, supabase_url: impl Into<String>) -> Self {
        Self {
            data,
            storage,
            proxy,
            user_id,
            supabase_url: supabase_url.into(),
            handoff: GenerationHandoff::default(),
            last_instruction: None,
            status: OperationStatus::Idle,
        }
    }

    /// Resumes with state handed over from an earlier visit.
    pub fn with_handoff(mut self, handoff: GenerationHandoff) -> Self {
        self.handoff = handoff;
        self
    }

    pub fn handoff(&self) -> &GenerationHandoff {
        &self.handoff
    }

    pub fn status(&self) -> &OperationStatus {
        &self.status
    }

    pub fn generated_url(&self) -> Option<&str> {
        self.handoff.generated_url.as_deref()
    }

    /// What the subject area shows: the composite if any, else the photo.
    pub fn displayed_subject<'a>(&'a self, subject_photo_url: Option<&'a str>) -> Option<&'a str> {
        self.handoff
            .generated_url
            .as_deref()
            .or(subject_photo_url)
    }

    /// Caches the subject photo as a data URL, once per session.
    pub async fn ensure_backup(&mut self, subject_photo_url: &str) -> ActionResult<()> {
        if self.handoff.original_photo_backup.is_some() {
            return Ok(());
        }
        let file = load_image(&self.storage, subject_photo_url).await?;
        self.handoff.original_photo_backup = Some(file.to_data_url());
        Ok(())
    }

    /// Renders the selected garments onto the subject photo.
    ///
    /// Always composites onto the stored subject photo, never onto a
    /// previous composite. On failure the previous result stays in place.
    pub async fn generate(
        &mut self,
        subject_photo_url: Option<&str>,
        top: Option<&ClothingItem>,
        bottom: Option<&ClothingItem>,
        instruction: Option<String>,
    ) -> ActionResult<&str> {
        if self.status.is_in_flight() {
            return Err(ActionError::Busy);
        }
        let subject = subject_photo_url
            .filter(|url| !url.trim().is_empty())
            .ok_or(ActionError::MissingUserPhoto)?;

        self.status = OperationStatus::InFlight;
        let result = self.run_generation(subject, top, bottom, instruction).await;
        match result {
            Ok(()) => {
                self.status = OperationStatus::Succeeded;
                Ok(self.handoff.generated_url.as_deref().unwrap_or_default())
            }
            Err(err) => {
                log::error!("Generate try-on error: {err}");
                self.status = OperationStatus::Failed(err.to_string());
                Err(err)
            }
        }
    }

    async fn run_generation(
        &mut self,
        subject: &str,
        top: Option<&ClothingItem>,
        bottom: Option<&ClothingItem>,
        instruction: Option<String>,
    ) -> ActionResult<()> {
        self.ensure_backup(subject).await?;

        let result = self
            .proxy
            .generate_try_on(TryOnRequest {
                user_photo_url: subject.to_owned(),
                top_image_url: top.map(|item| item.image_url.clone()),
                bottom_image_url: bottom.map(|item| item.image_url.clone()),
                instruction: instruction.clone(),
            })
            .await?;

        if let Some(tokens) = result.processing_time {
            log::debug!("try-on generated ({tokens} tokens)");
        }
        self.handoff.generated_url = Some(result.image_url);
        self.handoff.source_top_id = top.map(|item| item.id);
        self.handoff.source_bottom_id = bottom.map(|item| item.id);
        self.last_instruction = instruction;
        Ok(())
    }

    /// Drops the composite and returns the original photo to display.
    pub fn reset(&mut self) -> Option<&str> {
        self.clear_generated();
        self.handoff.original_photo_backup.as_deref()
    }

    /// Forgets the composite without touching the photo backup.
    pub fn clear_generated(&mut self) {
        self.handoff.generated_url = None;
        self.handoff.source_top_id = None;
        self.handoff.source_bottom_id = None;
        self.last_instruction = None;
        self.status = OperationStatus::Idle;
    }

    /// The subject photo was replaced or removed: the composite and the
    /// cached original no longer apply.
    pub fn subject_changed(&mut self) {
        self.clear_generated();
        self.handoff.original_photo_backup = None;
    }

    /// Persists the current composite with its outfit and rating.
    ///
    /// The image is uploaded byte-for-byte as generated.
    pub async fn save(&mut self, rating: Option<u8>) -> ActionResult<SavedGeneration> {
        if !is_valid_rating(rating) {
            return Err(ActionError::InvalidRating);
        }
        let generated_url = self
            .handoff
            .generated_url
            .clone()
            .ok_or(ActionError::NothingToSave)?;

        let image = load_image(&self.storage, &generated_url).await?;

        let photo_id = Uuid::new_v4();
        let key = generated_photo_key(self.user_id, photo_id, &image.mime_type);
        self.storage
            .upload_file(FileUploadRequest::new(
                key.clone(),
                image.bytes,
                image.mime_type.clone(),
            ))
            .await?;

        let outfit = match self
            .data
            .insert_saved_outfit(NewSavedOutfit {
                user_id: self.user_id,
                top_id: self.handoff.source_top_id,
                bottom_id: self.handoff.source_bottom_id,
                rating,
            })
            .await
        {
            Ok(outfit) => outfit,
            Err(err) => {
                self.discard_upload(&key).await;
                return Err(err.into());
            }
        };

        let inserted = self
            .data
            .insert_generated_photo(NewGeneratedPhoto {
                id: photo_id,
                user_id: self.user_id,
                outfit_id: outfit.id,
                image_url: public_url(&self.supabase_url, &key),
                prompt_used: self.last_instruction.clone(),
            })
            .await;
        let photo = match inserted {
            Ok(photo) => photo,
            Err(err) => {
                if let Err(cleanup) = self.data.delete_saved_outfit(outfit.id).await {
                    log::warn!("Failed to remove outfit {} without photo: {cleanup}", outfit.id);
                }
                self.discard_upload(&key).await;
                return Err(err.into());
            }
        };

        log::info!(
            "Saved outfit {} with photo {} ({})",
            outfit.id,
            photo.id,
            images::extension_for_mime(&image.mime_type)
        );
        self.clear_generated();
        Ok(SavedGeneration { outfit, photo })
    }

    async fn discard_upload(&self, key: &str) {
        if let Err(err) = self.storage.delete_file(key).await {
            log::warn!("Failed to remove orphaned composite {key}: {err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::MemoryDataService;
    use crate::images::{PNG, to_data_url};
    use crate::models::ClothingType;
    use crate::proxy_client::ProxyClientError;
    use crate::storage::MockFileStorage;
    use crate::test_utils::{FakeProxy, FlakyStorage, TEST_USER, clothing_item, jpeg_bytes, png_bytes};

    const SUBJECT_KEY: &str = "user-photos/00000000-0000-0000-0000-000000000001/photo.jpg";
    const SUPABASE: &str = "https://test.supabase.co";

    struct Fixture {
        data: MemoryDataService,
        storage: MockFileStorage,
        proxy: FakeProxy,
        subject_url: String,
        composite: Vec<u8>,
    }

    async fn fixture() -> Fixture {
        let storage = MockFileStorage::new();
        storage
            .upload_file(FileUploadRequest::new(SUBJECT_KEY, jpeg_bytes(8, 8), "image/jpeg"))
            .await
            .unwrap();
        let composite = png_bytes(6, 6);
        Fixture {
            data: MemoryDataService::new(),
            storage,
            proxy: FakeProxy::returning_image(to_data_url(PNG, &composite)),
            subject_url: format!("{}?t=5", public_url(SUPABASE, SUBJECT_KEY)),
            composite,
        }
    }

    fn session(f: &Fixture) -> GenerationSession<MemoryDataService, MockFileStorage, FakeProxy> {
        GenerationSession::new(f.data.clone(), f.storage.clone(), f.proxy.clone(), TEST_USER, SUPABASE)
    }

    #[tokio::test]
    async fn generation_needs_a_subject_photo() {
        let f = fixture().await;
        let mut session = session(&f);
        let err = session.generate(None, None, None, None).await.unwrap_err();
        assert_eq!(err, ActionError::MissingUserPhoto);
        assert!(f.proxy.try_on_requests().is_empty());
    }

    #[tokio::test]
    async fn generate_backs_up_subject_then_reset_restores_it() {
        let f = fixture().await;
        let mut session = session(&f);
        let top = clothing_item(ClothingType::Top, &[]);

        let url = session
            .generate(Some(&f.subject_url), Some(&top), None, None)
            .await
            .unwrap()
            .to_owned();
        assert!(url.starts_with("data:image/png"));
        assert_eq!(session.handoff().source_top_id, Some(top.id));
        assert_eq!(session.displayed_subject(Some(&f.subject_url)), Some(url.as_str()));

        let backup = session.reset().map(str::to_owned).unwrap();
        assert!(backup.starts_with("data:image/jpeg;base64,"));
        assert_eq!(session.generated_url(), None);
        assert_eq!(session.displayed_subject(Some(&f.subject_url)), Some(f.subject_url.as_str()));
    }

    #[tokio::test]
    async fn repeat_generation_uses_original_photo() {
        let f = fixture().await;
        let mut session = session(&f);

        session.generate(Some(&f.subject_url), None, None, None).await.unwrap();
        session.generate(Some(&f.subject_url), None, None, None).await.unwrap();

        let requests = f.proxy.try_on_requests();
        assert_eq!(requests.len(), 2);
        assert!(requests.iter().all(|r| r.user_photo_url == f.subject_url));
    }

    #[tokio::test]
    async fn failed_generation_keeps_previous_result() {
        let f = fixture().await;
        let mut session = session(&f);
        session.generate(Some(&f.subject_url), None, None, None).await.unwrap();
        let before = session.generated_url().map(str::to_owned);

        f.proxy
            .set_try_on(Err(ProxyClientError::Upstream("I can't see a person".to_owned())));
        let err = session
            .generate(Some(&f.subject_url), None, None, None)
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "I can't see a person");
        assert_eq!(session.generated_url().map(str::to_owned), before);
        assert_eq!(session.status().error(), Some("I can't see a person"));
    }

    #[tokio::test]
    async fn save_uploads_composite_unchanged() {
        let f = fixture().await;
        let mut session = session(&f);
        session.generate(Some(&f.subject_url), None, None, None).await.unwrap();

        let saved = session.save(Some(5)).await.unwrap();

        assert_eq!(saved.outfit.top_id, None);
        assert_eq!(saved.outfit.bottom_id, None);
        assert_eq!(saved.outfit.rating, Some(5));
        assert!(saved.photo.image_url.ends_with(&format!("{}.png", saved.photo.id)));

        let key = generated_photo_key(TEST_USER, saved.photo.id, PNG);
        assert_eq!(f.storage.download_file(&key).await.unwrap(), f.composite);
        assert_eq!(session.generated_url(), None);
        assert!(session.handoff().original_photo_backup.is_some());
    }

    #[tokio::test]
    async fn save_without_composite_or_with_bad_rating() {
        let f = fixture().await;
        let mut session = session(&f);
        assert_eq!(session.save(None).await.unwrap_err(), ActionError::NothingToSave);

        session.generate(Some(&f.subject_url), None, None, None).await.unwrap();
        assert_eq!(session.save(Some(0)).await.unwrap_err(), ActionError::InvalidRating);
        assert_eq!(f.data.generated_photo_count(), 0);
    }

    #[tokio::test]
    async fn resumed_handoff_can_be_saved() {
        let f = fixture().await;
        let first = {
            let mut session = session(&f);
            session.generate(Some(&f.subject_url), None, None, None).await.unwrap();
            session.handoff().clone()
        };

        let mut resumed = session(&f).with_handoff(first);
        assert!(resumed.generated_url().is_some());
        let saved = resumed.save(None).await.unwrap();
        assert_eq!(saved.outfit.rating, None);
        assert_eq!(f.data.generated_photo_count(), 1);
    }

    #[tokio::test]
    async fn failed_upload_saves_nothing_and_keeps_composite() {
        let storage = FlakyStorage::default();
        storage
            .inner
            .upload_file(FileUploadRequest::new(SUBJECT_KEY, jpeg_bytes(8, 8), "image/jpeg"))
            .await
            .unwrap();
        let data = MemoryDataService::new();
        let proxy = FakeProxy::returning_image(to_data_url(PNG, &png_bytes(6, 6)));
        let mut session =
            GenerationSession::new(data.clone(), storage.clone(), proxy, TEST_USER, SUPABASE);
        let subject = public_url(SUPABASE, SUBJECT_KEY);
        session.generate(Some(&subject), None, None, None).await.unwrap();

        storage.fail_uploads(true);
        for _ in 0..2 {
            let err = session.save(Some(4)).await.unwrap_err();
            assert!(err.to_string().contains("storage unavailable"), "{err}");
        }
        assert!(data.list_saved_outfits(TEST_USER).await.unwrap().is_empty());
        assert!(session.generated_url().is_some());
        assert_eq!(storage.inner.keys(), vec![SUBJECT_KEY.to_owned()]);

        storage.fail_uploads(false);
        session.save(Some(4)).await.unwrap();
        assert_eq!(data.list_saved_outfits(TEST_USER).await.unwrap().len(), 1);
        assert_eq!(data.generated_photo_count(), 1);
    }
}
