//! End-to-end wardrobe flow against the in-memory backends.

use std::io::Cursor;

use outfits_business::images::{JPEG, PNG, to_data_url};
use outfits_business::proxy_client::{
    OutfitSuggestion, ProxyClientError, SuggestionRequest, TryOnRequest, TryOnResult,
};
use outfits_business::{
    ActionError, Closet, ClothingType, GenerationSession, ImageFile, MemoryDataService,
    MockFileStorage, OutfitGallery, OutfitProxy, Slot, UserPhotoManager, Wardrobe,
};
use uuid::Uuid;

const SUPABASE: &str = "https://demo.supabase.co";

fn encoded(format: image::ImageFormat) -> Vec<u8> {
    let img = image::RgbImage::from_fn(24, 24, |x, y| image::Rgb([x as u8 * 10, y as u8 * 10, 90]));
    let mut out = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut out, format)
        .expect("encode fixture");
    out.into_inner()
}

/// Answers every try-on with the same PNG and suggests the first candidates.
#[derive(Clone)]
struct StaticProxy {
    image: Vec<u8>,
}

impl OutfitProxy for StaticProxy {
    async fn generate_try_on(&self, request: TryOnRequest) -> Result<TryOnResult, ProxyClientError> {
        assert!(request.user_photo_url.contains("/user-photos/"));
        Ok(TryOnResult {
            image_url: to_data_url(PNG, &self.image),
            processing_time: None,
        })
    }

    async fn suggest_outfit(
        &self,
        request: SuggestionRequest,
    ) -> Result<OutfitSuggestion, ProxyClientError> {
        match (request.tops.first(), request.bottoms.first()) {
            (Some(top), Some(bottom)) => Ok(OutfitSuggestion {
                top_id: top.id,
                bottom_id: bottom.id,
                reasoning: format!("{} suits {}", top.label, request.vibe),
            }),
            _ => Err(ProxyClientError::MissingSuggestion),
        }
    }
}

#[tokio::test]
async fn upload_generate_save_and_delete() {
    let user = Uuid::new_v4();
    let data = MemoryDataService::new();
    let storage = MockFileStorage::new();
    let proxy = StaticProxy {
        image: encoded(image::ImageFormat::Png),
    };

    let closet = Closet::new(data.clone(), storage.clone(), user, SUPABASE);
    let top = closet
        .upload(
            ClothingType::Top,
            ImageFile::new("tee.jpg", JPEG, encoded(image::ImageFormat::Jpeg)),
            vec!["casual".to_owned()],
        )
        .await
        .expect("top uploads");
    let bottom = closet
        .upload(
            ClothingType::Bottom,
            ImageFile::new("jeans.jpg", JPEG, encoded(image::ImageFormat::Jpeg)),
            vec!["denim".to_owned()],
        )
        .await
        .expect("bottom uploads");

    let photos = UserPhotoManager::new(data.clone(), storage.clone(), user, SUPABASE);
    let subject = photos
        .replace(ImageFile::new("me.png", PNG, encoded(image::ImageFormat::Png)))
        .await
        .expect("photo uploads");

    let mut wardrobe = Wardrobe::load(data.clone(), user).await.expect("wardrobe loads");
    assert_eq!(wardrobe.current_top_id(), Some(top.id));
    wardrobe.next(Slot::Top);
    wardrobe.next(Slot::Top);
    wardrobe.settle().await;

    let suggestion = proxy
        .suggest_outfit(SuggestionRequest::from_wardrobe(
            "weekend",
            wardrobe.tops(),
            wardrobe.bottoms(),
        ))
        .await
        .expect("suggestion");
    wardrobe.select(Some(suggestion.top_id), Some(suggestion.bottom_id));
    wardrobe.settle().await;
    assert_eq!(wardrobe.current_bottom_id(), Some(bottom.id));

    let mut session = GenerationSession::new(data.clone(), storage.clone(), proxy, user, SUPABASE);
    session
        .generate(
            Some(&subject.image_url),
            wardrobe.current_top(),
            wardrobe.current_bottom(),
            None,
        )
        .await
        .expect("generation succeeds");
    assert!(session.handoff().original_photo_backup.is_some());

    let saved = session.save(Some(5)).await.expect("save succeeds");
    assert_eq!(saved.outfit.top_id, Some(top.id));
    assert!(session.generated_url().is_none());
    assert_eq!(
        session.save(Some(5)).await.unwrap_err(),
        ActionError::NothingToSave
    );

    let gallery = OutfitGallery::new(data.clone(), storage.clone(), user);
    let outfits = gallery.load().await.expect("gallery loads");
    assert_eq!(outfits.len(), 1);
    assert_eq!(outfits[0].generated_photos.len(), 1);

    gallery.delete(saved.outfit.id).await.expect("delete succeeds");
    assert!(gallery.load().await.expect("gallery loads").is_empty());

    // Remaining files: two garments and the subject photo
    assert_eq!(storage.len(), 3);
}

#[tokio::test]
async fn wardrobe_remembers_selection_between_visits() {
    let user = Uuid::new_v4();
    let data = MemoryDataService::new();
    let storage = MockFileStorage::new();
    let closet = Closet::new(data.clone(), storage.clone(), user, SUPABASE);
    for name in ["a.jpg", "b.jpg"] {
        closet
            .upload(
                ClothingType::Top,
                ImageFile::new(name, JPEG, encoded(image::ImageFormat::Jpeg)),
                vec![],
            )
            .await
            .expect("upload");
    }

    let mut first = Wardrobe::load(data.clone(), user).await.expect("load");
    first.previous(Slot::Top);
    let chosen = first.current_top_id();
    first.settle().await;

    let second = Wardrobe::load(data, user).await.expect("reload");
    assert_eq!(second.current_top_id(), chosen);
}
