//! Fixtures for business-layer tests.
//!
//! Remote clients are tested against `wiremock`; the hooks run against the
//! in-memory data service and storage plus [`FakeProxy`].
//!
//! ```ignore
//! let server = MockServer::start().await;
//! let client = NanoBananaClient::new(mock_config(&server), None);
//! ```

use std::io::Cursor;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use chrono::Utc;
use uuid::Uuid;
use wiremock::MockServer;

use crate::config::BusinessConfig;
use crate::models::{ClothingItem, ClothingType};
use crate::proxy_client::{
    OutfitProxy, OutfitSuggestion, ProxyClientError, SuggestionRequest, TryOnRequest, TryOnResult,
};
use crate::storage::{FileMetadata, FileStorage, FileStorageError, FileUploadRequest, MockFileStorage};

pub const TEST_USER: Uuid = Uuid::from_u128(0xA11CE);

/// Proxy and Supabase both pointed at `server`.
pub fn mock_config(server: &MockServer) -> BusinessConfig {
    BusinessConfig::new(
        format!("{}/api/nano-banana", server.uri()),
        server.uri(),
        "test-anon-key",
    )
}

pub fn clothing_item(kind: ClothingType, tags: &[&str]) -> ClothingItem {
    let id = Uuid::new_v4();
    ClothingItem {
        id,
        user_id: TEST_USER,
        clothing_type: kind,
        image_url: format!("https://test.supabase.co/storage/v1/object/public/clothing-items/{TEST_USER}/{id}.jpg"),
        tags: tags.iter().map(|t| (*t).to_owned()).collect(),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

fn encode(width: u32, height: u32, format: image::ImageFormat) -> Vec<u8> {
    let img = image::RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, ((x * y) % 256) as u8])
    });
    let mut out = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut out, format)
        .expect("encode test image");
    out.into_inner()
}

pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    encode(width, height, image::ImageFormat::Png)
}

pub fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    encode(width, height, image::ImageFormat::Jpeg)
}

/// Scripted [`OutfitProxy`] that records what it was asked.
#[derive(Clone, Default)]
pub struct FakeProxy {
    inner: Arc<Mutex<FakeProxyState>>,
}

#[derive(Default)]
struct FakeProxyState {
    try_on: Option<Result<TryOnResult, ProxyClientError>>,
    suggestion: Option<Result<OutfitSuggestion, ProxyClientError>>,
    try_on_requests: Vec<TryOnRequest>,
    suggestion_requests: Vec<SuggestionRequest>,
}

impl FakeProxy {
    pub fn returning_image(image_url: impl Into<String>) -> Self {
        let proxy = Self::default();
        proxy.set_try_on(Ok(TryOnResult {
            image_url: image_url.into(),
            processing_time: Some(1290),
        }));
        proxy
    }

    pub fn set_try_on(&self, result: Result<TryOnResult, ProxyClientError>) {
        self.inner.lock().expect("lock poisoned").try_on = Some(result);
    }

    pub fn set_suggestion(&self, result: Result<OutfitSuggestion, ProxyClientError>) {
        self.inner.lock().expect("lock poisoned").suggestion = Some(result);
    }

    pub fn try_on_requests(&self) -> Vec<TryOnRequest> {
        self.inner.lock().expect("lock poisoned").try_on_requests.clone()
    }

    pub fn suggestion_requests(&self) -> Vec<SuggestionRequest> {
        self.inner
            .lock()
            .expect("lock poisoned")
            .suggestion_requests
            .clone()
    }
}

impl OutfitProxy for FakeProxy {
    async fn generate_try_on(&self, request: TryOnRequest) -> Result<TryOnResult, ProxyClientError> {
        let mut state = self.inner.lock().expect("lock poisoned");
        state.try_on_requests.push(request);
        state
            .try_on
            .clone()
            .unwrap_or(Err(ProxyClientError::MissingImage))
    }

    async fn suggest_outfit(
        &self,
        request: SuggestionRequest,
    ) -> Result<OutfitSuggestion, ProxyClientError> {
        let mut state = self.inner.lock().expect("lock poisoned");
        state.suggestion_requests.push(request);
        state
            .suggestion
            .clone()
            .unwrap_or(Err(ProxyClientError::MissingSuggestion))
    }
}

/// [`MockFileStorage`] whose uploads can be switched off.
#[derive(Clone, Default)]
pub struct FlakyStorage {
    pub inner: MockFileStorage,
    fail_uploads: Arc<AtomicBool>,
}

impl FlakyStorage {
    pub fn fail_uploads(&self, fail: bool) {
        self.fail_uploads.store(fail, Ordering::SeqCst);
    }
}

impl FileStorage for FlakyStorage {
    type Error = FileStorageError;

    async fn upload_file(&self, request: FileUploadRequest) -> Result<FileMetadata, Self::Error> {
        if self.fail_uploads.load(Ordering::SeqCst) {
            return Err(FileStorageError::ConnectionError("storage unavailable".to_owned()));
        }
        self.inner.upload_file(request).await
    }

    async fn download_file(&self, key: &str) -> Result<Vec<u8>, Self::Error> {
        self.inner.download_file(key).await
    }

    async fn delete_file(&self, key: &str) -> Result<bool, Self::Error> {
        self.inner.delete_file(key).await
    }
}
