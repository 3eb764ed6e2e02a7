//! In-memory storage for tests and offline runs.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use super::paths::split_key;
use super::traits::FileStorage;
use super::types::{FileMetadata, FileStorageError, FileUploadRequest};

#[derive(Clone, Default)]
pub struct MockFileStorage {
    files: Arc<RwLock<HashMap<String, Vec<u8>>>>,
}

impl MockFileStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.files.read().expect("lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<_> = self.files.read().expect("lock poisoned").keys().cloned().collect();
        keys.sort();
        keys
    }
}

impl FileStorage for MockFileStorage {
    type Error = FileStorageError;

    async fn upload_file(&self, request: FileUploadRequest) -> Result<FileMetadata, Self::Error> {
        split_key(&request.key).ok_or_else(|| FileStorageError::InvalidKey(request.key.clone()))?;
        let mut files = self.files.write().expect("lock poisoned");

        if !request.upsert && files.contains_key(&request.key) {
            return Err(FileStorageError::AlreadyExists(request.key));
        }

        let metadata = FileMetadata::new(
            request.key.clone(),
            request.content_type,
            request.content.len() as u64,
        );
        files.insert(request.key, request.content);
        Ok(metadata)
    }

    async fn download_file(&self, key: &str) -> Result<Vec<u8>, Self::Error> {
        self.files
            .read()
            .expect("lock poisoned")
            .get(key)
            .cloned()
            .ok_or_else(|| FileStorageError::NotFound(key.to_owned()))
    }

    async fn delete_file(&self, key: &str) -> Result<bool, Self::Error> {
        Ok(self
            .files
            .write()
            .expect("lock poisoned")
            .remove(key)
            .is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn second_upload_needs_upsert() {
        let storage = MockFileStorage::new();
        let key = "clothing-items/u/a.jpg";

        storage
            .upload_file(FileUploadRequest::new(key, b"one".to_vec(), "image/jpeg"))
            .await
            .unwrap();
        let err = storage
            .upload_file(FileUploadRequest::new(key, b"two".to_vec(), "image/jpeg"))
            .await
            .unwrap_err();
        assert_eq!(err, FileStorageError::AlreadyExists(key.to_owned()));

        storage
            .upload_file(FileUploadRequest::new(key, b"two".to_vec(), "image/jpeg").upsert())
            .await
            .unwrap();
        assert_eq!(storage.download_file(key).await.unwrap(), b"two");
        assert_eq!(storage.len(), 1);
    }

    #[tokio::test]
    async fn delete_reports_whether_removed() {
        let storage = MockFileStorage::new();
        storage
            .upload_file(FileUploadRequest::new("user-photos/u/photo.jpg", vec![1], "image/jpeg"))
            .await
            .unwrap();

        assert!(storage.delete_file("user-photos/u/photo.jpg").await.unwrap());
        assert!(!storage.delete_file("user-photos/u/photo.jpg").await.unwrap());
        assert!(storage.is_empty());
    }

    #[tokio::test]
    async fn rejects_unknown_bucket() {
        let storage = MockFileStorage::new();
        let err = storage
            .upload_file(FileUploadRequest::new("tmp/a.png", vec![0], "image/png"))
            .await
            .unwrap_err();
        assert!(matches!(err, FileStorageError::InvalidKey(_)));
    }
}
