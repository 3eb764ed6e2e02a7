//! File storage types.

/// Metadata for a stored object. `key` is `<bucket>/<object path>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMetadata {
    pub key: String,
    pub filename: String,
    pub content_type: String,
    pub size: u64,
}

impl FileMetadata {
    pub fn new(key: impl Into<String>, content_type: impl Into<String>, size: u64) -> Self {
        let key = key.into();
        let filename = key.rsplit('/').next().unwrap_or(&key).to_owned();
        Self {
            key,
            filename,
            content_type: content_type.into(),
            size,
        }
    }
}

/// Request to store an object under `key`.
#[derive(Debug, Clone)]
pub struct FileUploadRequest {
    pub key: String,
    pub content: Vec<u8>,
    pub content_type: String,
    /// Replace an existing object instead of failing.
    pub upsert: bool,
    /// `Cache-Control` max-age in seconds; storage default when unset.
    pub cache_max_age: Option<u32>,
}

impl FileUploadRequest {
    pub fn new(key: impl Into<String>, content: Vec<u8>, content_type: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            content,
            content_type: content_type.into(),
            upsert: false,
            cache_max_age: None,
        }
    }

    pub fn upsert(mut self) -> Self {
        self.upsert = true;
        self
    }

    pub fn cache_max_age(mut self, seconds: u32) -> Self {
        self.cache_max_age = Some(seconds);
        self
    }
}

/// Error type for file storage operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FileStorageError {
    #[error("File not found: {0}")]
    NotFound(String),

    #[error("File already exists: {0}")]
    AlreadyExists(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Connection error: {0}")]
    ConnectionError(String),
}
