//! Supabase Storage over its REST API.

use serde::Serialize;

use super::paths::{public_url, split_key};
use super::traits::FileStorage;
use super::types::{FileMetadata, FileStorageError, FileUploadRequest};
use crate::config::BusinessConfig;
use crate::http::{Client, HttpError, RequestBuilder, Response};

const DEFAULT_CACHE_MAX_AGE: u32 = 3600;

/// Storage client acting as one signed-in user.
#[derive(Debug, Clone)]
pub struct SupabaseFileStorage {
    config: BusinessConfig,
    access_token: String,
}

#[derive(Serialize)]
struct RemoveBody<'a> {
    prefixes: [&'a str; 1],
}

impl SupabaseFileStorage {
    pub fn new(config: BusinessConfig, access_token: impl Into<String>) -> Self {
        Self {
            config,
            access_token: access_token.into(),
        }
    }

    /// Public URL for a key in a public bucket.
    pub fn public_url(&self, key: &str) -> String {
        public_url(&self.config.supabase_url, key)
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("apikey", self.config.supabase_anon_key.as_str())
            .bearer(&self.access_token)
    }

    fn object_url(&self, key: &str) -> Result<String, FileStorageError> {
        split_key(key).ok_or_else(|| FileStorageError::InvalidKey(key.to_owned()))?;
        Ok(self.config.storage_url(&format!("object/{key}")))
    }
}

fn connection(err: HttpError) -> FileStorageError {
    FileStorageError::ConnectionError(err.message)
}

/// Storage reports missing objects as 404, or as 400 with a not-found body.
fn is_not_found(response: &Response) -> bool {
    response.status == 404
        || (response.status == 400 && response.error_message().to_lowercase().contains("not found"))
}

impl FileStorage for SupabaseFileStorage {
    type Error = FileStorageError;

    async fn upload_file(&self, request: FileUploadRequest) -> Result<FileMetadata, Self::Error> {
        let url = self.object_url(&request.key)?;
        let size = request.content.len() as u64;

        let response = self
            .authorize(Client::post(url))
            .header("content-type", request.content_type.as_str())
            .header(
                "cache-control",
                format!(
                    "max-age={}",
                    request.cache_max_age.unwrap_or(DEFAULT_CACHE_MAX_AGE)
                ),
            )
            .header("x-upsert", if request.upsert { "true" } else { "false" })
            .body(request.content)
            .send()
            .await
            .map_err(connection)?;

        match response.status {
            s if (200..300).contains(&s) => {
                log::debug!("uploaded {} ({size} bytes)", request.key);
                Ok(FileMetadata::new(request.key, request.content_type, size))
            }
            409 => Err(FileStorageError::AlreadyExists(request.key)),
            _ => Err(FileStorageError::StorageError(response.error_message())),
        }
    }

    async fn download_file(&self, key: &str) -> Result<Vec<u8>, Self::Error> {
        let url = self.object_url(key)?;
        let response = self
            .authorize(Client::get(url))
            .send()
            .await
            .map_err(connection)?;

        if response.is_success() {
            Ok(response.body)
        } else if is_not_found(&response) {
            Err(FileStorageError::NotFound(key.to_owned()))
        } else {
            Err(FileStorageError::StorageError(response.error_message()))
        }
    }

    async fn delete_file(&self, key: &str) -> Result<bool, Self::Error> {
        let (bucket, path) =
            split_key(key).ok_or_else(|| FileStorageError::InvalidKey(key.to_owned()))?;
        let url = self.config.storage_url(&format!("object/{bucket}"));

        let response = self
            .authorize(Client::delete(url))
            .json(&RemoveBody { prefixes: [path] })
            .map_err(|e| FileStorageError::StorageError(e.to_string()))?
            .send()
            .await
            .map_err(connection)?;

        if !response.is_success() {
            return Err(FileStorageError::StorageError(response.error_message()));
        }
        // The body lists the objects that were actually removed
        let removed: Vec<serde_json::Value> = response.json().unwrap_or_default();
        Ok(!removed.is_empty())
    }
}
