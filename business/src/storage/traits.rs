//! Storage trait definitions.

use super::types::{FileMetadata, FileUploadRequest};
use std::future::Future;

/// Object storage addressed by `<bucket>/<object path>` keys.
///
/// See [module documentation](super) for the key layout.
pub trait FileStorage: Clone + Send + Sync + 'static {
    type Error: std::error::Error + Send + Sync + 'static;

    fn upload_file(
        &self,
        request: FileUploadRequest,
    ) -> impl Future<Output = Result<FileMetadata, Self::Error>> + Send;

    fn download_file(&self, key: &str)
    -> impl Future<Output = Result<Vec<u8>, Self::Error>> + Send;

    /// Returns whether something was removed.
    fn delete_file(&self, key: &str) -> impl Future<Output = Result<bool, Self::Error>> + Send;
}
