//! Getting image bytes back from whatever reference the app holds.

use crate::error::{ActionError, ActionResult};
use crate::http::Client;
use crate::images::{self, ImageFile, JPEG, PNG};
use crate::storage::FileStorage;
use crate::storage::paths::key_from_public_url;

/// Resolves a data URL, a public storage URL, or any other http(s) URL.
///
/// Bytes are returned exactly as stored. The MIME type comes from the data
/// URL header, then the bytes, then the response's Content-Type.
pub async fn load_image<S: FileStorage>(storage: &S, reference: &str) -> ActionResult<ImageFile> {
    if reference.starts_with("data:") {
        let (declared, bytes) = images::parse_data_url(reference)?;
        let mime_type = if declared.is_empty() {
            PNG.to_owned()
        } else {
            declared
        };
        return Ok(ImageFile::new("image", mime_type, bytes));
    }

    if let Some(key) = key_from_public_url(reference) {
        let bytes = storage
            .download_file(&key)
            .await
            .map_err(|e| ActionError::Download(e.to_string()))?;
        let mime_type = images::sniff_mime(&bytes).unwrap_or(JPEG);
        let name = key.rsplit('/').next().unwrap_or("image").to_owned();
        return Ok(ImageFile::new(name, mime_type, bytes));
    }

    let response = Client::get(reference).send().await?;
    if !response.is_success() {
        return Err(ActionError::Download(format!(
            "{reference} returned {}",
            response.status
        )));
    }
    let mime_type = images::sniff_mime(&response.body)
        .map(str::to_owned)
        .or_else(|| {
            response
                .header("content-type")
                .map(|ct| ct.split(';').next().unwrap_or(ct).trim().to_owned())
        })
        .unwrap_or_else(|| JPEG.to_owned());
    Ok(ImageFile::new("image", mime_type, response.body))
}
