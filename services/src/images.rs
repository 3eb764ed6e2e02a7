//! Turning image references from the front end into inline model parts.
//!
//! A reference is either a public URL (fetched over HTTP) or a `data:` URL
//! the client already holds, such as a previous composite.

use base64::{Engine as _, engine::general_purpose::STANDARD};
use reqwest::{Client, header::CONTENT_TYPE};
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::gemini::Part;

/// Query parameter the front end appends to bust storage caches.
pub const CACHE_BUST_PARAM: &str = "t";

pub const JPEG: &str = "image/jpeg";
pub const PNG: &str = "image/png";

#[derive(Debug, Error)]
pub enum ImageFetchError {
    #[error("Failed to fetch {url}: {status}")]
    Status { url: String, status: u16 },

    #[error("Failed to fetch {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Invalid image reference: {0}")]
    InvalidReference(String),
}

/// Image bytes, already base64 encoded, ready for an inline part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    pub mime_type: String,
    pub data: String,
}

impl EncodedImage {
    pub fn into_part(self) -> Part {
        Part::inline(self.mime_type, self.data)
    }
}

/// Removes the cache-busting `t` parameter, leaving every other parameter in place.
///
/// Anything that does not parse as an absolute URL is returned unchanged.
pub fn strip_cache_param(raw: &str) -> String {
    let Ok(mut url) = Url::parse(raw) else {
        return raw.to_owned();
    };
    if !url.query_pairs().any(|(key, _)| key == CACHE_BUST_PARAM) {
        return raw.to_owned();
    }

    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| key != CACHE_BUST_PARAM)
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    if kept.is_empty() {
        url.set_query(None);
    } else {
        url.query_pairs_mut().clear().extend_pairs(kept);
    }
    url.into()
}

/// Splits `data:<mime>;base64,<payload>`, checking that the payload decodes.
pub fn parse_data_url(reference: &str) -> Result<EncodedImage, ImageFetchError> {
    let invalid = || ImageFetchError::InvalidReference("malformed data URL".to_owned());

    let rest = reference.strip_prefix("data:").ok_or_else(invalid)?;
    let (meta, payload) = rest.split_once(',').ok_or_else(invalid)?;
    let mime_type = meta.strip_suffix(";base64").ok_or_else(invalid)?;
    if !mime_type.starts_with("image/") {
        return Err(ImageFetchError::InvalidReference(format!(
            "unsupported data URL type {mime_type}"
        )));
    }
    STANDARD.decode(payload).map_err(|_| invalid())?;

    Ok(EncodedImage {
        mime_type: mime_type.to_owned(),
        data: payload.to_owned(),
    })
}

fn content_type_image(value: Option<&str>) -> Option<String> {
    let essence = value?.split(';').next()?.trim().to_ascii_lowercase();
    essence.starts_with("image/").then_some(essence)
}

/// Loads one reference and base64 encodes it.
///
/// The MIME type comes from the response's `Content-Type` when it names an
/// image, otherwise `fallback_mime`.
pub async fn fetch_as_base64(
    client: &Client,
    reference: &str,
    fallback_mime: &str,
) -> Result<EncodedImage, ImageFetchError> {
    if reference.starts_with("data:") {
        return parse_data_url(reference);
    }

    let url = strip_cache_param(reference);
    let response = client
        .get(&url)
        .send()
        .await
        .map_err(|source| ImageFetchError::Transport {
            url: url.clone(),
            source,
        })?;

    let status = response.status();
    if !status.is_success() {
        return Err(ImageFetchError::Status {
            url,
            status: status.as_u16(),
        });
    }

    let mime_type = content_type_image(
        response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok()),
    )
    .unwrap_or_else(|| fallback_mime.to_owned());

    let bytes = response
        .bytes()
        .await
        .map_err(|source| ImageFetchError::Transport {
            url: url.clone(),
            source,
        })?;
    debug!(%url, %mime_type, bytes = bytes.len(), "Fetched image");

    Ok(EncodedImage {
        mime_type,
        data: STANDARD.encode(&bytes),
    })
}

/// Fetches an optional reference; blank strings count as absent.
pub async fn fetch_optional(
    client: &Client,
    reference: Option<&str>,
    fallback_mime: &str,
) -> Result<Option<EncodedImage>, ImageFetchError> {
    match reference.map(str::trim).filter(|r| !r.is_empty()) {
        Some(reference) => fetch_as_base64(client, reference, fallback_mime)
            .await
            .map(Some),
        None => Ok(None),
    }
}
