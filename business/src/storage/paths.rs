//! Buckets, object paths, and the public URL shape.

use std::fmt::Display;
use uuid::Uuid;

use crate::images::extension_for_mime;

const PUBLIC_SEGMENT: &str = "/storage/v1/object/public/";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bucket {
    ClothingItems,
    UserPhotos,
    GeneratedPhotos,
}

impl Bucket {
    pub const ALL: [Bucket; 3] = [Self::ClothingItems, Self::UserPhotos, Self::GeneratedPhotos];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::ClothingItems => "clothing-items",
            Self::UserPhotos => "user-photos",
            Self::GeneratedPhotos => "generated-photos",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|bucket| bucket.as_str() == name)
    }

    /// Storage key for `path` in this bucket.
    pub fn key(self, path: &str) -> String {
        format!("{}/{path}", self.as_str())
    }
}

impl Display for Bucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `clothing-items/{user}/{item}.jpg`
pub fn clothing_item_key(user_id: Uuid, item_id: Uuid) -> String {
    Bucket::ClothingItems.key(&format!("{user_id}/{item_id}.jpg"))
}

/// `user-photos/{user}/photo.{jpg|png}`
pub fn user_photo_key(user_id: Uuid, mime_type: &str) -> String {
    Bucket::UserPhotos.key(&format!("{user_id}/photo.{}", extension_for_mime(mime_type)))
}

/// Both possible user photo keys; replacing a photo clears them all.
pub fn all_user_photo_keys(user_id: Uuid) -> [String; 2] {
    [
        Bucket::UserPhotos.key(&format!("{user_id}/photo.jpg")),
        Bucket::UserPhotos.key(&format!("{user_id}/photo.png")),
    ]
}

/// `generated-photos/{user}/{photo}.{jpg|png}`
pub fn generated_photo_key(user_id: Uuid, photo_id: Uuid, mime_type: &str) -> String {
    Bucket::GeneratedPhotos.key(&format!(
        "{user_id}/{photo_id}.{}",
        extension_for_mime(mime_type)
    ))
}

/// Splits a key into bucket and object path.
pub fn split_key(key: &str) -> Option<(Bucket, &str)> {
    let (bucket, path) = key.split_once('/')?;
    let bucket = Bucket::parse(bucket)?;
    (!path.is_empty()).then_some((bucket, path))
}

/// `{supabase_url}/storage/v1/object/public/{key}`
pub fn public_url(supabase_url: &str, key: &str) -> String {
    format!("{}{PUBLIC_SEGMENT}{key}", supabase_url.trim_end_matches('/'))
}

/// Recovers the storage key from a public URL, ignoring any query string.
pub fn key_from_public_url(url: &str) -> Option<String> {
    let (_, rest) = url.split_once(PUBLIC_SEGMENT)?;
    let key = rest.split(['?', '#']).next()?;
    split_key(key).map(|_| key.to_owned())
}
