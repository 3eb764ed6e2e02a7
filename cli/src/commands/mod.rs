//! Command implementations for the outfits CLI.
//!
//! Each screen of the app is one module.

pub mod account;
pub mod closet;
pub mod completions;
pub mod onboarding;
pub mod outfits;
pub mod photo;
pub mod suggest;
pub mod wardrobe;

use std::path::Path;

use anyhow::{Context as _, Result};
use outfits_business::ImageFile;
use outfits_business::images;

pub use account::{run_login, run_logout, run_signup, run_whoami};
pub use closet::{run_delete, run_items, run_tags, run_upload};
pub use completions::generate_completions;
pub use onboarding::run_onboarding;
pub use outfits::run_outfits;
pub use photo::run_photo;
pub use suggest::run_suggest;
pub use wardrobe::run_wardrobe;

/// Reads an image file, typing it by content and then by extension.
pub fn read_image(path: &Path) -> Result<ImageFile> {
    let bytes = std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let mime_type = images::sniff_mime(&bytes).map_or_else(
        || mime_guess::from_path(path).first_or_octet_stream().to_string(),
        str::to_owned,
    );
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_owned());
    Ok(ImageFile::new(name, mime_type, bytes))
}
