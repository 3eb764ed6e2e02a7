//! Saved outfits gallery.

use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use outfits_business::images::extension_for_mime;
use outfits_business::{ClothingItem, SavedOutfitWithItems};
use tabled::settings::Style;
use tabled::{Table, Tabled};
use tracing::{instrument, warn};
use uuid::Uuid;

use crate::context::{AppContext, AppGallery};
use crate::output::{Output, stars, truncate};

#[derive(Tabled)]
struct OutfitRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Top")]
    top: String,
    #[tabled(rename = "Bottom")]
    bottom: String,
    #[tabled(rename = "Rating")]
    rating: String,
    #[tabled(rename = "Photos")]
    photos: usize,
    #[tabled(rename = "Saved")]
    saved: String,
}

fn describe(item: Option<&ClothingItem>) -> String {
    match item {
        Some(item) if item.tags.is_empty() => "(untagged)".to_owned(),
        Some(item) => truncate(&item.tags.join(", "), 24),
        None => "-".to_owned(),
    }
}

impl From<&SavedOutfitWithItems> for OutfitRow {
    fn from(entry: &SavedOutfitWithItems) -> Self {
        Self {
            id: entry.outfit.id.to_string(),
            top: describe(entry.top.as_ref()),
            bottom: describe(entry.bottom.as_ref()),
            rating: stars(entry.outfit.rating),
            photos: entry.generated_photos.len(),
            saved: entry.outfit.created_at.format("%Y-%m-%d").to_string(),
        }
    }
}

#[instrument(skip_all, name = "outfits")]
pub async fn run_outfits(
    mut ctx: AppContext,
    delete: Option<Uuid>,
    rate: Option<(Uuid, u8)>,
    export: Option<PathBuf>,
) -> Result<()> {
    let out = Output::new();
    let services = ctx.ensure_authenticated().await?;
    let gallery = services.gallery();

    if let Some(id) = delete {
        gallery.delete(id).await?;
        out.success(format!("Deleted outfit {id}"));
    }
    if let Some((id, rating)) = rate {
        let outfit = gallery.rate(id, Some(rating)).await?;
        out.success(format!("Rated {id} {}", stars(outfit.rating)));
    }

    let outfits = gallery.load().await?;
    if outfits.is_empty() {
        out.dim("No saved outfits yet. Save one from `outfits wardrobe`.");
        return Ok(());
    }

    if let Some(dir) = export {
        let written = export_photos(&gallery, &outfits, &dir).await?;
        out.success(format!("Exported {written} photo(s) to {}", dir.display()));
        return Ok(());
    }

    let rows: Vec<OutfitRow> = outfits.iter().map(OutfitRow::from).collect();
    let mut table = Table::new(&rows);
    table.with(Style::rounded());
    out.print(table.to_string());
    out.count("Saved outfits", outfits.len());
    Ok(())
}

/// Writes each outfit's newest composite as `<outfit id>.<ext>`.
async fn export_photos(
    gallery: &AppGallery,
    outfits: &[SavedOutfitWithItems],
    dir: &Path,
) -> Result<usize> {
    std::fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;

    let mut written = 0;
    for entry in outfits {
        let Some(photo) = entry.latest_photo() else {
            continue;
        };
        let image = match gallery.photo(photo).await {
            Ok(image) => image,
            Err(err) => {
                warn!("Skipping outfit {}: {err}", entry.outfit.id);
                continue;
            }
        };
        let path = dir.join(format!(
            "{}.{}",
            entry.outfit.id,
            extension_for_mime(&image.mime_type)
        ));
        std::fs::write(&path, &image.bytes)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        written += 1;
    }
    Ok(written)
}
