//! Upload, storage and tag screens.

use std::path::PathBuf;

use anyhow::{Context as _, Result, bail};
use inquire::Confirm;
use outfits_business::tags::{TagEditor, TagFilter};
use outfits_business::{ClothingItem, ClothingType, DataService as _};
use tabled::settings::Style;
use tabled::{Table, Tabled};
use tracing::instrument;
use uuid::Uuid;

use super::read_image;
use crate::context::AppContext;
use crate::output::{Output, truncate};

#[derive(Tabled)]
struct ItemRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Type")]
    kind: String,
    #[tabled(rename = "Tags")]
    tags: String,
    #[tabled(rename = "Added")]
    added: String,
}

impl From<&ClothingItem> for ItemRow {
    fn from(item: &ClothingItem) -> Self {
        Self {
            id: item.id.to_string(),
            kind: item.clothing_type.to_string(),
            tags: truncate(&item.tags.join(", "), 40),
            added: item.created_at.format("%Y-%m-%d").to_string(),
        }
    }
}

#[instrument(skip_all, name = "upload", fields(kind = %kind))]
pub async fn run_upload(
    mut ctx: AppContext,
    kind: ClothingType,
    file: PathBuf,
    tags: Vec<String>,
) -> Result<()> {
    let out = Output::new();
    let image = read_image(&file)?;
    let services = ctx.ensure_authenticated().await?;

    out.dim(format!("Uploading {}...", file.display()));
    let item = services.closet().upload(kind, image, tags).await?;

    out.success(format!("Added {kind} {}", item.id));
    if !item.tags.is_empty() {
        out.labeled_indent("Tags", item.tags.join(", "), 2);
    }
    Ok(())
}

#[instrument(skip_all, name = "items")]
pub async fn run_items(
    mut ctx: AppContext,
    kind: Option<ClothingType>,
    tags: Vec<String>,
) -> Result<()> {
    let out = Output::new();
    let services = ctx.ensure_authenticated().await?;
    let closet = services.closet();

    let filter = TagFilter::new(&tags);
    let (items, all_tags) = tokio::try_join!(closet.list(kind, &filter), closet.all_tags())?;

    if items.is_empty() {
        if filter.is_empty() {
            out.dim("Your closet is empty. Add something with `outfits upload`.");
        } else {
            out.dim("No items carry all of those tags.");
        }
        return Ok(());
    }

    let rows: Vec<ItemRow> = items.iter().map(ItemRow::from).collect();
    let mut table = Table::new(&rows);
    table.with(Style::rounded());
    out.print(table.to_string());
    out.count("Shown", items.len());
    if !all_tags.is_empty() {
        out.labeled_indent("All tags", all_tags.join(", "), 0);
    }
    Ok(())
}

#[instrument(skip_all, name = "tags", fields(%id))]
pub async fn run_tags(mut ctx: AppContext, id: Uuid, add: Vec<String>, remove: Vec<String>) -> Result<()> {
    let out = Output::new();
    let services = ctx.ensure_authenticated().await?;

    let item = services
        .data
        .get_clothing_item(id)
        .await?
        .filter(|item| item.user_id == services.user_id)
        .with_context(|| format!("Clothing item {id} not found"))?;

    if add.is_empty() && remove.is_empty() {
        out.labeled_indent("Tags", display_tags(&item.tags), 0);
        return Ok(());
    }

    let mut editor = TagEditor::new(&item.tags);
    for tag in &remove {
        if !editor.remove(tag) {
            out.warning(format!("`{tag}` was not on this item"));
        }
    }
    for tag in &add {
        if !editor.add(tag) {
            out.warning(format!("Skipped `{tag}`: blank or already present"));
        }
    }

    let updated = services.closet().retag(id, editor.into_tags()).await?;
    out.success("Tags updated");
    out.labeled_indent("Tags", display_tags(&updated.tags), 2);
    Ok(())
}

fn display_tags(tags: &[String]) -> String {
    if tags.is_empty() {
        "(none)".to_owned()
    } else {
        tags.join(", ")
    }
}

#[instrument(skip_all, name = "delete", fields(%id))]
pub async fn run_delete(mut ctx: AppContext, id: Uuid, yes: bool) -> Result<()> {
    let out = Output::new();
    let services = ctx.ensure_authenticated().await?;

    if !yes {
        let confirmed = Confirm::new("Delete this item and its image?")
            .with_default(false)
            .prompt()
            .context("Failed to read confirmation")?;
        if !confirmed {
            bail!("Cancelled");
        }
    }

    services.closet().delete(id).await?;
    out.success(format!("Deleted {id}"));
    Ok(())
}
