//! The photo of yourself every try-on starts from.

use anyhow::Result;
use outfits_business::fetch::load_image;
use tracing::instrument;

use super::read_image;
use crate::cli::PhotoAction;
use crate::context::AppContext;
use crate::output::Output;
use crate::terminal;

#[instrument(skip_all, name = "photo")]
pub async fn run_photo(mut ctx: AppContext, action: PhotoAction) -> Result<()> {
    let out = Output::new();
    let services = ctx.ensure_authenticated().await?;
    let photos = services.user_photos();

    match action {
        PhotoAction::Show { display } => {
            let protocol = terminal::parse_format(&display)?;
            let Some(photo) = photos.current().await? else {
                out.dim("No photo yet. Add one with `outfits photo set <file>`.");
                return Ok(());
            };
            out.labeled_indent("URL", &photo.image_url, 0);
            out.labeled_indent("Updated", photo.updated_at.format("%Y-%m-%d %H:%M"), 0);
            let image = load_image(&services.storage, &photo.image_url).await?;
            terminal::display(protocol, &image)?;
        }
        PhotoAction::Set { file } => {
            let image = read_image(&file)?;
            out.dim(format!("Uploading {}...", file.display()));
            let photo = photos.replace(image).await?;
            out.success("Photo updated");
            out.labeled_indent("URL", photo.image_url, 2);
        }
        PhotoAction::Delete => {
            photos.delete().await?;
            out.success("Photo removed");
        }
    }
    Ok(())
}
