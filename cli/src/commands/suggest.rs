//! One-shot outfit suggestion for a vibe.

use anyhow::{Result, bail};
use outfits_business::OutfitProxy as _;
use outfits_business::proxy_client::SuggestionRequest;
use tracing::instrument;

use crate::context::AppContext;
use crate::output::Output;

#[instrument(skip_all, name = "suggest")]
pub async fn run_suggest(mut ctx: AppContext, vibe: String) -> Result<()> {
    let out = Output::new();
    if vibe.trim().is_empty() {
        bail!("Describe a vibe, e.g. `outfits suggest \"casual friday\"`");
    }

    let services = ctx.ensure_authenticated().await?;
    let mut wardrobe = services.wardrobe().await?;
    if !wardrobe.has_both_types() {
        bail!("Suggestions need at least one top and one bottom in your closet");
    }

    out.dim("Asking for a suggestion...");
    let request = SuggestionRequest::from_wardrobe(&vibe, wardrobe.tops(), wardrobe.bottoms());
    let suggestion = services.proxy.suggest_outfit(request).await?;

    // The next wardrobe session opens on the suggested pair
    wardrobe.select(Some(suggestion.top_id), Some(suggestion.bottom_id));
    wardrobe.settle().await;

    out.success(format!("Suggested for \"{}\"", vibe.trim()));
    out.slots(&wardrobe);
    if !suggestion.reasoning.is_empty() {
        out.newline();
        out.print(&suggestion.reasoning);
    }
    Ok(())
}
