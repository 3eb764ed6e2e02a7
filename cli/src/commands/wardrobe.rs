//! Interactive wardrobe: cycle tops and bottoms, try them on, save favorites.
//!
//! The generation session only lives for this process; leaving the wardrobe
//! drops any unsaved composite.

use std::fmt;
use std::path::PathBuf;

use anyhow::{Context as _, Result};
use inquire::{Select, Text};
use outfits_business::fetch::load_image;
use outfits_business::images::extension_for_mime;
use outfits_business::proxy_client::SuggestionRequest;
use outfits_business::{ActionError, OutfitProxy as _, Slot};
use tracing::{info, instrument};

use crate::context::{AppContext, AppSession, AppWardrobe, Services};
use crate::output::{Output, stars};
use crate::terminal::{self, Protocol};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    NextTop,
    PreviousTop,
    NextBottom,
    PreviousBottom,
    Random,
    Describe,
    Generate,
    Show,
    Reset,
    Save,
    Export,
    Reload,
    Quit,
}

impl Action {
    const ALL: [Self; 13] = [
        Self::NextTop,
        Self::PreviousTop,
        Self::NextBottom,
        Self::PreviousBottom,
        Self::Random,
        Self::Describe,
        Self::Generate,
        Self::Show,
        Self::Reset,
        Self::Save,
        Self::Export,
        Self::Reload,
        Self::Quit,
    ];
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::NextTop => "Next top",
            Self::PreviousTop => "Previous top",
            Self::NextBottom => "Next bottom",
            Self::PreviousBottom => "Previous bottom",
            Self::Random => "Random outfit",
            Self::Describe => "Describe a vibe",
            Self::Generate => "Generate try-on",
            Self::Show => "Show photo",
            Self::Reset => "Reset photo",
            Self::Save => "Save outfit",
            Self::Export => "Export image",
            Self::Reload => "Reload closet",
            Self::Quit => "Quit",
        })
    }
}

/// Rating choices; the last one saves unrated.
const RATING_CHOICES: [&str; 6] = ["★★★★★", "★★★★☆", "★★★☆☆", "★★☆☆☆", "★☆☆☆☆", "No rating"];

fn rating_from_choice(choice: &str) -> Option<u8> {
    let filled = choice.chars().filter(|c| *c == '★').count();
    u8::try_from(filled).ok().filter(|r| *r > 0)
}

struct Screen {
    services: Services,
    wardrobe: AppWardrobe,
    session: AppSession,
    subject_url: Option<String>,
    protocol: Protocol,
    out: Output,
}

#[instrument(skip_all, name = "wardrobe")]
pub async fn run_wardrobe(mut ctx: AppContext, display: String) -> Result<()> {
    let protocol = terminal::parse_format(&display)?;
    let services = ctx.ensure_authenticated().await?;

    let (wardrobe, subject) = tokio::try_join!(services.wardrobe(), async {
        services
            .user_photos()
            .current()
            .await
            .context("Failed to load your photo")
    })?;

    let mut screen = Screen {
        session: services.generation(),
        services,
        wardrobe,
        subject_url: subject.map(|photo| photo.image_url),
        protocol,
        out: Output::new(),
    };
    screen.run().await
}

impl Screen {
    async fn run(&mut self) -> Result<()> {
        if !self.wardrobe.has_items() {
            self.out
                .warning("Your closet is empty. Add clothes with `outfits upload top|bottom <file>`.");
        }
        if self.subject_url.is_none() {
            self.out
                .warning("No photo of you yet. Add one with `outfits photo set <file>`.");
        }

        loop {
            self.render();
            let action = Select::new("What next?", Action::ALL.to_vec())
                .with_page_size(Action::ALL.len())
                .prompt_skippable()
                .context("Failed to read action")?
                .unwrap_or(Action::Quit);

            if action == Action::Quit {
                break;
            }
            // Failed actions are reported and the session carries on
            if let Err(err) = self.apply(action).await {
                self.out.error(format!("{err:#}"));
            }
        }

        self.wardrobe.settle().await;
        Ok(())
    }

    fn render(&self) {
        self.out.newline();
        self.out.divider(40);
        self.out.slots(&self.wardrobe);
        let showing = match self.session.generated_url() {
            Some(_) => "try-on result (unsaved)",
            None if self.subject_url.is_some() => "your photo",
            None => "nothing yet",
        };
        self.out.labeled_indent("Showing", showing, 2);
        if let Some(error) = self.session.status().error() {
            self.out.labeled_indent("Last error", error, 2);
        }
        self.out.divider(40);
    }

    async fn apply(&mut self, action: Action) -> Result<()> {
        match action {
            Action::NextTop => self.wardrobe.next(Slot::Top),
            Action::PreviousTop => self.wardrobe.previous(Slot::Top),
            Action::NextBottom => self.wardrobe.next(Slot::Bottom),
            Action::PreviousBottom => self.wardrobe.previous(Slot::Bottom),
            Action::Random => self.wardrobe.randomize(),
            Action::Describe => self.describe().await?,
            Action::Generate => self.generate().await?,
            Action::Show => self.show().await?,
            Action::Reset => self.reset().await?,
            Action::Save => self.save().await?,
            Action::Export => self.export().await?,
            Action::Reload => {
                self.wardrobe.reload().await?;
                let subject = self
                    .services
                    .user_photos()
                    .current()
                    .await?
                    .map(|photo| photo.image_url);
                if subject != self.subject_url {
                    // A new or removed photo invalidates the composite and its backup
                    self.session.subject_changed();
                    self.subject_url = subject;
                }
            }
            Action::Quit => {}
        }
        Ok(())
    }

    async fn describe(&mut self) -> Result<()> {
        if !self.wardrobe.has_both_types() {
            self.out
                .warning("Suggestions need at least one top and one bottom");
            return Ok(());
        }
        let Some(vibe) = Text::new("Describe the vibe:")
            .with_help_message("e.g. cozy weekend, first date, job interview")
            .prompt_skippable()
            .context("Failed to read vibe")?
            .filter(|vibe| !vibe.trim().is_empty())
        else {
            return Ok(());
        };

        self.out.dim("Thinking...");
        let request =
            SuggestionRequest::from_wardrobe(&vibe, self.wardrobe.tops(), self.wardrobe.bottoms());
        let suggestion = self.services.proxy.suggest_outfit(request).await?;
        self.wardrobe
            .select(Some(suggestion.top_id), Some(suggestion.bottom_id));
        if !suggestion.reasoning.is_empty() {
            self.out.info(&suggestion.reasoning);
        }
        Ok(())
    }

    async fn generate(&mut self) -> Result<()> {
        let instruction = Text::new("Extra instruction (optional):")
            .with_help_message("Leave empty for the default try-on")
            .prompt_skippable()
            .context("Failed to read instruction")?
            .map(|text| text.trim().to_owned())
            .filter(|text| !text.is_empty());

        self.out.dim("Generating your try-on...");
        let top = self.wardrobe.current_top().cloned();
        let bottom = self.wardrobe.current_bottom().cloned();
        self.session
            .generate(
                self.subject_url.as_deref(),
                top.as_ref(),
                bottom.as_ref(),
                instruction,
            )
            .await?;
        info!("try-on generated");
        self.out.success("Try-on ready");
        self.show().await
    }

    /// The composite if there is one, else the subject photo.
    async fn show(&self) -> Result<()> {
        let Some(url) = self.session.displayed_subject(self.subject_url.as_deref()) else {
            self.out.dim("Nothing to show yet");
            return Ok(());
        };
        let image = load_image(&self.services.storage, url).await?;
        if !terminal::display(self.protocol, &image)? {
            self.out
                .dim("This terminal can't show images inline; use Export image to save it");
        }
        Ok(())
    }

    /// Drops the composite and shows the photo cached before the first try-on.
    async fn reset(&mut self) -> Result<()> {
        let Some(backup) = self.session.reset().map(str::to_owned) else {
            return self.show().await;
        };
        self.out.info("Showing your original photo");
        let image = load_image(&self.services.storage, &backup).await?;
        terminal::display(self.protocol, &image)?;
        Ok(())
    }

    async fn save(&mut self) -> Result<()> {
        if self.session.generated_url().is_none() {
            return Err(ActionError::NothingToSave.into());
        }
        let choice = Select::new("Rate this outfit:", RATING_CHOICES.to_vec())
            .prompt_skippable()
            .context("Failed to read rating")?;
        let Some(choice) = choice else {
            return Ok(());
        };

        let rating = rating_from_choice(choice);
        let saved = self.session.save(rating).await?;
        self.out.success(format!(
            "Saved outfit {} {}",
            saved.outfit.id,
            stars(saved.outfit.rating)
        ));
        Ok(())
    }

    async fn export(&self) -> Result<()> {
        let Some(url) = self.session.displayed_subject(self.subject_url.as_deref()) else {
            self.out.dim("Nothing to export yet");
            return Ok(());
        };
        let image = load_image(&self.services.storage, url).await?;
        let default_name = format!("outfit.{}", extension_for_mime(&image.mime_type));
        let Some(path) = Text::new("Save to:")
            .with_default(&default_name)
            .prompt_skippable()
            .context("Failed to read path")?
        else {
            return Ok(());
        };

        let path = PathBuf::from(path);
        std::fs::write(&path, &image.bytes)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        self.out.success(format!("Wrote {}", path.display()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rating_choices() {
        assert_eq!(rating_from_choice(RATING_CHOICES[0]), Some(5));
        assert_eq!(rating_from_choice(RATING_CHOICES[2]), Some(3));
        assert_eq!(rating_from_choice(RATING_CHOICES[4]), Some(1));
        assert_eq!(rating_from_choice("No rating"), None);
    }

    #[test]
    fn test_every_action_is_listed_once() {
        let labels: std::collections::BTreeSet<String> =
            Action::ALL.iter().map(ToString::to_string).collect();
        assert_eq!(labels.len(), Action::ALL.len());
        assert_eq!(Action::ALL.last(), Some(&Action::Quit));
    }
}
