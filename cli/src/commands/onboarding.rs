//! First-run walkthrough, one coachmark per invocation.

use anyhow::{Context as _, Result};
use outfits_business::Onboarding;
use outfits_business::onboarding::Progress;
use tracing::instrument;

use crate::cli::OnboardingAction;
use crate::context::AppContext;
use crate::output::Output;

/// Where each step's control lives in the CLI.
fn command_hint(step: usize) -> &'static str {
    match step {
        0 => "outfits photo set <file>",
        1 => "outfits upload top <file>",
        2 => "outfits upload bottom <file>",
        3 => "outfits wardrobe, then Generate try-on",
        _ => "outfits wardrobe, then Save outfit",
    }
}

#[instrument(skip_all, name = "onboarding")]
pub async fn run_onboarding(mut ctx: AppContext, action: Option<OnboardingAction>) -> Result<()> {
    let out = Output::new();
    ctx.ensure_authenticated().await?;

    let mut onboarding = Onboarding::resume(ctx.config.onboarding.step, ctx.auth.onboarding_completed());
    if !onboarding.is_active() {
        out.dim("Walkthrough already completed.");
        return Ok(());
    }

    let progress = match action.unwrap_or(OnboardingAction::Status) {
        OnboardingAction::Status => onboarding
            .step_index()
            .map_or(Progress::Inactive, Progress::Step),
        OnboardingAction::Next => onboarding.next(),
        OnboardingAction::Previous => onboarding.previous(),
        OnboardingAction::Skip => onboarding.skip(),
    };

    match progress {
        Progress::Step(index) => {
            ctx.config.onboarding.step = Some(index);
            ctx.config.save()?;
            if let Some(step) = onboarding.current() {
                out.coachmark(index, step);
                out.labeled_indent("Try", command_hint(index), 2);
            }
        }
        Progress::Complete => {
            ctx.auth
                .complete_onboarding()
                .await
                .context("Failed to record walkthrough completion")?;
            onboarding.finish();
            ctx.config.onboarding.step = None;
            ctx.save_session()?;
            out.success("You're all set. Have fun deciding!");
        }
        Progress::Inactive => out.dim("Walkthrough already completed."),
    }
    Ok(())
}
