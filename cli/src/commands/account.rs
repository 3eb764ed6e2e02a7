//! Sign up, sign in, sign out.

use anyhow::{Context as _, Result, bail};
use outfits_business::auth::{AuthStatus, SignUpOutcome};
use tracing::{info, instrument};

use crate::context::{AppContext, prompt_credentials};
use crate::output::Output;

#[instrument(skip_all, name = "signup")]
pub async fn run_signup(mut ctx: AppContext) -> Result<()> {
    let out = Output::new();
    out.header("Create your account");
    out.newline();

    let (email, password) = prompt_credentials(None)?;
    let confirm = rpassword::prompt_password("Confirm password: ").context("Failed to read password")?;
    if confirm != password {
        bail!("Passwords do not match");
    }

    match ctx.auth.sign_up(&email, &password).await.context("Sign up failed")? {
        SignUpOutcome::SignedIn(session) => {
            ctx.save_session()?;
            info!(user = %session.user.id, "signed up");
            out.success(format!("Welcome, {email}"));
            out.info("Run `outfits onboarding` for a quick tour");
        }
        SignUpOutcome::ConfirmationRequired(_) => {
            out.success("Account created");
            out.info("Check your email to confirm it, then run `outfits login`");
        }
    }
    Ok(())
}

#[instrument(skip_all, name = "login")]
pub async fn run_login(mut ctx: AppContext) -> Result<()> {
    let out = Output::new();
    out.header("Sign in");
    out.newline();

    let session = ctx.prompt_sign_in().await?;
    ctx.save_session()?;

    out.newline();
    out.success(format!(
        "Signed in as {}",
        session.user.email.as_deref().unwrap_or("your account")
    ));
    out.dim(format!("Session saved to {}", crate::config::Config::config_path()?.display()));
    if !session.user.onboarding_completed() {
        out.info("New here? Run `outfits onboarding`");
    }
    Ok(())
}

#[instrument(skip_all, name = "logout")]
pub async fn run_logout(mut ctx: AppContext) -> Result<()> {
    let out = Output::new();
    let Some(saved) = ctx.config.session() else {
        out.dim("Not signed in.");
        return Ok(());
    };

    // Only a live session can be revoked remotely
    if matches!(ctx.auth.restore(Some(saved)).await, AuthStatus::SignedIn(_)) {
        ctx.auth.sign_out().await;
    }
    ctx.config.clear_auth();
    ctx.config.save()?;
    out.success("Signed out");
    Ok(())
}

#[instrument(skip_all, name = "whoami")]
pub async fn run_whoami(mut ctx: AppContext) -> Result<()> {
    let out = Output::new();
    match ctx.auth.restore(ctx.config.session()).await {
        AuthStatus::SignedIn(session) => {
            ctx.save_session()?;
            out.labeled_indent("Email", session.user.email.as_deref().unwrap_or("-"), 0);
            out.labeled_indent("User ID", session.user.id, 0);
            out.labeled_indent(
                "Walkthrough",
                if session.user.onboarding_completed() {
                    "completed"
                } else {
                    "not completed"
                },
                0,
            );
        }
        AuthStatus::SignedOut | AuthStatus::Loading => {
            out.dim("Not signed in. Run `outfits login`.");
        }
    }
    Ok(())
}
