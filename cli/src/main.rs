//! `outfits`: the terminal front end of the outfit decider.

#![allow(clippy::exit)]

mod cli;
mod commands;
mod config;
mod context;
mod output;
mod terminal;
mod timing;

use anyhow::Result;
use clap::Parser as _;
use tracing::{debug, instrument};

use crate::cli::{Cli, Commands};
use crate::context::AppContext;
use crate::output::Output;

#[tokio::main]
async fn main() {
    // A missing .env is fine; the variables may come from the shell
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    timing::init_tracing(cli.verbose, cli.timing);

    if let Err(err) = run(cli.command).await {
        Output::new().error(format!("{err:#}"));
        std::process::exit(1);
    }
}

#[instrument(skip_all, name = "command")]
async fn run(command: Commands) -> Result<()> {
    if let Commands::Completions { shell } = command {
        commands::generate_completions(shell);
        return Ok(());
    }

    let ctx = AppContext::load()?;
    debug!(supabase = %ctx.business.supabase_url, proxy = %ctx.business.nano_banana_base_url, "configured");

    match command {
        Commands::Signup => commands::run_signup(ctx).await,
        Commands::Login => commands::run_login(ctx).await,
        Commands::Logout => commands::run_logout(ctx).await,
        Commands::Whoami => commands::run_whoami(ctx).await,
        Commands::Upload { kind, file, tag } => {
            commands::run_upload(ctx, kind.into(), file, tag).await
        }
        Commands::Items { kind, tag } => commands::run_items(ctx, kind.map(Into::into), tag).await,
        Commands::Tags { id, add, remove } => commands::run_tags(ctx, id, add, remove).await,
        Commands::Delete { id, yes } => commands::run_delete(ctx, id, yes).await,
        Commands::Photo { action } => commands::run_photo(ctx, action).await,
        Commands::Outfits {
            delete,
            rate,
            rating,
            export,
        } => commands::run_outfits(ctx, delete, rate.zip(rating), export).await,
        Commands::Wardrobe { display } => commands::run_wardrobe(ctx, display).await,
        Commands::Suggest { vibe } => commands::run_suggest(ctx, vibe).await,
        Commands::Onboarding { action } => commands::run_onboarding(ctx, action).await,
        Commands::Completions { .. } => Ok(()),
    }
}
