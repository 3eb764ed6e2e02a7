use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use outfits_business::ClothingType;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "outfits")]
#[command(about = "Try clothes on virtually and decide what to wear", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Show timing/latency information
    #[arg(long, global = true)]
    pub timing: bool,

    /// Enable verbose debug output
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Kind {
    Top,
    Bottom,
}

impl From<Kind> for ClothingType {
    fn from(kind: Kind) -> Self {
        match kind {
            Kind::Top => Self::Top,
            Kind::Bottom => Self::Bottom,
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create an account
    Signup,
    /// Sign in with email and password
    Login,
    /// Sign out and forget the saved session
    Logout,
    /// Show the signed-in account
    Whoami,

    /// Upload a top or bottom to your closet
    Upload {
        #[arg(value_enum)]
        kind: Kind,

        /// JPEG or PNG image, under 5MB
        file: PathBuf,

        /// Tag the item (repeatable)
        #[arg(long, short = 't')]
        tag: Vec<String>,
    },
    /// List closet items
    Items {
        /// Only tops or only bottoms
        #[arg(long = "type", value_enum)]
        kind: Option<Kind>,

        /// Only items carrying every given tag (repeatable)
        #[arg(long, short = 't')]
        tag: Vec<String>,
    },
    /// Edit an item's tags
    Tags {
        id: Uuid,

        #[arg(long, short = 'a')]
        add: Vec<String>,

        #[arg(long, short = 'r')]
        remove: Vec<String>,
    },
    /// Delete a closet item and its image
    Delete {
        id: Uuid,

        /// Skip the confirmation prompt
        #[arg(long, short = 'y')]
        yes: bool,
    },

    /// Manage the photo of yourself used for try-ons
    Photo {
        #[command(subcommand)]
        action: PhotoAction,
    },

    /// Browse saved outfits
    Outfits {
        /// Delete a saved outfit and its generated photos
        #[arg(long)]
        delete: Option<Uuid>,

        /// Change a saved outfit's rating (1-5)
        #[arg(long, requires = "rating")]
        rate: Option<Uuid>,

        #[arg(long, value_parser = clap::value_parser!(u8).range(1..=5))]
        rating: Option<u8>,

        /// Write each outfit's latest generated photo into this directory
        #[arg(long)]
        export: Option<PathBuf>,
    },

    /// Interactive wardrobe: cycle outfits, generate try-ons, save favorites
    Wardrobe {
        /// Inline image display: auto, kitty, iterm, none
        #[arg(long, default_value = "auto")]
        display: String,
    },

    /// Ask for an outfit matching a vibe
    Suggest {
        vibe: String,
    },

    /// First-run walkthrough
    Onboarding {
        #[command(subcommand)]
        action: Option<OnboardingAction>,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand)]
pub enum PhotoAction {
    /// Show the current photo
    Show {
        /// Inline image display: auto, kitty, iterm, none
        #[arg(long, default_value = "auto")]
        display: String,
    },
    /// Replace the photo
    Set { file: PathBuf },
    /// Remove the photo
    Delete,
}

#[derive(Subcommand, Clone, Copy)]
pub enum OnboardingAction {
    /// Show the current step
    Status,
    Next,
    Previous,
    /// Finish the walkthrough now
    Skip,
}
