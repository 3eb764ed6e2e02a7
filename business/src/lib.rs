//! Client-side workflows for the outfit decider: the user's closet, the
//! wardrobe picker, try-on generation, saved outfits and onboarding, over
//! Supabase and the generation proxy.

pub mod auth;
pub mod closet;
pub mod config;
pub mod data;
pub mod error;
pub mod fetch;
pub mod http;
pub mod images;
pub mod models;
pub mod onboarding;
pub mod outfits;
pub mod proxy_client;
pub mod session;
pub mod status;
pub mod storage;
pub mod tags;
pub mod user_photo;
pub mod wardrobe;

#[cfg(test)]
mod test_utils;

pub use auth::{AuthClient, AuthState, AuthStatus, AuthUser, GoTrueClient, Session, SignUpOutcome};
pub use closet::Closet;
pub use config::BusinessConfig;
pub use data::{DataError, DataService, MemoryDataService, RestDataService};
pub use error::{ActionError, ActionResult};
pub use images::ImageFile;
pub use models::{ClothingItem, ClothingType, SavedOutfit, SavedOutfitWithItems};
pub use onboarding::Onboarding;
pub use outfits::OutfitGallery;
pub use proxy_client::{NanoBananaClient, OutfitProxy};
pub use session::{GenerationHandoff, GenerationSession};
pub use storage::{FileStorage, MockFileStorage, SupabaseFileStorage};
pub use user_photo::UserPhotoManager;
pub use wardrobe::{Slot, Wardrobe};
