//! Service wiring for commands: configuration, the saved session, and the
//! business clients acting as the signed-in user.

use anyhow::{Context as _, Result, bail};
use inquire::Text;
use outfits_business::auth::{AuthState, AuthStatus, GoTrueClient, Session};
use outfits_business::{
    BusinessConfig, Closet, GenerationSession, NanoBananaClient, OutfitGallery, RestDataService,
    SupabaseFileStorage, UserPhotoManager, Wardrobe,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::config::Config;
use crate::output::Output;

pub type AppCloset = Closet<RestDataService, SupabaseFileStorage>;
pub type AppGallery = OutfitGallery<RestDataService, SupabaseFileStorage>;
pub type AppUserPhotos = UserPhotoManager<RestDataService, SupabaseFileStorage>;
pub type AppSession = GenerationSession<RestDataService, SupabaseFileStorage, NanoBananaClient>;
pub type AppWardrobe = Wardrobe<RestDataService>;

/// Everything a command needs before it talks to a backend.
pub struct AppContext {
    pub business: BusinessConfig,
    pub config: Config,
    pub auth: AuthState<GoTrueClient>,
}

impl AppContext {
    pub fn load() -> Result<Self> {
        let business = BusinessConfig::from_env().context(
            "Missing backend configuration (set SUPABASE_URL and SUPABASE_ANON_KEY, or add them to .env)",
        )?;
        let config = Config::load()?;
        let auth = AuthState::new(GoTrueClient::new(business.clone()));
        Ok(Self {
            business,
            config,
            auth,
        })
    }

    /// Persists whatever session the auth state holds now.
    pub fn save_session(&mut self) -> Result<()> {
        match self.auth.session() {
            Some(session) => self.config.set_session(&session),
            None => self.config.clear_auth(),
        }
        self.config.save()
    }

    /// Restores the saved session, falling back to an interactive sign-in.
    #[instrument(skip_all, name = "ensure_authenticated")]
    pub async fn ensure_authenticated(&mut self) -> Result<Services> {
        let restored = self.auth.restore(self.config.session()).await;
        if let AuthStatus::SignedIn(session) = restored {
            self.save_session()?;
            return Ok(self.services(&session));
        }

        Output::new().warning("Not signed in");
        let session = self.prompt_sign_in().await?;
        self.save_session()?;
        Ok(self.services(&session))
    }

    pub async fn prompt_sign_in(&mut self) -> Result<Session> {
        let (email, password) = prompt_credentials(self.config.email())?;
        let session = self
            .auth
            .sign_in(&email, &password)
            .await
            .context("Sign in failed")?;
        info!(user = %session.user.id, "signed in");
        Ok(session)
    }

    pub fn services(&self, session: &Session) -> Services {
        Services {
            user_id: session.user.id,
            supabase_url: self.business.supabase_url.clone(),
            data: RestDataService::new(self.business.clone(), session.access_token.as_str()),
            storage: SupabaseFileStorage::new(self.business.clone(), session.access_token.as_str()),
            proxy: NanoBananaClient::new(self.business.clone(), Some(session.access_token.clone())),
        }
    }
}

/// Reads an email (defaulting to the last one used) and a hidden password.
pub fn prompt_credentials(last_email: Option<&str>) -> Result<(String, String)> {
    let mut prompt = Text::new("Email:");
    if let Some(email) = last_email {
        prompt = prompt.with_default(email);
    }
    let email = prompt.prompt().context("Failed to read email")?;
    if email.trim().is_empty() {
        bail!("Email cannot be empty");
    }

    let password = rpassword::prompt_password("Password: ").context("Failed to read password")?;
    if password.is_empty() {
        bail!("Password cannot be empty");
    }
    Ok((email.trim().to_owned(), password))
}

/// Clients bound to one user.
#[derive(Clone)]
pub struct Services {
    pub user_id: Uuid,
    pub supabase_url: String,
    pub data: RestDataService,
    pub storage: SupabaseFileStorage,
    pub proxy: NanoBananaClient,
}

impl Services {
    pub fn closet(&self) -> AppCloset {
        Closet::new(
            self.data.clone(),
            self.storage.clone(),
            self.user_id,
            self.supabase_url.as_str(),
        )
    }

    pub fn gallery(&self) -> AppGallery {
        OutfitGallery::new(self.data.clone(), self.storage.clone(), self.user_id)
    }

    pub fn user_photos(&self) -> AppUserPhotos {
        UserPhotoManager::new(
            self.data.clone(),
            self.storage.clone(),
            self.user_id,
            self.supabase_url.as_str(),
        )
    }

    pub fn generation(&self) -> AppSession {
        GenerationSession::new(
            self.data.clone(),
            self.storage.clone(),
            self.proxy.clone(),
            self.user_id,
            self.supabase_url.as_str(),
        )
    }

    pub async fn wardrobe(&self) -> Result<AppWardrobe> {
        Wardrobe::load(self.data.clone(), self.user_id)
            .await
            .context("Failed to load wardrobe")
    }
}
