//! Configuration file handling for the CLI.
//!
//! Stores the signed-in session in `$XDG_CONFIG_HOME/outfit-decider/config.toml`
//! following the XDG Base Directory Specification.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use outfits_business::auth::{AuthUser, ONBOARDING_COMPLETED_KEY, Session};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// CLI configuration stored on disk
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub onboarding: OnboardingConfig,
}

/// The last session handed out by the auth server
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthConfig {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    /// Unix seconds
    pub expires_at: Option<i64>,
    pub user_id: Option<Uuid>,
    pub email: Option<String>,
    #[serde(default)]
    pub onboarding_completed: bool,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnboardingConfig {
    /// Coachmark step the walkthrough stopped at
    pub step: Option<usize>,
}

impl Config {
    /// Get the configuration file path.
    ///
    /// Returns `$XDG_CONFIG_HOME/outfit-decider/config.toml` on Linux,
    /// appropriate paths on other platforms.
    pub fn config_path() -> Result<PathBuf> {
        let project_dirs = ProjectDirs::from("app", "outfit-decider", "outfit-decider")
            .context("Failed to determine config directory")?;

        Ok(project_dirs.config_dir().join("config.toml"))
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Returns default configuration if the file doesn't exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    /// Creates the config directory if it doesn't exist.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize configuration")?;

        fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))
    }

    /// The saved session, if every required field is present.
    pub fn session(&self) -> Option<Session> {
        let auth = &self.auth;
        Some(Session {
            access_token: auth.access_token.clone()?,
            refresh_token: auth.refresh_token.clone()?,
            expires_at: auth.expires_at,
            user: AuthUser {
                id: auth.user_id?,
                email: auth.email.clone(),
                user_metadata: json!({ ONBOARDING_COMPLETED_KEY: auth.onboarding_completed }),
            },
        })
    }

    pub fn set_session(&mut self, session: &Session) {
        self.auth = AuthConfig {
            access_token: Some(session.access_token.clone()),
            refresh_token: Some(session.refresh_token.clone()),
            expires_at: session.expires_at,
            user_id: Some(session.user.id),
            email: session.user.email.clone(),
            onboarding_completed: session.user.onboarding_completed(),
        };
    }

    pub fn email(&self) -> Option<&str> {
        self.auth.email.as_deref()
    }

    /// Forgets the session and the walkthrough position.
    pub fn clear_auth(&mut self) {
        self.auth = AuthConfig::default();
        self.onboarding = OnboardingConfig::default();
    }
}
