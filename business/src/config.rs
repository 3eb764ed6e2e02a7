use serde::Deserialize;
use std::env::vars;

const DEFAULT_NANO_BANANA_BASE_URL: &str = "http://localhost:3000/api/nano-banana";

/// Where the client finds its two backends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusinessConfig {
    /// Base of the generation proxy's API, e.g. `http://localhost:3000/api/nano-banana`.
    pub nano_banana_base_url: String,
    /// Shared proxy key. Without it the user's access token is sent instead.
    pub nano_banana_api_key: Option<String>,
    pub supabase_url: String,
    pub supabase_anon_key: String,
}

#[derive(Deserialize)]
struct RawBusinessConfig {
    nano_banana_base_url: Option<String>,
    nano_banana_api_key: Option<String>,
    supabase_url: Option<String>,
    supabase_anon_key: Option<String>,
}

impl BusinessConfig {
    pub fn new(
        nano_banana_base_url: impl Into<String>,
        supabase_url: impl Into<String>,
        supabase_anon_key: impl Into<String>,
    ) -> Self {
        Self {
            nano_banana_base_url: trim_slash(nano_banana_base_url.into()),
            nano_banana_api_key: None,
            supabase_url: trim_slash(supabase_url.into()),
            supabase_anon_key: supabase_anon_key.into(),
        }
    }

    pub fn with_nano_banana_api_key(mut self, key: impl Into<String>) -> Self {
        self.nano_banana_api_key = Some(key.into());
        self
    }

    /// Reads `NANO_BANANA_BASE_URL`, `NANO_BANANA_API_KEY`, `SUPABASE_URL`
    /// and `SUPABASE_ANON_KEY` from the environment.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_vars(vars())
    }

    pub fn from_vars<I, S>(iter: I) -> anyhow::Result<Self>
    where
        I: IntoIterator<Item = (S, S)>,
        S: AsRef<str>,
    {
        let raw: RawBusinessConfig = serde_env::from_iter(iter)?;

        let Some(supabase_url) = raw.supabase_url.filter(|url| !url.is_empty()) else {
            anyhow::bail!("SUPABASE_URL must be set");
        };
        let Some(supabase_anon_key) = raw.supabase_anon_key.filter(|key| !key.is_empty()) else {
            anyhow::bail!("SUPABASE_ANON_KEY must be set");
        };

        let mut config = Self::new(
            raw.nano_banana_base_url
                .filter(|url| !url.is_empty())
                .unwrap_or_else(|| DEFAULT_NANO_BANANA_BASE_URL.to_owned()),
            supabase_url,
            supabase_anon_key,
        );
        config.nano_banana_api_key = raw.nano_banana_api_key.filter(|key| !key.is_empty());
        Ok(config)
    }

    pub fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{table}", self.supabase_url)
    }

    pub fn auth_url(&self, endpoint: &str) -> String {
        format!("{}/auth/v1/{endpoint}", self.supabase_url)
    }

    pub fn storage_url(&self, endpoint: &str) -> String {
        format!("{}/storage/v1/{endpoint}", self.supabase_url)
    }

    pub fn nano_banana_url(&self, endpoint: &str) -> String {
        format!("{}/{endpoint}", self.nano_banana_base_url)
    }
}

fn trim_slash(url: String) -> String {
    url.trim_end_matches('/').to_owned()
}
