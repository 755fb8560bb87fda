use url::Url;

use crate::error::ApiError;

pub const URL_ENV: &str = "NEARNEST_SUPABASE_URL";
pub const ANON_KEY_ENV: &str = "NEARNEST_SUPABASE_ANON_KEY";

/// Values shipped in example configs that must never reach the network.
const PLACEHOLDER_URLS: &[&str] = &["https://your-project-id.supabase.co"];
const PLACEHOLDER_KEYS: &[&str] = &[
    "your-anon-key-here",
    "your-anon-key-or-sb_publishable-key-here",
];

/// Service endpoint and public API key for the backend project.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    url: Url,
    anon_key: String,
}

impl BackendConfig {
    /// Validate the two externally supplied secrets. Nothing is contacted.
    pub fn new(url: &str, anon_key: &str) -> Result<Self, ApiError> {
        let url = url.trim();
        let anon_key = anon_key.trim();

        if url.is_empty() || PLACEHOLDER_URLS.contains(&url.trim_end_matches('/')) {
            return Err(ApiError::NotConfigured(format!("{} is unset or still a placeholder", URL_ENV)));
        }
        if anon_key.is_empty() || PLACEHOLDER_KEYS.contains(&anon_key) {
            return Err(ApiError::NotConfigured(format!("{} is unset or still a placeholder", ANON_KEY_ENV)));
        }

        let parsed = Url::parse(url)
            .map_err(|e| ApiError::NotConfigured(format!("{} is not a valid URL: {}", URL_ENV, e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ApiError::NotConfigured(format!("{} must be an http(s) URL", URL_ENV)));
        }

        Ok(Self {
            url: parsed,
            anon_key: anon_key.to_string(),
        })
    }

    /// Read both values from the environment.
    pub fn from_env() -> Result<Self, ApiError> {
        let url = std::env::var(URL_ENV).unwrap_or_default();
        let anon_key = std::env::var(ANON_KEY_ENV).unwrap_or_default();
        Self::new(&url, &anon_key)
    }

    pub fn anon_key(&self) -> &str {
        &self.anon_key
    }

    pub fn base_url(&self) -> &str {
        self.url.as_str().trim_end_matches('/')
    }

    pub fn auth_url(&self) -> String {
        format!("{}/auth/v1", self.base_url())
    }

    pub fn rest_url(&self) -> String {
        format!("{}/rest/v1", self.base_url())
    }

    pub fn realtime_url(&self) -> String {
        let base = self.base_url();
        let ws_base = if let Some(rest) = base.strip_prefix("https://") {
            format!("wss://{}", rest)
        } else if let Some(rest) = base.strip_prefix("http://") {
            format!("ws://{}", rest)
        } else {
            base.to_string()
        };
        format!("{}/realtime/v1/websocket?apikey={}&vsn=1.0.0", ws_base, self.anon_key)
    }
}
