use std::path::PathBuf;

use tracing::warn;

use nearnest_api::{ApiError, BackendConfig};
use nearnest_client::profile::HandlePolicy;

pub const HANDLE_POLICY_ENV: &str = "NEARNEST_HANDLE_POLICY";
pub const REDIRECT_URL_ENV: &str = "NEARNEST_REDIRECT_URL";
pub const STORE_PATH_ENV: &str = "NEARNEST_STORE_PATH";

const DEFAULT_STORE_PATH: &str = "nearnest.db";

/// Everything the binary reads from its environment.
#[derive(Debug)]
pub struct Settings {
    /// Backend endpoint; an error here means "not configured".
    pub backend: Result<BackendConfig, ApiError>,
    pub handle_policy: HandlePolicy,
    pub redirect_url: Option<String>,
    pub store_path: PathBuf,
}

impl Settings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let url = lookup(nearnest_api::config::URL_ENV).unwrap_or_default();
        let anon_key = lookup(nearnest_api::config::ANON_KEY_ENV).unwrap_or_default();

        let handle_policy = match lookup(HANDLE_POLICY_ENV) {
            Some(raw) => raw.parse().unwrap_or_else(|e| {
                warn!("{} ({}), using generated handles", e, HANDLE_POLICY_ENV);
                HandlePolicy::Generated
            }),
            None => HandlePolicy::Generated,
        };

        Self {
            backend: BackendConfig::new(&url, &anon_key),
            handle_policy,
            redirect_url: lookup(REDIRECT_URL_ENV).filter(|v| !v.trim().is_empty()),
            store_path: lookup(STORE_PATH_ENV)
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_STORE_PATH.to_string())
                .into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings(vars: &[(&str, &str)]) -> Settings {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let s = settings(&[]);
        assert!(matches!(s.backend, Err(ApiError::NotConfigured(_))));
        assert_eq!(s.handle_policy, HandlePolicy::Generated);
        assert_eq!(s.store_path, PathBuf::from("nearnest.db"));
        assert!(s.redirect_url.is_none());
    }

    #[test]
    fn test_placeholders_are_not_configured() {
        let s = settings(&[
            ("NEARNEST_SUPABASE_URL", "https://your-project-id.supabase.co"),
            ("NEARNEST_SUPABASE_ANON_KEY", "real-key"),
        ]);
        assert!(s.backend.is_err());
    }

    #[test]
    fn test_full_config() {
        let s = settings(&[
            ("NEARNEST_SUPABASE_URL", "https://abc.supabase.co"),
            ("NEARNEST_SUPABASE_ANON_KEY", "real-key"),
            ("NEARNEST_HANDLE_POLICY", "chosen"),
            ("NEARNEST_STORE_PATH", "/tmp/nn.db"),
            ("NEARNEST_REDIRECT_URL", "https://nearnest.app/welcome"),
        ]);
        assert!(s.backend.is_ok());
        assert_eq!(s.handle_policy, HandlePolicy::Chosen);
        assert_eq!(s.store_path, PathBuf::from("/tmp/nn.db"));
        assert_eq!(s.redirect_url.as_deref(), Some("https://nearnest.app/welcome"));
    }

    #[test]
    fn test_bad_policy_falls_back() {
        let s = settings(&[("NEARNEST_HANDLE_POLICY", "fancy")]);
        assert_eq!(s.handle_policy, HandlePolicy::Generated);
    }
}
