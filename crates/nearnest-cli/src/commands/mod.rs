pub mod auth;
pub mod chat;
pub mod onboarding;
pub mod status;
pub mod users;

use std::sync::Arc;

use anyhow::bail;
use nearnest_api::{Backend, SupabaseBackend};
use nearnest_client::session::{Screen, SessionOrchestrator};
use nearnest_store::LocalStore;
use nearnest_types::models::Profile;

use crate::config::Settings;

/// Wired-up backend, local store and session for one command.
pub struct App {
    pub settings: Settings,
    pub store: Arc<LocalStore>,
    pub supabase: Arc<SupabaseBackend>,
    pub session: SessionOrchestrator,
}

impl App {
    /// Connect using `settings` and restore any saved session. Fails before
    /// any network call when the backend is not configured.
    pub async fn connect(settings: Settings, store: Arc<LocalStore>) -> anyhow::Result<Self> {
        let config = match &settings.backend {
            Ok(config) => config.clone(),
            Err(e) => bail!("{}", e),
        };

        let supabase = Arc::new(SupabaseBackend::new(&config, Some(store.clone())));
        supabase.auth().restore();

        let backend: Arc<dyn Backend> = supabase.clone();
        let mut session = SessionOrchestrator::new(backend, store.clone());
        session.start().await;

        Ok(Self {
            settings,
            store,
            supabase,
            session,
        })
    }

    pub fn backend(&self) -> Arc<dyn Backend> {
        self.supabase.clone()
    }

    /// The signed-in profile, or an error telling the user what to do next.
    pub fn ready_profile(&self) -> anyhow::Result<Profile> {
        match (self.session.screen(), self.session.profile()) {
            (Screen::Ready, Some(profile)) => Ok(profile.clone()),
            (screen, _) => bail!("{}", next_step(screen)),
        }
    }
}

/// What the user should run to get past `screen`.
pub fn next_step(screen: Screen) -> &'static str {
    match screen {
        Screen::Loading => "Still loading",
        Screen::Unauthenticated => "Not signed in. Run 'nearnest login --email <address>' or 'nearnest anon'",
        Screen::NeedsProfile => "No profile yet. Run 'nearnest setup'",
        Screen::NeedsLocation => "Location not set. Run 'nearnest locate --lat <lat> --lon <lon>'",
        Screen::Ready => "Ready. Run 'nearnest chat' to see nearby messages",
    }
}
