use std::sync::Arc;

use tracing::{info, warn};

use nearnest_api::Backend;
use nearnest_store::{LocalStore, flags};
use nearnest_types::api::AuthUser;
use nearnest_types::events::AuthEvent;
use nearnest_types::models::Profile;

use crate::error::ClientError;

/// Which top-level screen the client should be showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Loading,
    Unauthenticated,
    NeedsProfile,
    NeedsLocation,
    Ready,
}

/// Gate the screens on identity and profile. `resolved` is false until the
/// first identity check has finished.
pub fn screen_for(resolved: bool, user: Option<&AuthUser>, profile: Option<&Profile>) -> Screen {
    if !resolved {
        return Screen::Loading;
    }
    match (user, profile) {
        (None, _) => Screen::Unauthenticated,
        (Some(_), None) => Screen::NeedsProfile,
        (Some(_), Some(p)) if !p.has_location() => Screen::NeedsLocation,
        (Some(_), Some(_)) => Screen::Ready,
    }
}

/// Tracks identity and profile and derives the current [`Screen`].
pub struct SessionOrchestrator {
    backend: Arc<dyn Backend>,
    store: Arc<LocalStore>,
    user: Option<AuthUser>,
    profile: Option<Profile>,
    resolved: bool,
}

impl SessionOrchestrator {
    pub fn new(backend: Arc<dyn Backend>, store: Arc<LocalStore>) -> Self {
        Self {
            backend,
            store,
            user: None,
            profile: None,
            resolved: false,
        }
    }

    /// Resolve the initial identity from the backend.
    pub async fn start(&mut self) -> Screen {
        let user = self.backend.current_user().await;
        self.identity_changed(user).await
    }

    /// Feed an identity change in. A profile fetch failure counts as "no
    /// profile".
    pub async fn identity_changed(&mut self, user: Option<AuthUser>) -> Screen {
        self.resolved = true;

        let Some(user) = user else {
            self.reset();
            return self.screen();
        };

        flags::set_signed_out(&self.store, false);
        let same_user = self.user.as_ref().is_some_and(|u| u.id == user.id);
        if !same_user {
            info!("Signed in as {}", user.id);
        }

        self.profile = match self.backend.fetch_profile(user.id).await {
            Ok(profile) => profile,
            Err(e) => {
                warn!("fetch profile for {}: {}", user.id, e);
                None
            }
        };
        self.user = Some(user);
        self.screen()
    }

    /// Apply a notification from the auth client.
    pub async fn apply(&mut self, event: AuthEvent) -> Screen {
        match event {
            // Same identity, nothing to re-check.
            AuthEvent::TokenRefreshed(_) if self.user.is_some() => self.screen(),
            other => self.identity_changed(other.user().cloned()).await,
        }
    }

    /// The profile was just created by onboarding.
    pub fn profile_created(&mut self, profile: Profile) -> Screen {
        self.profile = Some(profile);
        self.screen()
    }

    /// Location onboarding finished; re-fetch the profile.
    pub async fn location_set(&mut self) -> Screen {
        let user = self.user.clone();
        self.identity_changed(user).await
    }

    /// Sign out at the backend and remember that it was deliberate.
    pub async fn sign_out(&mut self) -> Result<Screen, ClientError> {
        self.backend.sign_out().await?;
        flags::set_signed_out(&self.store, true);
        self.resolved = true;
        self.reset();
        Ok(self.screen())
    }

    pub fn was_signed_out(&self) -> bool {
        flags::signed_out(&self.store)
    }

    pub fn screen(&self) -> Screen {
        screen_for(self.resolved, self.user.as_ref(), self.profile.as_ref())
    }

    pub fn user(&self) -> Option<&AuthUser> {
        self.user.as_ref()
    }

    pub fn profile(&self) -> Option<&Profile> {
        self.profile.as_ref()
    }

    fn reset(&mut self) {
        self.user = None;
        self.profile = None;
    }
}
