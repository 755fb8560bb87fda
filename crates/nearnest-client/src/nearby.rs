use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, error, warn};

use nearnest_api::Backend;
use nearnest_types::models::{NearbyUser, Profile};

/// Other users, most recently seen first. Loading also refreshes the
/// signed-in user's own `last_seen_at`.
pub struct NearbyUsers {
    backend: Arc<dyn Backend>,
    me: Profile,
    users: Vec<NearbyUser>,
}

impl NearbyUsers {
    pub fn new(backend: Arc<dyn Backend>, me: Profile) -> Self {
        Self {
            backend,
            me,
            users: Vec::new(),
        }
    }

    pub async fn load(&mut self) {
        self.heartbeat().await;
        self.users = match self.backend.users_by_recency(self.me.id).await {
            Ok(users) => users,
            Err(e) => {
                error!("fetch users: {}", e);
                Vec::new()
            }
        };
    }

    pub async fn refresh(&mut self) {
        self.load().await;
    }

    pub fn users(&self) -> &[NearbyUser] {
        &self.users
    }

    async fn heartbeat(&self) {
        match self.backend.touch_last_seen(self.me.id, Utc::now()).await {
            Ok(()) => debug!("Presence heartbeat for {}", self.me.handle),
            Err(e) => warn!("presence heartbeat: {}", e),
        }
    }
}
