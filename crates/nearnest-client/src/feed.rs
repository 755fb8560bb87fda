use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::{error, info, warn};
use uuid::Uuid;

use nearnest_api::{Backend, Subscription};
use nearnest_store::BlockList;
use nearnest_types::api::{NewMessage, NewReport};
use nearnest_types::events::ChangeEvent;
use nearnest_types::models::{Message, Profile, Table};

use crate::throttle::{SendOutcome, SendThrottle, gated_send};

/// Only messages younger than this are fetched.
pub const FEED_WINDOW_HOURS: i64 = 24;

const FEED_CHANNEL: &str = "messages-changes";

/// The public nearby feed and its composer actions.
pub struct MessageFeed {
    backend: Arc<dyn Backend>,
    profile: Profile,
    blocks: BlockList,
    messages: Vec<Message>,
    loading: bool,
    throttle: SendThrottle,
    subscription: Option<Subscription>,
}

impl MessageFeed {
    pub fn new(backend: Arc<dyn Backend>, profile: Profile, blocks: BlockList) -> Self {
        Self {
            backend,
            profile,
            blocks,
            messages: Vec::new(),
            loading: true,
            throttle: SendThrottle::default(),
            subscription: None,
        }
    }

    /// Load the window and start listening for inserts. The feed still works
    /// without live updates if the subscription cannot be opened.
    pub async fn open(&mut self) {
        self.refresh().await;

        match self.backend.subscribe_inserts(FEED_CHANNEL, Table::Messages).await {
            Ok(subscription) => self.subscription = Some(subscription),
            Err(e) => warn!("Live feed updates unavailable: {}", e),
        }
    }

    /// Re-fetch the whole window. Failures leave an empty feed.
    pub async fn refresh(&mut self) {
        let since = Utc::now() - Duration::hours(FEED_WINDOW_HOURS);
        self.messages = match self.backend.messages_since(since).await {
            Ok(messages) => messages,
            Err(e) => {
                error!("fetch messages: {}", e);
                Vec::new()
            }
        };
        self.loading = false;
    }

    /// Wait for the next insert notification. Pends forever when there is no
    /// live subscription, so it can sit in a `select!` unconditionally.
    pub async fn changed(&mut self) -> ChangeEvent {
        if let Some(subscription) = self.subscription.as_mut() {
            if let Some(event) = subscription.next().await {
                return event;
            }
            warn!("Live feed updates ended");
            self.subscription = None;
        }
        std::future::pending().await
    }

    /// Drop the live subscription.
    pub fn close(&mut self) {
        self.subscription = None;
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn is_live(&self) -> bool {
        self.subscription.is_some()
    }

    /// Fetched messages minus blocked handles, oldest first.
    pub fn visible(&self) -> Vec<&Message> {
        self.messages
            .iter()
            .filter(|m| !self.blocks.is_blocked(&m.handle))
            .collect()
    }

    pub fn is_own(&self, message: &Message) -> bool {
        message.handle == self.profile.handle
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    /// Post to the feed with the profile's handle and coordinates.
    pub async fn send(&mut self, body: &str) -> SendOutcome {
        let backend = self.backend.clone();
        let handle = self.profile.handle.clone();
        let (lat_rounded, lon_rounded) = (self.profile.lat_rounded, self.profile.lon_rounded);

        gated_send(&mut self.throttle, body, |body| async move {
            backend
                .insert_message(NewMessage {
                    handle,
                    body,
                    lat_rounded,
                    lon_rounded,
                })
                .await
        })
        .await
    }

    /// File a moderation report. Does nothing without a signed-in user;
    /// failures are logged only.
    pub async fn report(&self, message_id: Uuid, reason: Option<String>) {
        let Some(user) = self.backend.current_user().await else {
            return;
        };

        let report = NewReport {
            message_id,
            reporter_id: user.id,
            reason,
        };
        match self.backend.insert_report(report).await {
            Ok(()) => info!("Reported message {}", message_id),
            Err(e) => warn!("report message {}: {}", message_id, e),
        }
    }

    /// Hide every message from `handle` on this device.
    pub fn block(&mut self, handle: &str) {
        self.blocks.block(handle);
    }

    pub fn blocks(&self) -> &BlockList {
        &self.blocks
    }
}
