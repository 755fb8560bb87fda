use std::sync::Arc;

use tracing::{error, warn};

use nearnest_api::{Backend, Subscription};
use nearnest_types::api::NewDirectMessage;
use nearnest_types::events::ChangeEvent;
use nearnest_types::models::{DirectMessage, NearbyUser, Profile, Table};

use crate::throttle::{SendOutcome, SendThrottle, gated_send};

/// A one-to-one conversation between the signed-in user and `other`.
pub struct Conversation {
    backend: Arc<dyn Backend>,
    me: Profile,
    other: NearbyUser,
    messages: Vec<DirectMessage>,
    throttle: SendThrottle,
    subscription: Option<Subscription>,
}

impl Conversation {
    pub fn new(backend: Arc<dyn Backend>, me: Profile, other: NearbyUser) -> Self {
        Self {
            backend,
            me,
            other,
            messages: Vec::new(),
            throttle: SendThrottle::default(),
            subscription: None,
        }
    }

    pub fn channel_name(&self) -> String {
        format!("dm-{}-{}", self.me.id, self.other.id)
    }

    pub async fn open(&mut self) {
        self.refresh().await;

        // Table-wide: any direct message insert triggers a re-fetch.
        let channel = self.channel_name();
        match self.backend.subscribe_inserts(&channel, Table::DirectMessages).await {
            Ok(subscription) => self.subscription = Some(subscription),
            Err(e) => warn!("Live conversation updates unavailable: {}", e),
        }
    }

    pub async fn refresh(&mut self) {
        self.messages = match self.backend.conversation(self.me.id, self.other.id).await {
            Ok(messages) => messages,
            Err(e) => {
                error!("fetch conversation with {}: {}", self.other.handle, e);
                Vec::new()
            }
        };
    }

    /// Same contract as [`MessageFeed::changed`](crate::feed::MessageFeed::changed).
    pub async fn changed(&mut self) -> ChangeEvent {
        if let Some(subscription) = self.subscription.as_mut() {
            if let Some(event) = subscription.next().await {
                return event;
            }
            warn!("Live conversation updates ended");
            self.subscription = None;
        }
        std::future::pending().await
    }

    pub fn close(&mut self) {
        self.subscription = None;
    }

    pub fn messages(&self) -> &[DirectMessage] {
        &self.messages
    }

    pub fn other(&self) -> &NearbyUser {
        &self.other
    }

    pub fn is_mine(&self, message: &DirectMessage) -> bool {
        message.sender_id == self.me.id
    }

    pub async fn send(&mut self, body: &str) -> SendOutcome {
        let backend = self.backend.clone();
        let (sender_id, recipient_id) = (self.me.id, self.other.id);

        gated_send(&mut self.throttle, body, |body| async move {
            backend
                .insert_direct_message(NewDirectMessage {
                    sender_id,
                    recipient_id,
                    body,
                })
                .await
        })
        .await
    }
}
