#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use uuid::Uuid;

use nearnest_api::{ApiError, Backend, Subscription};
use nearnest_types::api::{AuthUser, NewDirectMessage, NewMessage, NewProfile, NewReport};
use nearnest_types::events::ChangeEvent;
use nearnest_types::models::{DirectMessage, Message, NearbyUser, Profile, Table};

/// In-memory backend with programmable failures.
#[derive(Default)]
pub struct FakeBackend {
    pub user: Mutex<Option<AuthUser>>,
    pub profiles: Mutex<HashMap<Uuid, Profile>>,
    /// Handles that conflict on insert.
    pub taken: Mutex<HashSet<String>>,
    /// The next N profile inserts conflict regardless of handle.
    pub conflicts: AtomicUsize,
    pub profile_attempts: Mutex<Vec<String>>,
    pub fail_reads: AtomicBool,
    pub fail_writes: AtomicBool,
    pub messages: Mutex<Vec<Message>>,
    pub message_fetches: AtomicUsize,
    pub sent: Mutex<Vec<NewMessage>>,
    pub reports: Mutex<Vec<NewReport>>,
    pub dms: Mutex<Vec<DirectMessage>>,
    pub sent_dms: Mutex<Vec<NewDirectMessage>>,
    pub conversation_queries: Mutex<Vec<(Uuid, Uuid)>>,
    pub users: Mutex<Vec<NearbyUser>>,
    pub heartbeats: Mutex<Vec<(Uuid, DateTime<Utc>)>>,
    pub locations: Mutex<Vec<(Uuid, f64, f64)>>,
    pub subscriptions: Mutex<Vec<(String, Table, mpsc::Sender<ChangeEvent>)>>,
    pub sign_outs: AtomicUsize,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn signed_in() -> (Self, AuthUser) {
        let backend = Self::new();
        let user = AuthUser {
            id: Uuid::new_v4(),
            email: None,
            is_anonymous: true,
        };
        *backend.user.lock().unwrap() = Some(user.clone());
        (backend, user)
    }

    pub fn put_profile(&self, profile: Profile) {
        self.profiles.lock().unwrap().insert(profile.id, profile);
    }

    /// Push an insert notification to every subscriber of `table`.
    pub async fn notify(&self, table: Table) {
        let senders: Vec<_> = self
            .subscriptions
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, t, _)| *t == table)
            .map(|(_, _, tx)| tx.clone())
            .collect();
        for tx in senders {
            let _ = tx.send(ChangeEvent { table }).await;
        }
    }

    fn read_failure(&self) -> Result<(), ApiError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(backend_error("read failed"));
        }
        Ok(())
    }

    fn write_failure(&self) -> Result<(), ApiError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(backend_error("permission denied for table"));
        }
        Ok(())
    }
}

pub fn backend_error(message: &str) -> ApiError {
    ApiError::Backend {
        status: 500,
        code: None,
        message: message.to_string(),
    }
}

pub fn profile(handle: &str, lat: f64, lon: f64) -> Profile {
    Profile {
        id: Uuid::new_v4(),
        handle: handle.to_string(),
        lat_rounded: lat,
        lon_rounded: lon,
        last_seen_at: None,
    }
}

pub fn message(handle: &str, body: &str) -> Message {
    Message {
        id: Uuid::new_v4(),
        handle: handle.to_string(),
        body: body.to_string(),
        lat_rounded: 37.422,
        lon_rounded: -122.084,
        created_at: Utc::now(),
    }
}

#[async_trait]
impl Backend for FakeBackend {
    async fn current_user(&self) -> Option<AuthUser> {
        self.user.lock().unwrap().clone()
    }

    async fn sign_out(&self) -> Result<(), ApiError> {
        self.sign_outs.fetch_add(1, Ordering::SeqCst);
        *self.user.lock().unwrap() = None;
        Ok(())
    }

    async fn fetch_profile(&self, user_id: Uuid) -> Result<Option<Profile>, ApiError> {
        self.read_failure()?;
        Ok(self.profiles.lock().unwrap().get(&user_id).cloned())
    }

    async fn create_profile(&self, new: NewProfile) -> Result<Profile, ApiError> {
        self.write_failure()?;
        self.profile_attempts.lock().unwrap().push(new.handle.clone());

        let forced = self
            .conflicts
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if forced || self.taken.lock().unwrap().contains(&new.handle) {
            return Err(ApiError::UniqueViolation(
                "duplicate key value violates unique constraint \"profiles_handle_key\"".to_string(),
            ));
        }

        let profile = Profile {
            id: new.id,
            handle: new.handle,
            lat_rounded: new.lat_rounded,
            lon_rounded: new.lon_rounded,
            last_seen_at: None,
        };
        self.taken.lock().unwrap().insert(profile.handle.clone());
        self.put_profile(profile.clone());
        Ok(profile)
    }

    async fn update_location(&self, user_id: Uuid, lat_rounded: f64, lon_rounded: f64) -> Result<(), ApiError> {
        self.write_failure()?;
        self.locations.lock().unwrap().push((user_id, lat_rounded, lon_rounded));
        if let Some(p) = self.profiles.lock().unwrap().get_mut(&user_id) {
            p.lat_rounded = lat_rounded;
            p.lon_rounded = lon_rounded;
        }
        Ok(())
    }

    async fn touch_last_seen(&self, user_id: Uuid, at: DateTime<Utc>) -> Result<(), ApiError> {
        self.write_failure()?;
        self.heartbeats.lock().unwrap().push((user_id, at));
        Ok(())
    }

    async fn messages_since(&self, since: DateTime<Utc>) -> Result<Vec<Message>, ApiError> {
        self.message_fetches.fetch_add(1, Ordering::SeqCst);
        self.read_failure()?;
        let mut rows: Vec<Message> = self
            .messages
            .lock()
            .unwrap()
            .iter()
            .filter(|m| m.created_at >= since)
            .cloned()
            .collect();
        rows.sort_by_key(|m| m.created_at);
        Ok(rows)
    }

    async fn insert_message(&self, message: NewMessage) -> Result<(), ApiError> {
        self.write_failure()?;
        self.messages.lock().unwrap().push(Message {
            id: Uuid::new_v4(),
            handle: message.handle.clone(),
            body: message.body.clone(),
            lat_rounded: message.lat_rounded,
            lon_rounded: message.lon_rounded,
            created_at: Utc::now(),
        });
        self.sent.lock().unwrap().push(message);
        Ok(())
    }

    async fn insert_report(&self, report: NewReport) -> Result<(), ApiError> {
        self.write_failure()?;
        self.reports.lock().unwrap().push(report);
        Ok(())
    }

    async fn conversation(&self, a: Uuid, b: Uuid) -> Result<Vec<DirectMessage>, ApiError> {
        self.conversation_queries.lock().unwrap().push((a, b));
        self.read_failure()?;
        Ok(self
            .dms
            .lock()
            .unwrap()
            .iter()
            .filter(|m| {
                (m.sender_id == a && m.recipient_id == b) || (m.sender_id == b && m.recipient_id == a)
            })
            .cloned()
            .collect())
    }

    async fn insert_direct_message(&self, message: NewDirectMessage) -> Result<(), ApiError> {
        self.write_failure()?;
        self.dms.lock().unwrap().push(DirectMessage {
            id: Uuid::new_v4(),
            sender_id: message.sender_id,
            recipient_id: message.recipient_id,
            body: message.body.clone(),
            created_at: Utc::now(),
        });
        self.sent_dms.lock().unwrap().push(message);
        Ok(())
    }

    async fn users_by_recency(&self, exclude: Uuid) -> Result<Vec<NearbyUser>, ApiError> {
        self.read_failure()?;
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .filter(|u| u.id != exclude)
            .cloned()
            .collect())
    }

    async fn subscribe_inserts(&self, channel: &str, table: Table) -> Result<Subscription, ApiError> {
        let (tx, rx) = mpsc::channel(8);
        self.subscriptions
            .lock()
            .unwrap()
            .push((channel.to_string(), table, tx));
        Ok(Subscription::from_channel(rx))
    }
}
