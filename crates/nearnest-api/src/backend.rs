use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use nearnest_types::api::{AuthUser, NewDirectMessage, NewMessage, NewProfile, NewReport};
use nearnest_types::models::{DirectMessage, Message, NearbyUser, Profile, Table};

use crate::error::ApiError;
use crate::realtime::Subscription;

/// Everything the client needs from the managed backend.
///
/// Ordering and filtering happen in the backend's query engine; implementors
/// return rows exactly as the remote query produced them.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Identity of the signed-in user, if any.
    async fn current_user(&self) -> Option<AuthUser>;

    async fn sign_out(&self) -> Result<(), ApiError>;

    /// Point lookup of a profile by user id.
    async fn fetch_profile(&self, user_id: Uuid) -> Result<Option<Profile>, ApiError>;

    /// Insert a profile. A taken handle fails with [`ApiError::UniqueViolation`].
    async fn create_profile(&self, profile: NewProfile) -> Result<Profile, ApiError>;

    async fn update_location(&self, user_id: Uuid, lat_rounded: f64, lon_rounded: f64) -> Result<(), ApiError>;

    /// Presence heartbeat: set `last_seen_at` to `at`.
    async fn touch_last_seen(&self, user_id: Uuid, at: DateTime<Utc>) -> Result<(), ApiError>;

    /// Public messages created at or after `since`, oldest first.
    async fn messages_since(&self, since: DateTime<Utc>) -> Result<Vec<Message>, ApiError>;

    async fn insert_message(&self, message: NewMessage) -> Result<(), ApiError>;

    async fn insert_report(&self, report: NewReport) -> Result<(), ApiError>;

    /// Direct messages between `a` and `b` in either direction, oldest first.
    async fn conversation(&self, a: Uuid, b: Uuid) -> Result<Vec<DirectMessage>, ApiError>;

    async fn insert_direct_message(&self, message: NewDirectMessage) -> Result<(), ApiError>;

    /// Every other user, most recently seen first.
    async fn users_by_recency(&self, exclude: Uuid) -> Result<Vec<NearbyUser>, ApiError>;

    /// Insert notifications for `table`, under the channel name `channel`.
    async fn subscribe_inserts(&self, channel: &str, table: Table) -> Result<Subscription, ApiError>;
}
