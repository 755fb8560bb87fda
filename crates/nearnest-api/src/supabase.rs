use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::Client;
use uuid::Uuid;

use nearnest_store::LocalStore;
use nearnest_types::api::{
    AuthUser, LastSeenUpdate, LocationUpdate, NewDirectMessage, NewMessage, NewProfile, NewReport,
};
use nearnest_types::models::{DirectMessage, Message, NearbyUser, Profile, Table};

use crate::auth::AuthClient;
use crate::backend::Backend;
use crate::config::BackendConfig;
use crate::error::ApiError;
use crate::realtime::{RealtimeClient, Subscription};
use crate::rest::RestClient;

const PROFILE_COLUMNS: &str = "id,handle,lat_rounded,lon_rounded";
const MESSAGE_COLUMNS: &str = "id,handle,body,lat_rounded,lon_rounded,created_at";
const DM_COLUMNS: &str = "id,sender_id,recipient_id,body,created_at";
const USER_COLUMNS: &str = "id,handle";

/// [`Backend`] over a Supabase project.
pub struct SupabaseBackend {
    auth: Arc<AuthClient>,
    rest: RestClient,
    realtime: RealtimeClient,
}

impl SupabaseBackend {
    pub fn new(config: &BackendConfig, store: Option<Arc<LocalStore>>) -> Self {
        let client = Client::new();
        Self {
            auth: Arc::new(AuthClient::new(client.clone(), config, store)),
            rest: RestClient::new(client, config.rest_url(), config.anon_key()),
            realtime: RealtimeClient::new(config.realtime_url()),
        }
    }

    pub fn auth(&self) -> &Arc<AuthClient> {
        &self.auth
    }
}

#[async_trait]
impl Backend for SupabaseBackend {
    async fn current_user(&self) -> Option<AuthUser> {
        self.auth.current_user()
    }

    async fn sign_out(&self) -> Result<(), ApiError> {
        self.auth.sign_out().await
    }

    async fn fetch_profile(&self, user_id: Uuid) -> Result<Option<Profile>, ApiError> {
        let token = self.auth.bearer().await;
        self.rest
            .from(Table::Profiles)
            .select(PROFILE_COLUMNS)
            .eq("id", user_id)
            .maybe_single(&token)
            .await
    }

    async fn create_profile(&self, profile: NewProfile) -> Result<Profile, ApiError> {
        let token = self.auth.bearer().await;
        self.rest
            .insert_returning(Table::Profiles, &profile, PROFILE_COLUMNS, &token)
            .await
    }

    async fn update_location(&self, user_id: Uuid, lat_rounded: f64, lon_rounded: f64) -> Result<(), ApiError> {
        let token = self.auth.bearer().await;
        let patch = LocationUpdate {
            lat_rounded,
            lon_rounded,
        };
        self.rest
            .update_eq(Table::Profiles, &patch, "id", &user_id.to_string(), &token)
            .await
    }

    async fn touch_last_seen(&self, user_id: Uuid, at: DateTime<Utc>) -> Result<(), ApiError> {
        let token = self.auth.bearer().await;
        let patch = LastSeenUpdate { last_seen_at: at };
        self.rest
            .update_eq(Table::Profiles, &patch, "id", &user_id.to_string(), &token)
            .await
    }

    async fn messages_since(&self, since: DateTime<Utc>) -> Result<Vec<Message>, ApiError> {
        let token = self.auth.bearer().await;
        self.rest
            .from(Table::Messages)
            .select(MESSAGE_COLUMNS)
            .gte("created_at", since.to_rfc3339_opts(SecondsFormat::Millis, true))
            .order("created_at", true)
            .fetch(&token)
            .await
    }

    async fn insert_message(&self, message: NewMessage) -> Result<(), ApiError> {
        let token = self.auth.bearer().await;
        self.rest.insert(Table::Messages, &message, &token).await
    }

    async fn insert_report(&self, report: NewReport) -> Result<(), ApiError> {
        let token = self.auth.bearer().await;
        self.rest.insert(Table::Reports, &report, &token).await
    }

    async fn conversation(&self, a: Uuid, b: Uuid) -> Result<Vec<DirectMessage>, ApiError> {
        let token = self.auth.bearer().await;
        let pair = format!(
            "and(sender_id.eq.{a},recipient_id.eq.{b}),and(sender_id.eq.{b},recipient_id.eq.{a})"
        );
        self.rest
            .from(Table::DirectMessages)
            .select(DM_COLUMNS)
            .or(&pair)
            .order("created_at", true)
            .fetch(&token)
            .await
    }

    async fn insert_direct_message(&self, message: NewDirectMessage) -> Result<(), ApiError> {
        let token = self.auth.bearer().await;
        self.rest.insert(Table::DirectMessages, &message, &token).await
    }

    async fn users_by_recency(&self, exclude: Uuid) -> Result<Vec<NearbyUser>, ApiError> {
        let token = self.auth.bearer().await;
        self.rest
            .from(Table::Profiles)
            .select(USER_COLUMNS)
            .neq("id", exclude)
            .order("last_seen_at", false)
            .fetch(&token)
            .await
    }

    async fn subscribe_inserts(&self, channel: &str, table: Table) -> Result<Subscription, ApiError> {
        self.realtime
            .subscribe_inserts(channel, table, self.auth.watch_token())
            .await
    }
}
