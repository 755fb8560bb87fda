use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// -- JWT Claims --

/// Claims carried by a GoTrue access token. Only read client-side to decide
/// when to refresh; the signature is checked by the backend, not here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub exp: usize,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

// -- Auth --

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub is_anonymous: bool,
}

/// Session returned by GoTrue on sign-in, verification and refresh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default)]
    pub expires_at: Option<i64>,
    pub user: AuthUser,
}

#[derive(Debug, Serialize)]
pub struct OtpRequest<'a> {
    pub email: &'a str,
    pub create_user: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_redirect_to: Option<&'a str>,
}

#[derive(Debug, Serialize)]
pub struct VerifyOtpRequest<'a> {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub email: &'a str,
    pub token: &'a str,
}

#[derive(Debug, Serialize)]
pub struct RefreshRequest<'a> {
    pub refresh_token: &'a str,
}

// -- Rows written by the client --

#[derive(Debug, Clone, Serialize)]
pub struct NewProfile {
    pub id: Uuid,
    pub handle: String,
    pub lat_rounded: f64,
    pub lon_rounded: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewMessage {
    pub handle: String,
    pub body: String,
    pub lat_rounded: f64,
    pub lon_rounded: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewDirectMessage {
    pub sender_id: Uuid,
    pub recipient_id: Uuid,
    pub body: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewReport {
    pub message_id: Uuid,
    pub reporter_id: Uuid,
    pub reason: Option<String>,
}

/// Partial profile update written by location onboarding.
#[derive(Debug, Clone, Serialize)]
pub struct LocationUpdate {
    pub lat_rounded: f64,
    pub lon_rounded: f64,
}

/// Partial profile update written by the presence heartbeat.
#[derive(Debug, Clone, Serialize)]
pub struct LastSeenUpdate {
    pub last_seen_at: DateTime<Utc>,
}

// -- Errors --

/// Error body returned by PostgREST.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostgrestError {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub details: Option<String>,
    #[serde(default)]
    pub hint: Option<String>,
}

/// Error body returned by GoTrue. Older releases use `error_description`,
/// newer ones `msg`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthErrorBody {
    #[serde(default)]
    pub msg: Option<String>,
    #[serde(default)]
    pub error_description: Option<String>,
    #[serde(default)]
    pub error_code: Option<String>,
}

impl AuthErrorBody {
    pub fn message(&self) -> Option<&str> {
        self.msg.as_deref().or(self.error_description.as_deref())
    }
}
