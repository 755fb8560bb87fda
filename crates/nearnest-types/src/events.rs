use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::api::AuthUser;
use crate::models::Table;

/// Identity changes published by the auth client.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthEvent {
    /// A session became available (sign-in, OTP verification, restored session)
    SignedIn(AuthUser),

    /// The access token was replaced; the identity is unchanged
    TokenRefreshed(AuthUser),

    /// The session was cleared
    SignedOut,
}

impl AuthEvent {
    /// The identity this event leaves the client with.
    pub fn user(&self) -> Option<&AuthUser> {
        match self {
            Self::SignedIn(user) | Self::TokenRefreshed(user) => Some(user),
            Self::SignedOut => None,
        }
    }
}

/// "Something was inserted into `table`". Realtime gives no stronger
/// guarantee, so consumers re-query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangeEvent {
    pub table: Table,
}

// -- Phoenix channel frames (Realtime protocol, vsn 1.0.0) --

pub const PHX_JOIN: &str = "phx_join";
pub const PHX_LEAVE: &str = "phx_leave";
pub const PHX_REPLY: &str = "phx_reply";
pub const PHX_ERROR: &str = "phx_error";
pub const PHX_CLOSE: &str = "phx_close";
pub const HEARTBEAT: &str = "heartbeat";
pub const POSTGRES_CHANGES: &str = "postgres_changes";
pub const ACCESS_TOKEN: &str = "access_token";
pub const PHOENIX_TOPIC: &str = "phoenix";

/// A single frame on the Realtime socket, in either direction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhoenixMessage {
    pub topic: String,
    pub event: String,
    #[serde(default)]
    pub payload: Value,
    #[serde(rename = "ref", default)]
    pub reference: Option<String>,
}

impl PhoenixMessage {
    /// Join a channel listening for inserts on one public table.
    pub fn join_inserts(topic: &str, table: Table, access_token: Option<&str>, reference: String) -> Self {
        let mut payload = json!({
            "config": {
                "broadcast": { "self": false },
                "presence": { "key": "" },
                "postgres_changes": [
                    { "event": "INSERT", "schema": "public", "table": table.as_str() }
                ]
            }
        });
        if let Some(token) = access_token {
            payload["access_token"] = Value::String(token.to_string());
        }
        Self {
            topic: topic.to_string(),
            event: PHX_JOIN.to_string(),
            payload,
            reference: Some(reference),
        }
    }

    pub fn leave(topic: &str, reference: String) -> Self {
        Self {
            topic: topic.to_string(),
            event: PHX_LEAVE.to_string(),
            payload: json!({}),
            reference: Some(reference),
        }
    }

    /// Hand a joined channel a refreshed access token.
    pub fn access_token(topic: &str, access_token: &str, reference: String) -> Self {
        Self {
            topic: topic.to_string(),
            event: ACCESS_TOKEN.to_string(),
            payload: json!({ "access_token": access_token }),
            reference: Some(reference),
        }
    }

    pub fn heartbeat(reference: String) -> Self {
        Self {
            topic: PHOENIX_TOPIC.to_string(),
            event: HEARTBEAT.to_string(),
            payload: json!({}),
            reference: Some(reference),
        }
    }

    /// Reply status for `phx_reply` frames ("ok" / "error").
    pub fn reply_status(&self) -> Option<&str> {
        if self.event != PHX_REPLY {
            return None;
        }
        self.payload.get("status").and_then(Value::as_str)
    }

    /// Table named by a `postgres_changes` frame, if it is one we know.
    pub fn changed_table(&self) -> Option<Table> {
        if self.event != POSTGRES_CHANGES {
            return None;
        }
        self.payload
            .get("data")
            .and_then(|data| data.get("table"))
            .and_then(Value::as_str)
            .and_then(Table::from_name)
    }
}
