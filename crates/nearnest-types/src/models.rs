use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Backend tables the client reads from or writes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Profiles,
    Messages,
    DirectMessages,
    Reports,
}

impl Table {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Profiles => "profiles",
            Self::Messages => "messages",
            Self::DirectMessages => "dm_messages",
            Self::Reports => "reports",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "profiles" => Some(Self::Profiles),
            "messages" => Some(Self::Messages),
            "dm_messages" => Some(Self::DirectMessages),
            "reports" => Some(Self::Reports),
            _ => None,
        }
    }
}

/// One row of `profiles`. A profile at exactly (0, 0) has no location yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    pub handle: String,
    pub lat_rounded: f64,
    pub lon_rounded: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_seen_at: Option<DateTime<Utc>>,
}

impl Profile {
    pub fn has_location(&self) -> bool {
        self.lat_rounded != 0.0 || self.lon_rounded != 0.0
    }
}

/// Public nearby message. `handle` is copied from the sender's profile at
/// send time and is not a foreign key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub handle: String,
    pub body: String,
    #[serde(default)]
    pub lat_rounded: f64,
    #[serde(default)]
    pub lon_rounded: f64,
    pub created_at: DateTime<Utc>,
}

/// One row of `dm_messages`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectMessage {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub recipient_id: Uuid,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

/// Another user as shown in the inbox list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NearbyUser {
    pub id: Uuid,
    pub handle: String,
}
