use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Postgres unique constraint violation (SQLSTATE 23505)
    #[error("Unique constraint violation: {0}")]
    UniqueViolation(String),

    #[error("Backend error ({status}): {message}")]
    Backend {
        status: u16,
        code: Option<String>,
        message: String,
    },

    #[error("Backend not configured: {0}")]
    NotConfigured(String),

    #[error("Not signed in")]
    NotAuthenticated,

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Realtime error: {0}")]
    Realtime(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("Subscription rejected: {0}")]
    SubscriptionRejected(String),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl ApiError {
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, Self::UniqueViolation(_))
    }

    /// The message a user should see for this error, without the prefix.
    pub fn user_message(&self) -> String {
        match self {
            Self::UniqueViolation(message) => message.clone(),
            Self::Backend { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}
