use nearnest_api::ApiError;
use thiserror::Error;

use crate::validate::HandleError;

/// Errors the screens surface to the user. Local storage failures never
/// appear here; the store swallows them.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Location access was denied. NearNest needs your location to show nearby messages.")]
    LocationDenied,

    #[error("{0}")]
    LocationUnavailable(String),

    #[error("That handle is already taken")]
    HandleTaken(String),

    #[error("Could not find a free handle after {attempts} attempts")]
    HandleRetriesExhausted { attempts: usize },

    #[error("{0}")]
    InvalidHandle(#[from] HandleError),

    #[error("NearNest is not configured: {0}")]
    NotConfigured(String),

    #[error("{}", .0.user_message())]
    Backend(#[from] ApiError),
}

impl ClientError {
    /// Whether the screen should offer a manual "try again".
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::NotConfigured(_) | Self::InvalidHandle(_))
    }
}
