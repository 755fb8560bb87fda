use std::str::FromStr;
use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use nearnest_api::Backend;
use nearnest_types::api::NewProfile;
use nearnest_types::models::Profile;

use crate::error::ClientError;
use crate::validate::validate_handle;

/// Total insert attempts for a generated handle, the first one included.
pub const MAX_HANDLE_ATTEMPTS: usize = 3;

/// How a new user gets a handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HandlePolicy {
    /// `User_<8 hex>`, no user input.
    #[default]
    Generated,
    /// Typed by the user and validated.
    Chosen,
}

impl FromStr for HandlePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "generated" => Ok(Self::Generated),
            "chosen" => Ok(Self::Chosen),
            other => Err(format!("unknown handle policy '{}'", other)),
        }
    }
}

pub fn generate_handle() -> String {
    let id = Uuid::new_v4().simple().to_string();
    format!("User_{}", &id[..8])
}

/// Creates the first profile row for a signed-in user with no profile.
pub struct ProfileBootstrap {
    backend: Arc<dyn Backend>,
    user_id: Uuid,
}

impl ProfileBootstrap {
    pub fn new(backend: Arc<dyn Backend>, user_id: Uuid) -> Self {
        Self { backend, user_id }
    }

    /// Insert a profile under a random handle, regenerating on conflicts.
    /// Each call starts over at the first attempt.
    pub async fn create_generated(&self) -> Result<Profile, ClientError> {
        for attempt in 1..=MAX_HANDLE_ATTEMPTS {
            let handle = generate_handle();
            match self.insert(handle.clone()).await {
                Ok(profile) => {
                    info!("Created profile {} for {}", profile.handle, self.user_id);
                    return Ok(profile);
                }
                Err(e) if e.is_unique_violation() => {
                    warn!("Handle {} taken (attempt {}/{})", handle, attempt, MAX_HANDLE_ATTEMPTS);
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(ClientError::HandleRetriesExhausted {
            attempts: MAX_HANDLE_ATTEMPTS,
        })
    }

    /// Insert a profile under a handle the user typed. Conflicts are not retried.
    pub async fn create_chosen(&self, input: &str) -> Result<Profile, ClientError> {
        let handle = validate_handle(input)?;
        match self.insert(handle.clone()).await {
            Ok(profile) => {
                info!("Created profile {} for {}", profile.handle, self.user_id);
                Ok(profile)
            }
            Err(e) if e.is_unique_violation() => Err(ClientError::HandleTaken(handle)),
            Err(e) => Err(e.into()),
        }
    }

    /// Dispatch on `policy`; `input` is only read for [`HandlePolicy::Chosen`].
    pub async fn create(&self, policy: HandlePolicy, input: Option<&str>) -> Result<Profile, ClientError> {
        match policy {
            HandlePolicy::Generated => self.create_generated().await,
            HandlePolicy::Chosen => self.create_chosen(input.unwrap_or_default()).await,
        }
    }

    async fn insert(&self, handle: String) -> Result<Profile, nearnest_api::ApiError> {
        self.backend
            .create_profile(NewProfile {
                id: self.user_id,
                handle,
                lat_rounded: 0.0,
                lon_rounded: 0.0,
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_handle_shape() {
        let handle = generate_handle();
        assert_eq!(handle.len(), 13);
        assert!(handle.starts_with("User_"));
        assert!(handle[5..].chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(generate_handle(), generate_handle());
    }

    #[test]
    fn test_policy_parse() {
        assert_eq!("generated".parse(), Ok(HandlePolicy::Generated));
        assert_eq!(" Chosen ".parse(), Ok(HandlePolicy::Chosen));
        assert!("random".parse::<HandlePolicy>().is_err());
    }
}
