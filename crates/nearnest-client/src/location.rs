use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{info, warn};

use nearnest_api::Backend;
use nearnest_types::models::Profile;

use crate::error::ClientError;
use crate::geo::Coordinates;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeoError {
    #[error("Location permission denied")]
    PermissionDenied,

    #[error("{0}")]
    Unavailable(String),

    #[error("Geolocation is not supported by this device.")]
    Unsupported,
}

/// Source of the device position.
#[async_trait]
pub trait Geolocator: Send + Sync {
    async fn current_position(&self) -> Result<Coordinates, GeoError>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum LocationStatus {
    Idle,
    Requesting,
    Denied,
    Updating,
    Error(String),
    Complete(Coordinates),
}

/// One-shot flow that asks for the position and stores it, rounded, on the
/// user's profile.
pub struct LocationOnboarding {
    backend: Arc<dyn Backend>,
    geolocator: Arc<dyn Geolocator>,
    profile: Profile,
    status: LocationStatus,
}

impl LocationOnboarding {
    pub fn new(backend: Arc<dyn Backend>, geolocator: Arc<dyn Geolocator>, profile: Profile) -> Self {
        Self {
            backend,
            geolocator,
            profile,
            status: LocationStatus::Idle,
        }
    }

    pub fn status(&self) -> &LocationStatus {
        &self.status
    }

    /// Message to show for `Denied` and `Error`.
    pub fn message(&self) -> Option<String> {
        match &self.status {
            LocationStatus::Denied => Some(ClientError::LocationDenied.to_string()),
            LocationStatus::Error(msg) => Some(msg.clone()),
            _ => None,
        }
    }

    /// Request the position and persist it. After `Denied` or `Error` the
    /// device is not asked again until [`retry`](Self::retry); a completed
    /// flow returns the stored position.
    pub async fn request(&mut self) -> Result<Coordinates, ClientError> {
        match &self.status {
            LocationStatus::Complete(position) => return Ok(*position),
            LocationStatus::Denied => return Err(ClientError::LocationDenied),
            LocationStatus::Error(msg) => return Err(ClientError::LocationUnavailable(msg.clone())),
            // Requesting and Updating only linger after a cancelled request
            LocationStatus::Idle | LocationStatus::Requesting | LocationStatus::Updating => {}
        }
        self.status = LocationStatus::Requesting;

        let position = match self.geolocator.current_position().await {
            Ok(position) => position.rounded(),
            Err(GeoError::PermissionDenied) => {
                warn!("Location permission denied");
                self.status = LocationStatus::Denied;
                return Err(ClientError::LocationDenied);
            }
            Err(e) => {
                warn!("Location unavailable: {}", e);
                self.status = LocationStatus::Error(e.to_string());
                return Err(ClientError::LocationUnavailable(e.to_string()));
            }
        };

        self.status = LocationStatus::Updating;
        if let Err(e) = self
            .backend
            .update_location(self.profile.id, position.lat, position.lon)
            .await
        {
            let err = ClientError::from(e);
            self.status = LocationStatus::Error(err.to_string());
            return Err(err);
        }

        info!("Location set to ({}, {})", position.lat, position.lon);
        self.profile.lat_rounded = position.lat;
        self.profile.lon_rounded = position.lon;
        self.status = LocationStatus::Complete(position);
        Ok(position)
    }

    /// Go back to `Idle` after `Denied` or `Error`.
    pub fn retry(&mut self) {
        if matches!(self.status, LocationStatus::Denied | LocationStatus::Error(_)) {
            self.status = LocationStatus::Idle;
        }
    }
}
