use async_trait::async_trait;

use nearnest_client::geo::Coordinates;
use nearnest_client::location::{GeoError, Geolocator};

/// A terminal has no position sensor; the position comes from arguments.
pub struct FixedGeolocator {
    position: Option<Coordinates>,
}

impl FixedGeolocator {
    pub fn new(lat: Option<f64>, lon: Option<f64>) -> Self {
        let position = match (lat, lon) {
            (Some(lat), Some(lon)) => Some(Coordinates::new(lat, lon)),
            _ => None,
        };
        Self { position }
    }
}

#[async_trait]
impl Geolocator for FixedGeolocator {
    async fn current_position(&self) -> Result<Coordinates, GeoError> {
        let position = self.position.ok_or(GeoError::Unsupported)?;
        if !(-90.0..=90.0).contains(&position.lat) || !(-180.0..=180.0).contains(&position.lon) {
            return Err(GeoError::Unavailable(format!(
                "({}, {}) is not a valid position",
                position.lat, position.lon
            )));
        }
        Ok(position)
    }
}
