use std::sync::Arc;

use anyhow::bail;
use nearnest_client::ClientError;
use nearnest_client::location::LocationOnboarding;
use nearnest_client::profile::{HandlePolicy, ProfileBootstrap};
use nearnest_client::session::Screen;

use super::{App, next_step};
use crate::geo::FixedGeolocator;

/// Create the profile under the configured (or overridden) handle policy.
pub async fn setup(app: &mut App, handle: Option<String>) -> anyhow::Result<()> {
    if app.session.screen() != Screen::NeedsProfile {
        bail!("{}", next_step(app.session.screen()));
    }
    let Some(user) = app.session.user().cloned() else {
        bail!("{}", next_step(Screen::Unauthenticated));
    };

    let policy = if handle.is_some() {
        HandlePolicy::Chosen
    } else {
        app.settings.handle_policy
    };
    if policy == HandlePolicy::Chosen && handle.is_none() {
        bail!("Choose a handle with 'nearnest setup --handle <name>'");
    }

    let bootstrap = ProfileBootstrap::new(app.backend(), user.id);
    let profile = match bootstrap.create(policy, handle.as_deref()).await {
        Ok(profile) => profile,
        Err(e @ ClientError::HandleRetriesExhausted { .. }) => {
            bail!("{}. Run 'nearnest setup' to try again", e)
        }
        Err(e) => bail!("{}", e),
    };

    let screen = app.session.profile_created(profile.clone());
    println!("✓ Profile created: {}", profile.handle);
    println!("{}", next_step(screen));
    Ok(())
}

pub async fn locate(app: &mut App, lat: Option<f64>, lon: Option<f64>) -> anyhow::Result<()> {
    let profile = match (app.session.screen(), app.session.profile()) {
        (Screen::NeedsLocation | Screen::Ready, Some(profile)) => profile.clone(),
        (screen, _) => bail!("{}", next_step(screen)),
    };

    let geolocator = Arc::new(FixedGeolocator::new(lat, lon));
    let mut onboarding = LocationOnboarding::new(app.backend(), geolocator, profile);
    let coords = match onboarding.request().await {
        Ok(coords) => coords,
        Err(e) => bail!("{}", onboarding.message().unwrap_or_else(|| e.to_string())),
    };

    let screen = app.session.location_set().await;
    println!("✓ Location set to {:.3}, {:.3}", coords.lat, coords.lon);
    println!("{}", next_step(screen));
    Ok(())
}
