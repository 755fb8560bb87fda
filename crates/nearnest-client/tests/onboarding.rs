mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use common::{FakeBackend, profile};
use nearnest_client::ClientError;
use nearnest_client::geo::Coordinates;
use nearnest_client::location::{GeoError, Geolocator, LocationOnboarding, LocationStatus};
use nearnest_client::profile::{HandlePolicy, MAX_HANDLE_ATTEMPTS, ProfileBootstrap};
use nearnest_client::session::{Screen, SessionOrchestrator};
use nearnest_store::{LocalStore, flags};
use nearnest_types::events::AuthEvent;

struct StubGeolocator(Result<Coordinates, GeoError>);

#[async_trait]
impl Geolocator for StubGeolocator {
    async fn current_position(&self) -> Result<Coordinates, GeoError> {
        self.0.clone()
    }
}

/// Denies every request and counts how often it was asked.
#[derive(Default)]
struct DenyingGeolocator {
    asked: AtomicUsize,
}

#[async_trait]
impl Geolocator for DenyingGeolocator {
    async fn current_position(&self) -> Result<Coordinates, GeoError> {
        self.asked.fetch_add(1, Ordering::SeqCst);
        Err(GeoError::PermissionDenied)
    }
}

fn store() -> Arc<LocalStore> {
    Arc::new(LocalStore::open_in_memory().unwrap())
}

#[tokio::test]
async fn test_session_walks_through_onboarding() {
    let (backend, user) = FakeBackend::signed_in();
    let backend = Arc::new(backend);
    let mut session = SessionOrchestrator::new(backend.clone(), store());
    assert_eq!(session.screen(), Screen::Loading);

    assert_eq!(session.start().await, Screen::NeedsProfile);

    let bootstrap = ProfileBootstrap::new(backend.clone(), user.id);
    let created = bootstrap.create(HandlePolicy::Generated, None).await.unwrap();
    assert_eq!((created.lat_rounded, created.lon_rounded), (0.0, 0.0));
    assert_eq!(session.profile_created(created.clone()), Screen::NeedsLocation);

    let geo = Arc::new(StubGeolocator(Ok(Coordinates::new(37.422_06, -122.084_49))));
    let mut onboarding = LocationOnboarding::new(backend.clone(), geo, created);
    let coords = onboarding.request().await.unwrap();
    assert_eq!(coords, Coordinates::new(37.422, -122.084));
    assert_eq!(onboarding.status(), &LocationStatus::Complete(coords));

    assert_eq!(session.location_set().await, Screen::Ready);
    assert_eq!(session.profile().unwrap().lat_rounded, 37.422);
}

#[tokio::test]
async fn test_session_without_identity() {
    let backend = Arc::new(FakeBackend::new());
    let mut session = SessionOrchestrator::new(backend, store());
    assert_eq!(session.start().await, Screen::Unauthenticated);
}

#[tokio::test]
async fn test_profile_fetch_failure_counts_as_missing() {
    let (backend, user) = FakeBackend::signed_in();
    let mut p = profile("night_owl", 37.422, -122.084);
    p.id = user.id;
    backend.put_profile(p);
    backend.fail_reads.store(true, Ordering::SeqCst);

    let mut session = SessionOrchestrator::new(Arc::new(backend), store());
    assert_eq!(session.start().await, Screen::NeedsProfile);
}

#[tokio::test]
async fn test_loss_of_identity_resets() {
    let (backend, user) = FakeBackend::signed_in();
    let mut p = profile("night_owl", 37.422, -122.084);
    p.id = user.id;
    backend.put_profile(p);

    let mut session = SessionOrchestrator::new(Arc::new(backend), store());
    assert_eq!(session.start().await, Screen::Ready);
    assert_eq!(session.apply(AuthEvent::TokenRefreshed(user)).await, Screen::Ready);

    assert_eq!(session.apply(AuthEvent::SignedOut).await, Screen::Unauthenticated);
    assert!(session.user().is_none());
    assert!(session.profile().is_none());
}

#[tokio::test]
async fn test_sign_out_sets_flag_and_sign_in_clears_it() {
    let (backend, user) = FakeBackend::signed_in();
    let backend = Arc::new(backend);
    let store = store();
    let mut session = SessionOrchestrator::new(backend.clone(), store.clone());
    session.start().await;

    assert_eq!(session.sign_out().await.unwrap(), Screen::Unauthenticated);
    assert_eq!(backend.sign_outs.load(Ordering::SeqCst), 1);
    assert!(session.was_signed_out());
    assert!(flags::signed_out(&store));

    session.apply(AuthEvent::SignedIn(user)).await;
    assert!(!session.was_signed_out());
}

#[tokio::test]
async fn test_generated_handle_retries_then_gives_up() {
    let (backend, user) = FakeBackend::signed_in();
    backend.conflicts.store(MAX_HANDLE_ATTEMPTS, Ordering::SeqCst);
    let backend = Arc::new(backend);
    let bootstrap = ProfileBootstrap::new(backend.clone(), user.id);

    let err = bootstrap.create_generated().await.unwrap_err();
    assert!(matches!(err, ClientError::HandleRetriesExhausted { attempts: 3 }));
    assert_eq!(backend.profile_attempts.lock().unwrap().len(), 3);

    // A manual retry starts over at the first attempt.
    let profile = bootstrap.create_generated().await.unwrap();
    assert!(profile.handle.starts_with("User_"));
    assert_eq!(backend.profile_attempts.lock().unwrap().len(), 4);
}

#[tokio::test]
async fn test_generated_handle_succeeds_after_one_conflict() {
    let (backend, user) = FakeBackend::signed_in();
    backend.conflicts.store(1, Ordering::SeqCst);
    let backend = Arc::new(backend);

    let profile = ProfileBootstrap::new(backend.clone(), user.id)
        .create_generated()
        .await
        .unwrap();
    let attempts = backend.profile_attempts.lock().unwrap().clone();
    assert_eq!(attempts.len(), 2);
    assert_eq!(attempts[1], profile.handle);
}

#[tokio::test]
async fn test_other_failures_are_not_retried() {
    let (backend, user) = FakeBackend::signed_in();
    backend.fail_writes.store(true, Ordering::SeqCst);
    let backend = Arc::new(backend);

    let err = ProfileBootstrap::new(backend.clone(), user.id)
        .create_generated()
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "permission denied for table");
}

#[tokio::test]
async fn test_chosen_handle() {
    let (backend, user) = FakeBackend::signed_in();
    backend.taken.lock().unwrap().insert("night_owl".to_string());
    let backend = Arc::new(backend);
    let bootstrap = ProfileBootstrap::new(backend.clone(), user.id);

    let err = bootstrap.create_chosen("Night_Owl").await.unwrap_err();
    assert!(matches!(err, ClientError::HandleTaken(ref h) if h == "night_owl"));
    assert_eq!(err.to_string(), "That handle is already taken");

    let err = bootstrap.create_chosen("ab").await.unwrap_err();
    assert!(matches!(err, ClientError::InvalidHandle(_)));
    assert_eq!(backend.profile_attempts.lock().unwrap().len(), 1);

    let profile = bootstrap.create_chosen(" Early_Bird ").await.unwrap();
    assert_eq!(profile.handle, "early_bird");
}

#[tokio::test]
async fn test_location_denied_then_retry() {
    let (backend, user) = FakeBackend::signed_in();
    let backend = Arc::new(backend);
    let mut p = profile("night_owl", 0.0, 0.0);
    p.id = user.id;

    let geo = Arc::new(StubGeolocator(Err(GeoError::PermissionDenied)));
    let mut onboarding = LocationOnboarding::new(backend.clone(), geo, p);

    let err = onboarding.request().await.unwrap_err();
    assert!(matches!(err, ClientError::LocationDenied));
    assert_eq!(onboarding.status(), &LocationStatus::Denied);
    assert_eq!(
        onboarding.message().unwrap(),
        "Location access was denied. NearNest needs your location to show nearby messages."
    );
    assert!(backend.locations.lock().unwrap().is_empty());

    onboarding.retry();
    assert_eq!(onboarding.status(), &LocationStatus::Idle);
}

#[tokio::test]
async fn test_location_not_asked_again_until_retry() {
    let (backend, user) = FakeBackend::signed_in();
    let mut p = profile("night_owl", 0.0, 0.0);
    p.id = user.id;

    let geo = Arc::new(DenyingGeolocator::default());
    let mut onboarding = LocationOnboarding::new(Arc::new(backend), geo.clone(), p);

    onboarding.request().await.unwrap_err();
    let err = onboarding.request().await.unwrap_err();
    assert!(matches!(err, ClientError::LocationDenied));
    assert_eq!(onboarding.status(), &LocationStatus::Denied);
    assert_eq!(geo.asked.load(Ordering::SeqCst), 1);

    onboarding.retry();
    onboarding.request().await.unwrap_err();
    assert_eq!(geo.asked.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_completed_location_is_not_requested_again() {
    let (backend, user) = FakeBackend::signed_in();
    let backend = Arc::new(backend);
    let mut p = profile("night_owl", 0.0, 0.0);
    p.id = user.id;

    let geo = Arc::new(StubGeolocator(Ok(Coordinates::new(51.5007, -0.1246))));
    let mut onboarding = LocationOnboarding::new(backend.clone(), geo, p);

    let first = onboarding.request().await.unwrap();
    let second = onboarding.request().await.unwrap();
    assert_eq!(first, second);
    assert_eq!(backend.locations.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_location_unsupported_and_write_failure() {
    let (backend, user) = FakeBackend::signed_in();
    let backend = Arc::new(backend);
    let mut p = profile("night_owl", 0.0, 0.0);
    p.id = user.id;

    let geo = Arc::new(StubGeolocator(Err(GeoError::Unsupported)));
    let mut onboarding = LocationOnboarding::new(backend.clone(), geo, p.clone());
    onboarding.request().await.unwrap_err();
    assert_eq!(
        onboarding.status(),
        &LocationStatus::Error("Geolocation is not supported by this device.".to_string())
    );

    backend.fail_writes.store(true, Ordering::SeqCst);
    let geo = Arc::new(StubGeolocator(Ok(Coordinates::new(51.5007, -0.1246))));
    let mut onboarding = LocationOnboarding::new(backend, geo, p);
    onboarding.request().await.unwrap_err();
    assert!(matches!(onboarding.status(), LocationStatus::Error(_)));
}
