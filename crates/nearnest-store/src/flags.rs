//! Small typed flags and records kept next to the block list.

use nearnest_types::api::Session;

use crate::LocalStore;

/// Storage key for the "explicitly signed out" marker.
pub const SIGNED_OUT_KEY: &str = "nearnest-signed-out";

/// Storage key for the saved auth session.
pub const SESSION_KEY: &str = "nearnest-auth-session";

/// Whether the user signed out on purpose, as opposed to never having signed in.
pub fn signed_out(store: &LocalStore) -> bool {
    matches!(store.get(SIGNED_OUT_KEY), Ok(Some(v)) if v == "true")
}

pub fn set_signed_out(store: &LocalStore, value: bool) {
    if value {
        if let Err(e) = store.set(SIGNED_OUT_KEY, "true") {
            tracing::warn!("Local write of '{}' failed: {}", SIGNED_OUT_KEY, e);
        }
    } else {
        store.discard(SIGNED_OUT_KEY);
    }
}

pub fn load_session(store: &LocalStore) -> Option<Session> {
    store.load_json(SESSION_KEY)
}

pub fn save_session(store: &LocalStore, session: &Session) {
    store.save_json(SESSION_KEY, session);
}

pub fn clear_session(store: &LocalStore) {
    store.discard(SESSION_KEY);
}
