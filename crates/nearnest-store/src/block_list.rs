use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::info;

use crate::LocalStore;

/// Storage key holding a JSON array of blocked handles.
pub const BLOCK_LIST_KEY: &str = "nearnest-blocked-handles";

/// Handles the user has blocked on this device.
///
/// Blocking is by display handle, not identity: a new account that later
/// takes a blocked handle is blocked too. Nothing here reaches the backend.
pub struct BlockList {
    store: Arc<LocalStore>,
    handles: BTreeSet<String>,
}

impl BlockList {
    /// Read the persisted set. Absent or corrupt data loads as empty.
    pub fn load(store: Arc<LocalStore>) -> Self {
        let handles = store
            .load_json::<Vec<String>>(BLOCK_LIST_KEY)
            .map(|list| list.into_iter().collect())
            .unwrap_or_default();

        Self { store, handles }
    }

    /// Add `handle` and persist the whole set. Blocking twice is a no-op.
    pub fn block(&mut self, handle: &str) {
        if self.handles.insert(handle.to_string()) {
            info!("Blocked handle {}", handle);
        }
        self.persist();
    }

    pub fn is_blocked(&self, handle: &str) -> bool {
        self.handles.contains(handle)
    }

    pub fn handles(&self) -> impl Iterator<Item = &str> {
        self.handles.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    fn persist(&self) {
        let list: Vec<&str> = self.handles().collect();
        self.store.save_json(BLOCK_LIST_KEY, &list);
    }
}
