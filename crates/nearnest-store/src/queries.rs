use crate::LocalStore;
use anyhow::Result;
use rusqlite::Connection;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::warn;

impl LocalStore {
    // -- Raw access --

    pub fn get(&self, key: &str) -> Result<Option<String>> {
        self.with_conn(|conn| query_value(conn, key))
    }

    pub fn set(&self, key: &str, value: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO kv (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = datetime('now')",
                (key, value),
            )?;
            Ok(())
        })
    }

    pub fn remove(&self, key: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute("DELETE FROM kv WHERE key = ?1", [key])?;
            Ok(())
        })
    }

    // -- Best-effort typed access --

    /// Read and decode a JSON value. Missing keys, unreadable storage and
    /// undecodable values all come back as `None`.
    pub fn load_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match self.get(key) {
            Ok(raw) => raw?,
            Err(e) => {
                warn!("Local read of '{}' failed: {}", key, e);
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Ignoring unreadable local value '{}': {}", key, e);
                None
            }
        }
    }

    /// Encode and write a JSON value; failures are logged and dropped.
    pub fn save_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) {
        let encoded = match serde_json::to_string(value) {
            Ok(encoded) => encoded,
            Err(e) => {
                warn!("Could not encode local value '{}': {}", key, e);
                return;
            }
        };

        if let Err(e) = self.set(key, &encoded) {
            warn!("Local write of '{}' failed: {}", key, e);
        }
    }

    /// Delete a key; failures are logged and dropped.
    pub fn discard(&self, key: &str) {
        if let Err(e) = self.remove(key) {
            warn!("Local delete of '{}' failed: {}", key, e);
        }
    }
}

fn query_value(conn: &Connection, key: &str) -> Result<Option<String>> {
    let value = conn
        .query_row("SELECT value FROM kv WHERE key = ?1", [key], |row| row.get(0))
        .optional()?;
    Ok(value)
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_overwrites() {
        let store = LocalStore::open_in_memory().unwrap();
        store.set("k", "one").unwrap();
        store.set("k", "two").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("two"));

        store.remove("k").unwrap();
        assert_eq!(store.get("k").unwrap(), None);
    }

    #[test]
    fn test_load_json_ignores_garbage() {
        let store = LocalStore::open_in_memory().unwrap();
        store.set("k", "{not json").unwrap();
        assert_eq!(store.load_json::<Vec<String>>("k"), None);
    }
}
