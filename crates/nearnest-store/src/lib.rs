pub mod block_list;
pub mod flags;
pub mod migrations;
pub mod queries;

pub use block_list::BlockList;

use anyhow::Result;
use rusqlite::Connection;
use std::path::Path;
use std::sync::Mutex;
use tracing::{info, warn};

/// Client-local durable key-value store.
///
/// Everything stored here is best-effort: the typed accessors in
/// [`queries`], [`block_list`] and [`flags`] log and swallow failures.
pub struct LocalStore {
    /// `None` when no backing database could be opened at all.
    conn: Option<Mutex<Connection>>,
}

impl LocalStore {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;

        conn.pragma_update(None, "journal_mode", "WAL")?;

        migrations::run(&conn)?;

        info!("Local store opened at {}", path.display());
        Ok(Self {
            conn: Some(Mutex::new(conn)),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        migrations::run(&conn)?;
        Ok(Self {
            conn: Some(Mutex::new(conn)),
        })
    }

    /// Open the store at `path`, falling back to a throwaway in-memory store
    /// when the file cannot be used, and to a store that drops every write
    /// when even that fails. Local state is never fatal.
    pub fn open_or_memory(path: &Path) -> Self {
        match Self::open(path) {
            Ok(store) => store,
            Err(e) => {
                warn!("Local store at {} unavailable, using memory: {}", path.display(), e);
                Self::open_in_memory().unwrap_or_else(|e| {
                    warn!("In-memory store unavailable, local state disabled: {}", e);
                    Self { conn: None }
                })
            }
        }
    }

    pub fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self
            .conn
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("Local store disabled"))?
            .lock()
            .map_err(|e| anyhow::anyhow!("Store lock poisoned: {}", e))?;
        f(&conn)
    }
}
