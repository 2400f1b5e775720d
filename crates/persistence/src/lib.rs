#![deny(warnings)]

//! Persistence layer: key-value stores, the snapshot codec and the
//! background writer that keeps the saved game in step with the session.
//!
//! The whole game lives under one key. [`SnapshotStore`] loads and saves that
//! entry; [`SaveWriter`] owns it once the session is running and applies saves
//! in order, off the interaction path.

use std::fmt::Display;
use std::path::Path;

use game_core::GameState;
use thiserror::Error;
use tracing::debug;

pub mod snapshot;
pub mod store;
pub mod writer;

pub use snapshot::{decode, encode, DecodeError};
pub use store::{FileStore, KeyValueStore, MemoryStore, SqliteStore};
pub use writer::SaveWriter;

/// Key the game snapshot is stored under.
pub const DEFAULT_STORAGE_KEY: &str = "CLICKER_GAME_STATE_V1";

/// Returns the default SQLite URL used for local saves.
pub fn default_sqlite_url() -> &'static str {
    "sqlite://./saves/clicker.db"
}

/// Filesystem path of a file-backed SQLite URL, `None` for in-memory databases.
pub fn sqlite_file_path(url: &str) -> Option<&Path> {
    let path = url
        .strip_prefix("sqlite://")
        .or_else(|| url.strip_prefix("sqlite:"))?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() || path.starts_with(":memory:") {
        return None;
    }
    Some(Path::new(path))
}

/// Create the directory holding a file-backed SQLite database.
pub fn ensure_sqlite_dir(url: &str) -> std::io::Result<()> {
    if let Some(parent) = sqlite_file_path(url).and_then(Path::parent) {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

/// Storage failures. None of these are fatal to a running session.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backing store could not be opened or prepared.
    #[error("failed to open store: {0}")]
    Open(String),
    /// Stored value could not be read or decoded.
    #[error("failed to read '{key}': {reason}")]
    Read { key: String, reason: String },
    /// Value could not be encoded or written.
    #[error("failed to write '{key}': {reason}")]
    Write { key: String, reason: String },
}

impl StorageError {
    pub fn read(key: &str, reason: impl Display) -> Self {
        StorageError::Read {
            key: key.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn write(key: &str, reason: impl Display) -> Self {
        StorageError::Write {
            key: key.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Loads and saves the game snapshot under a fixed key.
#[derive(Debug)]
pub struct SnapshotStore<S> {
    store: S,
    key: String,
}

impl<S: KeyValueStore> SnapshotStore<S> {
    pub fn new(store: S, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Previously saved state, `Ok(None)` when nothing was saved yet.
    ///
    /// A stored value that cannot be decoded yields [`StorageError::Read`];
    /// callers fall back to defaults exactly as for `Ok(None)`.
    pub async fn load(&self) -> Result<Option<GameState>, StorageError> {
        let Some(text) = self.store.get(&self.key).await? else {
            debug!(key = %self.key, "no snapshot stored");
            return Ok(None);
        };
        let state = snapshot::decode(&text).map_err(|e| StorageError::read(&self.key, e))?;
        debug!(key = %self.key, coins = state.coins, "snapshot loaded");
        Ok(Some(state))
    }

    /// Overwrite the stored snapshot with `state`.
    pub async fn save(&self, state: &GameState) -> Result<(), StorageError> {
        let text = snapshot::encode(state).map_err(|e| StorageError::write(&self.key, e))?;
        self.store.set(&self.key, &text).await
    }

    /// Remove the stored snapshot.
    pub async fn clear(&self) -> Result<(), StorageError> {
        self.store.remove(&self.key).await
    }
}
