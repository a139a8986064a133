//! Physical storage backends
//!
//! Every backend keeps an in-memory index of the latest song per station,
//! rebuilt from durable storage by `init`. The index lock is held across
//! the durable write, so the compare-then-append step is atomic per backend.
//!
//! Lock order is always the index first, then whatever guards the durable
//! store. `init` holds the index for the whole rebuild.

mod file;
mod memory;
#[cfg(feature = "postgres")]
mod postgres;
mod sqlite;

pub use file::FileStorage;
pub use memory::MemoryStorage;
#[cfg(feature = "postgres")]
pub use postgres::PostgresStorage;
pub use sqlite::SqliteStorage;

use crate::error::{Result, StorageError};
use radioscraper::Song;
use std::collections::HashMap;
use tokio::sync::{Mutex, MutexGuard};

/// Latest stored song per station
#[derive(Debug, Default)]
pub(crate) struct LatestIndex {
    songs: Mutex<HashMap<String, Song>>,
}

impl LatestIndex {
    pub(crate) async fn lock(&self) -> MutexGuard<'_, HashMap<String, Song>> {
        self.songs.lock().await
    }

    pub(crate) async fn get(&self, station_id: &str) -> Result<Song> {
        self.songs
            .lock()
            .await
            .get(station_id)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(station_id.to_string()))
    }
}

/// True when `song` repeats the latest entry and must not be stored
pub(crate) fn is_repeat(latest: &HashMap<String, Song>, station_id: &str, song: &Song) -> bool {
    let repeat = latest.get(station_id) == Some(song);
    if repeat {
        tracing::debug!(station = %station_id, song = %song, "Song unchanged, not stored");
    }
    repeat
}
