//! # radiostore - per-station now-playing history
//!
//! An append-only observation log per station with change detection: a song
//! equal to the station's latest stored song is not recorded again.
//!
//! Several backends implement the same [`Storage`] contract:
//!
//! | type       | layout |
//! |------------|--------|
//! | `memory`   | nothing persisted |
//! | `file`     | `<dir>/<station>.jsonl` append logs |
//! | `sqlite`   | one `station_<id>` table per station |
//! | `postgres` | same, in PostgreSQL (feature `postgres`) |
//!
//! ```no_run
//! use radiostore::{open_storage, StorageKind, TimeRange};
//! use radioscraper::Song;
//!
//! # async fn example() -> radiostore::Result<()> {
//! let storage = open_storage(StorageKind::Sqlite, "data/radio.sqlite").await?;
//! let changed = storage
//!     .store_observation("fip", &Song::new("Muse", "Uprising").unwrap())
//!     .await?;
//! let since = TimeRange::LastDay.since(chrono::Utc::now());
//! let history = storage.songs_since("fip", since).await?;
//! # Ok(())
//! # }
//! ```

pub mod backends;
pub mod config_ext;
pub mod error;
pub mod models;

pub use backends::{FileStorage, MemoryStorage, SqliteStorage};
#[cfg(feature = "postgres")]
pub use backends::PostgresStorage;
pub use config_ext::StorageConfigExt;
pub use error::{validate_station_id, Result, StorageError};
pub use models::{Observation, TimeRange};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use radioscraper::Song;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Observation log contract shared by every backend
#[async_trait]
pub trait Storage: Send + Sync {
    /// Short backend name for logs
    fn backend_name(&self) -> &'static str;

    /// Rebuilds the latest-song index from durable storage.
    ///
    /// Backends call this when opened; calling it again is harmless.
    async fn init(&self) -> Result<()>;

    /// Records `song` now, unless it repeats the station's latest song.
    ///
    /// Returns whether the observation was stored.
    async fn store_observation(&self, station_id: &str, song: &Song) -> Result<bool> {
        self.store_observation_at(station_id, song, Utc::now()).await
    }

    /// Same as [`store_observation`](Self::store_observation) with an explicit timestamp
    async fn store_observation_at(
        &self,
        station_id: &str,
        song: &Song,
        observed_at: DateTime<Utc>,
    ) -> Result<bool>;

    /// Most recently stored song, [`StorageError::NotFound`] if none
    async fn latest(&self, station_id: &str) -> Result<Song>;

    /// Observations strictly after `since`, oldest first.
    ///
    /// [`StorageError::NotFound`] if the station never had an observation;
    /// an empty window is `Ok(vec![])`.
    async fn songs_since(&self, station_id: &str, since: DateTime<Utc>) -> Result<Vec<Observation>>;

    /// Stations with at least one observation
    async fn station_ids(&self) -> Result<BTreeSet<String>>;
}

/// Keeps observations after `since`, in chronological order
pub(crate) fn window(
    entries: impl IntoIterator<Item = Observation>,
    since: DateTime<Utc>,
) -> Vec<Observation> {
    let mut kept: Vec<Observation> = entries
        .into_iter()
        .filter(|o| o.observed_at > since)
        .collect();
    kept.sort_by_key(|o| o.observed_at);
    kept
}

/// Selectable backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageKind {
    Memory,
    File,
    Sqlite,
    Postgres,
}

impl FromStr for StorageKind {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(StorageKind::Memory),
            "file" => Ok(StorageKind::File),
            "sqlite" => Ok(StorageKind::Sqlite),
            "postgres" | "postgresql" => Ok(StorageKind::Postgres),
            other => Err(StorageError::UnknownBackend(other.to_string())),
        }
    }
}

impl fmt::Display for StorageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StorageKind::Memory => "memory",
            StorageKind::File => "file",
            StorageKind::Sqlite => "sqlite",
            StorageKind::Postgres => "postgres",
        })
    }
}

/// Opens a backend and loads its latest-song index.
///
/// `location` is a directory for `file`, a database file for `sqlite`, a
/// connection URL for `postgres`, and is ignored for `memory`.
pub async fn open_storage(kind: StorageKind, location: &str) -> Result<Arc<dyn Storage>> {
    let storage: Arc<dyn Storage> = match kind {
        StorageKind::Memory => Arc::new(MemoryStorage::new()),
        StorageKind::File => Arc::new(FileStorage::open(location).await?),
        StorageKind::Sqlite => Arc::new(SqliteStorage::open(location).await?),
        #[cfg(feature = "postgres")]
        StorageKind::Postgres => Arc::new(PostgresStorage::connect(location).await?),
        #[cfg(not(feature = "postgres"))]
        StorageKind::Postgres => {
            return Err(StorageError::UnknownBackend(
                "postgres (built without the `postgres` feature)".into(),
            ))
        }
    };
    tracing::info!(backend = storage.backend_name(), location, "Storage opened");
    Ok(storage)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_kind() {
        assert_eq!("SQLite".parse::<StorageKind>().unwrap(), StorageKind::Sqlite);
        assert_eq!("postgresql".parse::<StorageKind>().unwrap(), StorageKind::Postgres);
        assert!(matches!(
            "redis".parse::<StorageKind>(),
            Err(StorageError::UnknownBackend(_))
        ));
    }

    #[test]
    fn test_window_is_strict_and_sorted() {
        let t0 = Utc::now();
        let at = |secs: i64| t0 + chrono::Duration::seconds(secs);
        let song = |t: &str| Song::new("A", t).unwrap();
        let entries = vec![
            Observation::new(song("late"), at(30)),
            Observation::new(song("edge"), at(0)),
            Observation::new(song("mid"), at(10)),
        ];

        let kept = window(entries, t0);
        let titles: Vec<_> = kept.iter().map(|o| o.song.title.as_str()).collect();
        assert_eq!(titles, vec!["mid", "late"]);
    }

    #[tokio::test]
    async fn test_open_memory() {
        let storage = open_storage(StorageKind::Memory, "").await.unwrap();
        assert_eq!(storage.backend_name(), "memory");
    }
}
