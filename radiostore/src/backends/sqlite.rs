//! Embedded relational backend: one SQLite table per station
//!
//! Tables are named `station_<id>` and created on the first write for a
//! station. Timestamps are stored as Unix milliseconds.

use super::{is_repeat, LatestIndex};
use crate::error::{validate_station_id, Result, StorageError};
use crate::models::Observation;
use crate::Storage;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use radioscraper::Song;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use std::sync::{Arc, Mutex as StdMutex};
use tokio::task::spawn_blocking;

const TABLE_PREFIX: &str = "station_";

pub struct SqliteStorage {
    conn: Arc<StdMutex<Connection>>,
    latest: LatestIndex,
}

impl std::fmt::Debug for SqliteStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStorage").finish_non_exhaustive()
    }
}

fn table_name(station_id: &str) -> String {
    format!("\"{}{}\"", TABLE_PREFIX, station_id)
}

fn lock(conn: &StdMutex<Connection>) -> Result<std::sync::MutexGuard<'_, Connection>> {
    conn.lock()
        .map_err(|_| StorageError::Backend("sqlite connection lock poisoned".into()))
}

fn to_datetime(millis: i64) -> Result<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp_millis(millis)
        .ok_or_else(|| StorageError::Backend(format!("invalid timestamp {}", millis)))
}

fn list_tables(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT name FROM sqlite_master WHERE type = 'table' AND name LIKE 'station\\_%' ESCAPE '\\'",
    )?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(names
        .into_iter()
        .filter_map(|name| name.strip_prefix(TABLE_PREFIX).map(str::to_string))
        .filter(|id| validate_station_id(id).is_ok())
        .collect())
}

fn table_exists(conn: &Connection, station_id: &str) -> Result<bool> {
    let name = format!("{}{}", TABLE_PREFIX, station_id);
    let found: Option<i64> = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1",
            [name],
            |row| row.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}

impl SqliteStorage {
    /// Opens the database file, creating parent directories as needed.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let conn = spawn_blocking(move || -> Result<Connection> {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let conn = Connection::open(&path)?;
            conn.pragma_update(None, "journal_mode", "WAL")?;
            Ok(conn)
        })
        .await??;
        Self::with_connection(conn).await
    }

    /// In-memory database, mostly for tests
    pub async fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?).await
    }

    async fn with_connection(conn: Connection) -> Result<Self> {
        let storage = Self {
            conn: Arc::new(StdMutex::new(conn)),
            latest: LatestIndex::default(),
        };
        storage.init().await?;
        Ok(storage)
    }

    fn conn(&self) -> Arc<StdMutex<Connection>> {
        self.conn.clone()
    }
}

#[async_trait]
impl Storage for SqliteStorage {
    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    async fn init(&self) -> Result<()> {
        let mut index = self.latest.lock().await;
        let conn = self.conn();
        let latest = spawn_blocking(move || -> Result<HashMap<String, Song>> {
            let conn = lock(&conn)?;
            let mut latest = HashMap::new();
            for id in list_tables(&conn)? {
                let sql = format!(
                    "SELECT artist, title FROM {} ORDER BY id DESC LIMIT 1",
                    table_name(&id)
                );
                let row: Option<(String, String)> = conn
                    .query_row(&sql, [], |row| Ok((row.get(0)?, row.get(1)?)))
                    .optional()?;
                if let Some((artist, title)) = row {
                    latest.insert(id, Song { artist, title });
                }
            }
            Ok(latest)
        })
        .await??;

        tracing::debug!(stations = latest.len(), "SQLite latest index loaded");
        *index = latest;
        Ok(())
    }

    async fn store_observation_at(
        &self,
        station_id: &str,
        song: &Song,
        observed_at: DateTime<Utc>,
    ) -> Result<bool> {
        validate_station_id(station_id)?;
        let mut latest = self.latest.lock().await;
        if is_repeat(&latest, station_id, song) {
            return Ok(false);
        }

        let conn = self.conn();
        let table = table_name(station_id);
        let record = song.clone();
        spawn_blocking(move || -> Result<()> {
            let mut conn = lock(&conn)?;
            let tx = conn.transaction()?;
            tx.execute_batch(&format!(
                "CREATE TABLE IF NOT EXISTS {table} (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    artist TEXT NOT NULL,
                    title TEXT NOT NULL,
                    observed_at_ms INTEGER NOT NULL
                );"
            ))?;
            tx.execute(
                &format!("INSERT INTO {table} (artist, title, observed_at_ms) VALUES (?1, ?2, ?3)"),
                params![record.artist, record.title, observed_at.timestamp_millis()],
            )?;
            tx.commit()?;
            Ok(())
        })
        .await??;

        latest.insert(station_id.to_string(), song.clone());
        Ok(true)
    }

    async fn latest(&self, station_id: &str) -> Result<Song> {
        self.latest.get(station_id).await
    }

    async fn songs_since(&self, station_id: &str, since: DateTime<Utc>) -> Result<Vec<Observation>> {
        validate_station_id(station_id)?;
        let conn = self.conn();
        let id = station_id.to_string();
        let since_ms = since.timestamp_millis();

        spawn_blocking(move || -> Result<Vec<Observation>> {
            let conn = lock(&conn)?;
            if !table_exists(&conn, &id)? {
                return Err(StorageError::NotFound(id));
            }

            let mut stmt = conn.prepare(&format!(
                "SELECT artist, title, observed_at_ms FROM {}
                 WHERE observed_at_ms > ?1
                 ORDER BY observed_at_ms ASC, id ASC",
                table_name(&id)
            ))?;
            let mut rows = stmt.query([since_ms])?;
            let mut entries = Vec::new();
            while let Some(row) = rows.next()? {
                entries.push(Observation::new(
                    Song {
                        artist: row.get(0)?,
                        title: row.get(1)?,
                    },
                    to_datetime(row.get(2)?)?,
                ));
            }
            Ok(entries)
        })
        .await?
    }

    async fn station_ids(&self) -> Result<BTreeSet<String>> {
        let conn = self.conn();
        spawn_blocking(move || -> Result<BTreeSet<String>> {
            let conn = lock(&conn)?;
            let mut ids = BTreeSet::new();
            for id in list_tables(&conn)? {
                let count: i64 =
                    conn.query_row(&format!("SELECT COUNT(*) FROM {}", table_name(&id)), [], |row| {
                        row.get(0)
                    })?;
                if count > 0 {
                    ids.insert(id);
                }
            }
            Ok(ids)
        })
        .await?
    }
}
