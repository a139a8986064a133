//! Flat-file backend: one append-only JSON Lines log per station
//!
//! Layout: `<dir>/<station id>.jsonl`, one `{"artist","title","timestamp"}`
//! record per line. Unreadable lines (e.g. a torn write) are skipped, and a
//! log that does not end with a newline is terminated before the next append
//! so the torn tail never swallows a new record.

use super::{is_repeat, LatestIndex};
use crate::error::{validate_station_id, Result, StorageError};
use crate::models::Observation;
use crate::Storage;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use radioscraper::Song;
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use tokio::fs;
use std::io::SeekFrom;
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};
use tracing::{debug, warn};

const LOG_EXTENSION: &str = "jsonl";

#[derive(Debug)]
pub struct FileStorage {
    dir: PathBuf,
    latest: LatestIndex,
}

impl FileStorage {
    /// Opens (and creates if needed) the log directory, then loads the latest index.
    pub async fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).await?;
        let storage = Self {
            dir,
            latest: LatestIndex::default(),
        };
        storage.init().await?;
        Ok(storage)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn log_path(&self, station_id: &str) -> PathBuf {
        self.dir.join(format!("{}.{}", station_id, LOG_EXTENSION))
    }

    async fn read_log(&self, station_id: &str) -> Result<Vec<Observation>> {
        let path = self.log_path(station_id);
        let content = match fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StorageError::NotFound(station_id.to_string()))
            }
            Err(e) => return Err(e.into()),
        };

        let entries: Vec<Observation> = content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .filter_map(|line| match serde_json::from_str(line) {
                Ok(obs) => Some(obs),
                Err(e) => {
                    warn!(station = %station_id, error = %e, "Skipping unreadable log line");
                    None
                }
            })
            .collect();

        if entries.is_empty() {
            return Err(StorageError::NotFound(station_id.to_string()));
        }
        Ok(entries)
    }

    async fn logged_station_ids(&self) -> Result<Vec<String>> {
        let mut ids = Vec::new();
        let mut dir = fs::read_dir(&self.dir).await?;
        while let Some(entry) = dir.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(LOG_EXTENSION) {
                continue;
            }
            if let Some(id) = path.file_stem().and_then(|s| s.to_str()) {
                if validate_station_id(id).is_ok() {
                    ids.push(id.to_string());
                }
            }
        }
        Ok(ids)
    }
}

#[async_trait]
impl Storage for FileStorage {
    fn backend_name(&self) -> &'static str {
        "file"
    }

    async fn init(&self) -> Result<()> {
        let mut index = self.latest.lock().await;
        let mut latest = HashMap::new();
        for id in self.logged_station_ids().await? {
            match self.read_log(&id).await {
                Ok(entries) => {
                    if let Some(last) = entries.into_iter().last() {
                        latest.insert(id, last.song);
                    }
                }
                Err(StorageError::NotFound(_)) => {}
                Err(e) => return Err(e),
            }
        }
        debug!(dir = %self.dir.display(), stations = latest.len(), "Latest index loaded");
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

        let record = serde_json::to_string(&Observation::new(song.clone(), observed_at))?;

        let mut file = fs::OpenOptions::new()
            .read(true)
            .create(true)
            .append(true)
            .open(self.log_path(station_id))
            .await?;

        let mut line = String::with_capacity(record.len() + 2);
        if !ends_with_newline(&mut file).await? {
            warn!(station = %station_id, "Log tail is unterminated, closing it before append");
            line.push('\n');
        }
        line.push_str(&record);
        line.push('\n');
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;

        latest.insert(station_id.to_string(), song.clone());
        Ok(true)
    }

    async fn latest(&self, station_id: &str) -> Result<Song> {
        self.latest.get(station_id).await
    }

    async fn songs_since(&self, station_id: &str, since: DateTime<Utc>) -> Result<Vec<Observation>> {
        validate_station_id(station_id)?;
        let entries = self.read_log(station_id).await?;
        Ok(crate::window(entries, since))
    }

    async fn station_ids(&self) -> Result<BTreeSet<String>> {
        let mut ids = BTreeSet::new();
        for id in self.logged_station_ids().await? {
            match self.read_log(&id).await {
                Ok(_) => {
                    ids.insert(id);
                }
                Err(StorageError::NotFound(_)) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(ids)
    }
}

/// True for an empty file or one whose last byte is `\n`
async fn ends_with_newline(file: &mut fs::File) -> Result<bool> {
    let len = file.metadata().await?.len();
    if len == 0 {
        return Ok(true);
    }
    file.seek(SeekFrom::Start(len - 1)).await?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last).await?;
    Ok(last[0] == b'\n')
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_log_layout() {
        let dir = TempDir::new().unwrap();
        let storage = FileStorage::open(dir.path()).await.unwrap();
        let song = Song::new("Muse", "Uprising").unwrap();
        storage.store_observation("fip", &song).await.unwrap();

        let content = std::fs::read_to_string(dir.path().join("fip.jsonl")).unwrap();
        assert_eq!(content.lines().count(), 1);
        assert!(content.contains("\"artist\":\"Muse\""));
        assert!(content.contains("\"timestamp\""));
    }

    #[tokio::test]
    async fn test_torn_line_is_ignored() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("fip.jsonl"),
            "{\"artist\":\"A\",\"title\":\"B\",\"timestamp\":\"2024-01-01T00:00:00Z\"}\n{\"artist\":\"C\",\"ti",
        )
        .unwrap();

        let storage = FileStorage::open(dir.path()).await.unwrap();
        assert_eq!(
            storage.latest("fip").await.unwrap(),
            Song::new("A", "B").unwrap()
        );
    }

    #[tokio::test]
    async fn test_append_after_torn_line_keeps_new_record() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("fip.jsonl"),
            "{\"artist\":\"A\",\"title\":\"B\",\"timestamp\":\"2024-01-01T00:00:00Z\"}\n{\"artist\":\"C\",\"ti",
        )
        .unwrap();

        let storage = FileStorage::open(dir.path()).await.unwrap();
        let song = Song::new("Muse", "Uprising").unwrap();
        assert!(storage.store_observation("fip", &song).await.unwrap());

        let since = DateTime::parse_from_rfc3339("2023-01-01T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let history = storage.songs_since("fip", since).await.unwrap();
        let songs: Vec<Song> = history.into_iter().map(|o| o.song).collect();
        assert_eq!(songs, vec![Song::new("A", "B").unwrap(), song.clone()]);

        // A fresh instance sees the same history.
        let reopened = FileStorage::open(dir.path()).await.unwrap();
        assert_eq!(reopened.latest("fip").await.unwrap(), song);

        let content = std::fs::read_to_string(dir.path().join("fip.jsonl")).unwrap();
        assert!(content.ends_with('\n'));
        assert_eq!(content.lines().count(), 3);
    }

    #[tokio::test]
    async fn test_foreign_files_are_not_stations() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("notes.txt"), "hello").unwrap();
        std::fs::write(dir.path().join("empty.jsonl"), "").unwrap();

        let storage = FileStorage::open(dir.path()).await.unwrap();
        assert!(storage.station_ids().await.unwrap().is_empty());
        assert!(storage.songs_since("empty", Utc::now()).await.unwrap_err().is_not_found());
    }
}
