//! Volatile backend, history is lost on exit

use super::{is_repeat, LatestIndex};
use crate::error::{validate_station_id, Result, StorageError};
use crate::models::Observation;
use crate::Storage;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use radioscraper::Song;
use std::collections::{BTreeSet, HashMap};
use tokio::sync::Mutex;

#[derive(Debug, Default)]
pub struct MemoryStorage {
    latest: LatestIndex,
    log: Mutex<HashMap<String, Vec<Observation>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn init(&self) -> Result<()> {
        // Same lock order as `store_observation_at`: index first, then log.
        let mut latest = self.latest.lock().await;
        let log = self.log.lock().await;
        *latest = log
            .iter()
            .filter_map(|(id, entries)| entries.last().map(|o| (id.clone(), o.song.clone())))
            .collect();
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

        self.log
            .lock()
            .await
            .entry(station_id.to_string())
            .or_default()
            .push(Observation::new(song.clone(), observed_at));
        latest.insert(station_id.to_string(), song.clone());
        Ok(true)
    }

    async fn latest(&self, station_id: &str) -> Result<Song> {
        self.latest.get(station_id).await
    }

    async fn songs_since(&self, station_id: &str, since: DateTime<Utc>) -> Result<Vec<Observation>> {
        let log = self.log.lock().await;
        let entries = log
            .get(station_id)
            .filter(|entries| !entries.is_empty())
            .ok_or_else(|| StorageError::NotFound(station_id.to_string()))?;
        Ok(crate::window(entries.iter().cloned(), since))
    }

    async fn station_ids(&self) -> Result<BTreeSet<String>> {
        Ok(self
            .log
            .lock()
            .await
            .iter()
            .filter(|(_, entries)| !entries.is_empty())
            .map(|(id, _)| id.clone())
            .collect())
    }
}
