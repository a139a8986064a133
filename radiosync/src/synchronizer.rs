//! Playlist synchronization
//!
//! A station's destination playlist is fully replaced by the tracks resolved
//! from its observations in a time window: one clear call, then appends in
//! batches of [`MAX_TRACKS_PER_REQUEST`], preserving chronological order.
//! Running it twice over unchanged data yields the same playlist.

use crate::error::{Result, SyncError};
use chrono::Utc;
use futures::stream::{self, StreamExt, TryStreamExt};
use radiocatalog::{TrackResolver, MAX_TRACKS_PER_REQUEST};
use radioscraper::{Station, StationRegistry};
use radiostore::{Storage, StorageError, TimeRange};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Tuning for [`PlaylistSynchronizer`]
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Stations synchronized at the same time by [`PlaylistSynchronizer::sync_all`]
    pub concurrency: usize,
    /// Track resolutions in flight for one station
    pub resolve_concurrency: usize,
    /// Create a playlist for stations that have none
    pub create_missing_playlists: bool,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            concurrency: 4,
            resolve_concurrency: 8,
            create_missing_playlists: true,
        }
    }
}

/// Outcome of one successful station sync
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    pub station_id: String,
    pub playlist_id: String,
    /// Observations in the window
    pub songs: usize,
    /// Tracks written to the playlist
    pub tracks: usize,
}

/// Counts for a multi-station run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncSummary {
    pub attempted: usize,
    pub synced: usize,
    pub failed: usize,
}

pub struct PlaylistSynchronizer {
    registry: Arc<dyn StationRegistry>,
    storage: Arc<dyn Storage>,
    resolver: Arc<TrackResolver>,
    options: SyncOptions,
}

impl PlaylistSynchronizer {
    pub fn new(
        registry: Arc<dyn StationRegistry>,
        storage: Arc<dyn Storage>,
        resolver: Arc<TrackResolver>,
        options: SyncOptions,
    ) -> Self {
        Self {
            registry,
            storage,
            resolver,
            options,
        }
    }

    pub fn resolver(&self) -> &Arc<TrackResolver> {
        &self.resolver
    }

    /// Replaces the station's playlist with the tracks observed in `range`.
    pub async fn sync_station(
        &self,
        station_id: &str,
        range: TimeRange,
        cancel: &CancellationToken,
    ) -> Result<SyncReport> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(SyncError::Cancelled),
            report = self.sync_station_inner(station_id, range) => report,
        }
    }

    async fn sync_station_inner(&self, station_id: &str, range: TimeRange) -> Result<SyncReport> {
        let station = self.registry.get_by_id(station_id).map_err(|e| match e {
            radioscraper::Error::StationNotFound(id) => {
                SyncError::config(format!("unknown station '{}'", id))
            }
            other => SyncError::Registry(other),
        })?;

        if station.destination_playlist().is_none() && !self.options.create_missing_playlists {
            return Err(SyncError::config(format!(
                "station '{}' has no playlist id",
                station.id
            )));
        }

        let since = range.since(Utc::now());
        let observations = self.storage.songs_since(&station.id, since).await?;
        debug!(station = %station.id, %range, songs = observations.len(), "Observations in window");

        let playlist_id = match station.destination_playlist() {
            Some(id) => id.to_string(),
            None => self.create_playlist(&station).await?,
        };

        let resolver = &self.resolver;
        let lookups: Vec<_> = observations
            .iter()
            .map(|obs| resolver.resolve(&obs.song.artist, &obs.song.title))
            .collect();
        let resolved: Vec<Option<String>> = stream::iter(lookups)
            .buffered(self.options.resolve_concurrency.max(1))
            .try_collect()
            .await?;
        let tracks: Vec<String> = resolved.into_iter().flatten().collect();

        self.write_playlist(&playlist_id, &tracks).await?;

        info!(
            station = %station.id,
            playlist = %playlist_id,
            songs = observations.len(),
            tracks = tracks.len(),
            "Playlist synchronized"
        );

        Ok(SyncReport {
            station_id: station.id,
            playlist_id,
            songs: observations.len(),
            tracks: tracks.len(),
        })
    }

    /// Clear, then append in order. The first failing batch aborts the rest.
    async fn write_playlist(&self, playlist_id: &str, tracks: &[String]) -> Result<()> {
        let catalog = self.resolver.catalog();
        catalog.replace_playlist_tracks(playlist_id, &[]).await?;
        for batch in tracks.chunks(MAX_TRACKS_PER_REQUEST) {
            catalog.add_tracks_to_playlist(playlist_id, batch).await?;
        }
        Ok(())
    }

    /// Creates the station's playlist and writes its id back to the registry
    async fn create_playlist(&self, station: &Station) -> Result<String> {
        let catalog = self.resolver.catalog();
        let user = catalog.current_user().await?;
        let playlist = catalog
            .create_playlist(
                &user.id,
                &format!("Now Playing on {}", station.name),
                &format!("Songs played on {}", station.name),
                false,
            )
            .await?;

        let mut updated = station.clone();
        updated.playlist_id = Some(playlist.id.clone());
        self.registry.update_station(&updated)?;

        info!(station = %station.id, playlist = %playlist.id, "Created playlist");
        Ok(playlist.id)
    }

    /// Synchronizes `pinned` only, or every station with stored observations.
    ///
    /// Each station succeeds or fails on its own; only listing the stations
    /// can fail the whole run.
    pub async fn sync_all(
        &self,
        range: TimeRange,
        pinned: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<SyncSummary> {
        let station_ids: Vec<String> = match pinned {
            Some(id) => vec![id.to_string()],
            None => self.storage.station_ids().await?.into_iter().collect(),
        };

        let mut summary = SyncSummary {
            attempted: station_ids.len(),
            ..Default::default()
        };

        let mut results = stream::iter(station_ids)
            .map(|id| async move {
                let result = self.sync_station(&id, range, cancel).await;
                (id, result)
            })
            .buffer_unordered(self.options.concurrency.max(1));

        while let Some((id, result)) = results.next().await {
            match result {
                Ok(_) => summary.synced += 1,
                Err(SyncError::Cancelled) => {
                    summary.failed += 1;
                    debug!(station = %id, "Sync cancelled");
                }
                Err(SyncError::Storage(e @ StorageError::NotFound(_))) => {
                    summary.failed += 1;
                    warn!(station = %id, error = %e, "Nothing to synchronize");
                }
                Err(SyncError::Storage(e)) => {
                    summary.failed += 1;
                    error!(station = %id, error = %e, "Storage failure during sync");
                }
                Err(e) => {
                    summary.failed += 1;
                    warn!(station = %id, error = %e, "Playlist sync failed");
                }
            }
        }

        info!(
            attempted = summary.attempted,
            synced = summary.synced,
            failed = summary.failed,
            "Sync cycle finished"
        );
        Ok(summary)
    }
}
