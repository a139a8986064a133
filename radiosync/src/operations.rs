//! One-shot operations shared by the CLI commands and the daemon cycles

use crate::context::AppContext;
use crate::error::{Result, SyncError};
use crate::synchronizer::SyncSummary;
use radioscraper::{FetchCoordinator, StationSong};
use radiostore::{Storage, TimeRange};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Counts for a fetch (and store) cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreSummary {
    pub attempted: usize,
    pub fetched: usize,
    pub changed: usize,
    pub failed: usize,
}

fn unknown_station(err: radioscraper::Error) -> SyncError {
    match err {
        radioscraper::Error::StationNotFound(id) => {
            SyncError::config(format!("unknown station '{}'", id))
        }
        other => SyncError::Registry(other),
    }
}

/// Fetches now playing for one station or all of them, without storing
pub async fn fetch_now_playing(
    ctx: &AppContext,
    station: Option<&str>,
    cancel: &CancellationToken,
) -> Result<Vec<StationSong>> {
    let stations =
        FetchCoordinator::select_stations(ctx.registry.as_ref(), station).map_err(unknown_station)?;
    Ok(ctx.coordinator.fetch(stations, cancel).await)
}

/// Stores fetched songs, skipping repeats.
///
/// Storage failures are logged per station and do not stop the batch.
pub async fn store_songs(storage: &dyn Storage, songs: &[StationSong], dry_run: bool) -> StoreSummary {
    let mut summary = StoreSummary {
        fetched: songs.len(),
        ..Default::default()
    };

    for entry in songs {
        if dry_run {
            info!(station = %entry.station_id, song = %entry.song, "Dry run, not stored");
            continue;
        }
        match storage.store_observation(&entry.station_id, &entry.song).await {
            Ok(true) => {
                summary.changed += 1;
                debug!(station = %entry.station_id, song = %entry.song, "Stored");
            }
            Ok(false) => {}
            Err(e) => {
                summary.failed += 1;
                error!(station = %entry.station_id, error = %e, "Failed to store observation");
            }
        }
    }
    summary
}

/// Fetch then store: the `store` command and the daemon fetch cycle
pub async fn fetch_and_store(
    ctx: &AppContext,
    station: Option<&str>,
    dry_run: bool,
    cancel: &CancellationToken,
) -> Result<StoreSummary> {
    let stations =
        FetchCoordinator::select_stations(ctx.registry.as_ref(), station).map_err(unknown_station)?;
    let attempted = stations.len();
    let songs = ctx.coordinator.fetch(stations, cancel).await;

    let summary = StoreSummary {
        attempted,
        ..store_songs(ctx.storage.as_ref(), &songs, dry_run).await
    };
    info!(
        attempted = summary.attempted,
        fetched = summary.fetched,
        changed = summary.changed,
        "Store cycle finished"
    );
    Ok(summary)
}

/// Synchronizes one station's playlist, or all stations with history
pub async fn sync_playlists(
    ctx: &AppContext,
    range: TimeRange,
    station: Option<&str>,
    cancel: &CancellationToken,
) -> Result<SyncSummary> {
    let synchronizer = ctx
        .synchronizer
        .as_ref()
        .ok_or_else(|| SyncError::config("playlist synchronization is not configured"))?;
    synchronizer.sync_all(range, station, cancel).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use radioscraper::Song;
    use radiostore::MemoryStorage;

    fn observed(station: &str, artist: &str, title: &str) -> StationSong {
        StationSong {
            station_id: station.into(),
            station_name: station.to_uppercase(),
            song: Song::new(artist, title).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_store_songs_counts_changes() {
        let storage = MemoryStorage::new();
        let batch = vec![observed("a", "Muse", "Uprising"), observed("b", "Air", "Venus")];

        let first = store_songs(&storage, &batch, false).await;
        assert_eq!(first.fetched, 2);
        assert_eq!(first.changed, 2);

        let second = store_songs(&storage, &batch, false).await;
        assert_eq!(second.changed, 0);
        assert_eq!(second.failed, 0);
    }

    #[tokio::test]
    async fn test_store_songs_dry_run_and_failures() {
        let storage = MemoryStorage::new();
        let batch = vec![observed("ok", "Muse", "Uprising"), observed("bad id!", "Air", "Venus")];

        let dry = store_songs(&storage, &batch, true).await;
        assert_eq!(dry.changed, 0);
        assert!(storage.station_ids().await.unwrap().is_empty());

        let summary = store_songs(&storage, &batch, false).await;
        assert_eq!(summary.changed, 1);
        assert_eq!(summary.failed, 1);
    }
}
