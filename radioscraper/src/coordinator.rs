//! Fan-out/fan-in fetching over a set of stations
//!
//! Station fetches are driven as a bounded stream: at most `concurrency`
//! futures exist at any time, whatever the size of the registry. A failing
//! station never affects its siblings: its error is logged and it simply
//! contributes no song to the result.

use crate::client::HttpFetcher;
use crate::error::{Error, Result};
use crate::models::{Song, Station, StationSong};
use crate::registry::StationRegistry;
use crate::strategy::{NowPlaying, Scraper};
use futures::stream::{self, StreamExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Default number of concurrent station fetches
pub const DEFAULT_CONCURRENCY: usize = 8;

/// Bounded concurrent fetcher
#[derive(Debug, Clone)]
pub struct FetchCoordinator {
    http: HttpFetcher,
    concurrency: usize,
}

impl FetchCoordinator {
    pub fn new(http: HttpFetcher, concurrency: usize) -> Self {
        Self {
            http,
            concurrency: concurrency.max(1),
        }
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Either the one requested station or the whole registry
    pub fn select_stations(
        registry: &dyn StationRegistry,
        station_id: Option<&str>,
    ) -> Result<Vec<Station>> {
        match station_id {
            Some(id) => Ok(vec![registry.get_by_id(id)?]),
            None => Ok(registry.get_all()),
        }
    }

    /// Fetches `stations` and returns the songs that could be extracted.
    ///
    /// Result order is unspecified. Cancelling `cancel` aborts in-flight
    /// requests; stations not yet fetched are skipped.
    pub async fn fetch(&self, stations: Vec<Station>, cancel: &CancellationToken) -> Vec<StationSong> {
        let attempted = stations.len();
        let jobs: Vec<(Station, Scraper)> = stations
            .into_iter()
            .filter_map(|station| match Scraper::for_station(&station) {
                Ok(scraper) => Some((station, scraper)),
                Err(err) => {
                    warn!(station = %station.id, error = %err, "Invalid station descriptor");
                    None
                }
            })
            .collect();

        let http = &self.http;
        let outcomes: Vec<(Station, Result<Song>)> = stream::iter(jobs)
            .map(|(station, scraper)| async move {
                let result = fetch_one(&scraper, http, cancel).await;
                (station, result)
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        let mut songs = Vec::with_capacity(outcomes.len());
        for (station, result) in outcomes {
            match result {
                Ok(song) => {
                    debug!(station = %station.id, song = %song, "Now playing");
                    songs.push(StationSong {
                        station_id: station.id,
                        station_name: station.name,
                        song,
                    });
                }
                Err(Error::Cancelled) => {
                    debug!(station = %station.id, "Fetch cancelled");
                }
                Err(err) => {
                    let kind = if err.is_transient() { "transient" } else { "extraction" };
                    warn!(station = %station.id, kind, error = %err, "Skipping station this cycle");
                }
            }
        }

        info!(attempted, fetched = songs.len(), "Fetch cycle finished");
        songs
    }

    /// Shorthand for [`select_stations`](Self::select_stations) followed by [`fetch`](Self::fetch)
    pub async fn fetch_from_registry(
        &self,
        registry: &dyn StationRegistry,
        station_id: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<Vec<StationSong>> {
        let stations = Self::select_stations(registry, station_id)?;
        Ok(self.fetch(stations, cancel).await)
    }
}

async fn fetch_one(scraper: &Scraper, http: &HttpFetcher, cancel: &CancellationToken) -> Result<Song> {
    if cancel.is_cancelled() {
        return Err(Error::Cancelled);
    }

    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(Error::Cancelled),
        song = scraper.now_playing(http) => song,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::JsonStationRegistry;

    #[test]
    fn test_select_stations() {
        let registry = JsonStationRegistry::from_stations(vec![
            Station::plaintext("a", "A", "http://a", "(?P<artist>.+)-(?P<title>.+)"),
            Station::plaintext("b", "B", "http://b", "(?P<artist>.+)-(?P<title>.+)"),
        ]);

        let all = FetchCoordinator::select_stations(&registry, None).unwrap();
        assert_eq!(all.len(), 2);

        let one = FetchCoordinator::select_stations(&registry, Some("b")).unwrap();
        assert_eq!(one[0].id, "b");

        assert!(matches!(
            FetchCoordinator::select_stations(&registry, Some("zzz")),
            Err(Error::StationNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let coordinator = FetchCoordinator::new(HttpFetcher::new().unwrap(), 2);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let stations = vec![Station::plaintext(
            "a",
            "A",
            "http://127.0.0.1:9/np",
            "(?P<artist>.+)-(?P<title>.+)",
        )];
        assert!(coordinator.fetch(stations, &cancel).await.is_empty());
    }

    #[test]
    fn test_concurrency_floor() {
        let coordinator = FetchCoordinator::new(HttpFetcher::new().unwrap(), 0);
        assert_eq!(coordinator.concurrency(), 1);
    }
}
