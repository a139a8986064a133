//! Scraper settings on top of [`radioconfig::Config`]
//!
//! ```no_run
//! use radioconfig::Config;
//! use radioscraper::ScraperConfigExt;
//!
//! # fn main() -> anyhow::Result<()> {
//! let config = Config::load(None)?;
//! let registry = config.open_station_registry()?;
//! let coordinator = config.build_fetch_coordinator()?;
//! # Ok(())
//! # }
//! ```

use crate::client::{HttpFetcher, DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_USER_AGENT};
use crate::coordinator::{FetchCoordinator, DEFAULT_CONCURRENCY};
use crate::registry::JsonStationRegistry;
use anyhow::{Context, Result};
use radioconfig::Config;
use std::path::PathBuf;
use std::time::Duration;

pub trait ScraperConfigExt {
    /// Location of the station file, relative paths resolved against the config dir
    fn get_stations_file(&self) -> PathBuf;

    fn get_scraper_concurrency(&self) -> usize;

    fn get_scraper_timeout(&self) -> Duration;

    fn get_scraper_user_agent(&self) -> String;

    fn build_http_fetcher(&self) -> Result<HttpFetcher>;

    fn build_fetch_coordinator(&self) -> Result<FetchCoordinator>;

    fn open_station_registry(&self) -> Result<JsonStationRegistry>;
}

impl ScraperConfigExt for Config {
    fn get_stations_file(&self) -> PathBuf {
        self.resolve_path(&self.get_string_or(&["stations", "file"], "stations.json"))
    }

    fn get_scraper_concurrency(&self) -> usize {
        self.get_u64_or(&["scraper", "concurrency"], DEFAULT_CONCURRENCY as u64) as usize
    }

    fn get_scraper_timeout(&self) -> Duration {
        Duration::from_secs(self.get_u64_or(&["scraper", "timeout_secs"], DEFAULT_REQUEST_TIMEOUT_SECS))
    }

    fn get_scraper_user_agent(&self) -> String {
        self.get_string_or(&["scraper", "user_agent"], DEFAULT_USER_AGENT)
    }

    fn build_http_fetcher(&self) -> Result<HttpFetcher> {
        HttpFetcher::builder()
            .timeout(self.get_scraper_timeout())
            .user_agent(self.get_scraper_user_agent())
            .build()
            .context("Failed to build HTTP client for station sources")
    }

    fn build_fetch_coordinator(&self) -> Result<FetchCoordinator> {
        Ok(FetchCoordinator::new(
            self.build_http_fetcher()?,
            self.get_scraper_concurrency(),
        ))
    }

    fn open_station_registry(&self) -> Result<JsonStationRegistry> {
        let path = self.get_stations_file();
        JsonStationRegistry::load(&path)
            .with_context(|| format!("Failed to load stations from {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::from_yaml_str("{}").unwrap();
        assert_eq!(config.get_scraper_concurrency(), 8);
        assert_eq!(config.get_scraper_timeout(), Duration::from_secs(10));
        assert!(config.get_stations_file().ends_with("stations.json"));
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_yaml_str(
            "scraper:\n  concurrency: 2\n  timeout_secs: 3\nstations:\n  file: /tmp/s.json\n",
        )
        .unwrap();
        assert_eq!(config.get_scraper_concurrency(), 2);
        assert_eq!(config.get_scraper_timeout(), Duration::from_secs(3));
        assert_eq!(config.get_stations_file(), PathBuf::from("/tmp/s.json"));
        assert_eq!(config.build_fetch_coordinator().unwrap().concurrency(), 2);
    }
}
