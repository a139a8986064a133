//! Synchronization and daemon settings on top of [`radioconfig::Config`]

use crate::scheduler::SchedulerConfig;
use crate::synchronizer::SyncOptions;
use anyhow::Result;
use radioconfig::Config;
use radiostore::StorageConfigExt;
use std::time::Duration;

/// Default fetch period (1 minute)
pub const DEFAULT_FETCH_INTERVAL: Duration = Duration::from_secs(60);

/// Default playlist sync period (1 hour)
pub const DEFAULT_PLAYLIST_INTERVAL: Duration = Duration::from_secs(3600);

/// Default keep-alive timeout (10 seconds)
pub const DEFAULT_KEEPALIVE_TIMEOUT: Duration = Duration::from_secs(10);

pub trait SyncConfigExt {
    fn get_sync_options(&self) -> SyncOptions;

    /// `None` when `daemon.fetch_interval` is 0
    fn get_fetch_interval(&self) -> Option<Duration>;

    /// `None` when `daemon.playlist_interval` is 0
    fn get_playlist_interval(&self) -> Option<Duration>;

    /// `None` when `daemon.keepalive_interval` is 0 (the default)
    fn get_keepalive_interval(&self) -> Option<Duration>;

    fn get_keepalive_timeout(&self) -> Duration;

    fn get_no_store(&self) -> bool;

    fn get_no_playlist(&self) -> bool;

    /// Everything the scheduler needs, `sync.range` included
    fn get_scheduler_config(&self) -> Result<SchedulerConfig>;
}

fn enabled(interval: Duration) -> Option<Duration> {
    (!interval.is_zero()).then_some(interval)
}

impl SyncConfigExt for Config {
    fn get_sync_options(&self) -> SyncOptions {
        let defaults = SyncOptions::default();
        SyncOptions {
            concurrency: self.get_u64_or(&["sync", "concurrency"], defaults.concurrency as u64)
                as usize,
            resolve_concurrency: self
                .get_u64_or(&["sync", "resolve_concurrency"], defaults.resolve_concurrency as u64)
                as usize,
            create_missing_playlists: self.get_bool_or(
                &["sync", "create_missing_playlists"],
                defaults.create_missing_playlists,
            ),
        }
    }

    fn get_fetch_interval(&self) -> Option<Duration> {
        enabled(self.get_duration_or(&["daemon", "fetch_interval"], DEFAULT_FETCH_INTERVAL))
    }

    fn get_playlist_interval(&self) -> Option<Duration> {
        enabled(self.get_duration_or(&["daemon", "playlist_interval"], DEFAULT_PLAYLIST_INTERVAL))
    }

    fn get_keepalive_interval(&self) -> Option<Duration> {
        enabled(self.get_duration_or(&["daemon", "keepalive_interval"], Duration::ZERO))
    }

    fn get_keepalive_timeout(&self) -> Duration {
        self.get_duration_or(&["daemon", "keepalive_timeout"], DEFAULT_KEEPALIVE_TIMEOUT)
    }

    fn get_no_store(&self) -> bool {
        self.get_bool_or(&["daemon", "no_store"], false)
    }

    fn get_no_playlist(&self) -> bool {
        self.get_bool_or(&["daemon", "no_playlist"], false)
    }

    fn get_scheduler_config(&self) -> Result<SchedulerConfig> {
        Ok(SchedulerConfig {
            fetch_interval: self.get_fetch_interval(),
            sync_interval: self.get_playlist_interval(),
            keepalive_interval: self.get_keepalive_interval(),
            keepalive_timeout: self.get_keepalive_timeout(),
            range: self.get_sync_range()?,
            pinned_station: None,
            no_store: self.get_no_store(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use radiostore::TimeRange;

    #[test]
    fn test_defaults() {
        let config = Config::from_yaml_str("{}").unwrap();
        let scheduler = config.get_scheduler_config().unwrap();
        assert_eq!(scheduler.fetch_interval, Some(Duration::from_secs(60)));
        assert_eq!(scheduler.sync_interval, Some(Duration::from_secs(3600)));
        assert_eq!(scheduler.keepalive_interval, None);
        assert_eq!(scheduler.range, TimeRange::LastDay);
        assert!(!scheduler.no_store);

        let options = config.get_sync_options();
        assert_eq!(options.concurrency, 4);
        assert!(options.create_missing_playlists);
    }

    #[test]
    fn test_zero_disables_trigger() {
        let config = Config::from_yaml_str(
            "daemon:\n  fetch_interval: 0\n  playlist_interval: 30m\n  keepalive_interval: 5m\n",
        )
        .unwrap();
        assert_eq!(config.get_fetch_interval(), None);
        assert_eq!(config.get_playlist_interval(), Some(Duration::from_secs(1800)));
        assert_eq!(config.get_keepalive_interval(), Some(Duration::from_secs(300)));
    }
}
