//! Application context
//!
//! Everything a command needs, built once at startup from the configuration
//! and passed down explicitly.

use crate::config_ext::SyncConfigExt;
use crate::synchronizer::{PlaylistSynchronizer, SyncOptions};
use anyhow::Result;
use radiocatalog::{CatalogClient, CatalogConfigExt, TrackResolver};
use radioconfig::Config;
use radioscraper::{FetchCoordinator, ScraperConfigExt, StationRegistry};
use radiostore::{Storage, StorageConfigExt};
use std::sync::Arc;

pub struct AppContext {
    pub registry: Arc<dyn StationRegistry>,
    pub coordinator: FetchCoordinator,
    pub storage: Arc<dyn Storage>,
    /// Absent when the catalog is not needed (fetch/store only, `no_playlist`)
    pub catalog: Option<Arc<dyn CatalogClient>>,
    pub synchronizer: Option<Arc<PlaylistSynchronizer>>,
}

impl AppContext {
    /// Opens the registry and storage, and the catalog when `with_catalog`.
    ///
    /// Any failure here is fatal for the run.
    pub async fn from_config(config: &Config, with_catalog: bool) -> Result<Self> {
        let registry: Arc<dyn StationRegistry> = Arc::new(config.open_station_registry()?);
        let coordinator = config.build_fetch_coordinator()?;
        let storage = config.open_configured_storage().await?;

        let mut context = Self::new(registry, coordinator, storage);
        if with_catalog {
            let catalog: Arc<dyn CatalogClient> = Arc::new(config.build_catalog_client()?);
            let resolver = TrackResolver::new(catalog, config.build_track_cache().await?);
            context = context.with_resolver(resolver, config.get_sync_options());
        }
        Ok(context)
    }

    pub fn new(
        registry: Arc<dyn StationRegistry>,
        coordinator: FetchCoordinator,
        storage: Arc<dyn Storage>,
    ) -> Self {
        Self {
            registry,
            coordinator,
            storage,
            catalog: None,
            synchronizer: None,
        }
    }

    /// Enables playlist synchronization through `resolver`
    pub fn with_resolver(mut self, resolver: TrackResolver, options: SyncOptions) -> Self {
        let catalog = resolver.catalog().clone();
        self.synchronizer = Some(Arc::new(PlaylistSynchronizer::new(
            self.registry.clone(),
            self.storage.clone(),
            Arc::new(resolver),
            options,
        )));
        self.catalog = Some(catalog);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operations::{fetch_and_store, sync_playlists};
    use crate::SyncError;
    use radiostore::TimeRange;
    use tokio_util::sync::CancellationToken;

    #[tokio::test]
    async fn test_from_config_without_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let stations = dir.path().join("stations.json");
        std::fs::write(
            &stations,
            r#"{"stations": [{"id": "txt", "name": "Text", "url": "http://127.0.0.1:9/np",
                "type": "plaintext", "regex": "(?P<artist>.+) - (?P<title>.+)"}]}"#,
        )
        .unwrap();
        let yaml = format!(
            "stations:\n  file: {}\nstorage:\n  type: sqlite\n  path: {}\n",
            stations.display(),
            dir.path().join("radio.sqlite").display()
        );
        let config = Config::from_yaml_str(&yaml).unwrap();

        let ctx = AppContext::from_config(&config, false).await.unwrap();
        assert_eq!(ctx.registry.get_all().len(), 1);
        assert_eq!(ctx.storage.backend_name(), "sqlite");
        assert!(ctx.catalog.is_none());

        let cancel = CancellationToken::new();
        let err = sync_playlists(&ctx, TimeRange::LastDay, None, &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::Config(_)));

        let err = fetch_and_store(&ctx, Some("nope"), false, &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::Config(_)));
    }

    #[tokio::test]
    async fn test_missing_station_file_is_fatal() {
        let config = Config::from_yaml_str("stations:\n  file: /nonexistent/stations.json\nstorage:\n  type: memory\n").unwrap();
        assert!(AppContext::from_config(&config, false).await.is_err());
    }
}
