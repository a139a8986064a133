//! Song to catalog track resolution

use crate::cache::{cache_key, CacheTier, TrackCache};
use crate::client::CatalogClient;
use crate::error::Result;
use std::sync::Arc;
use tracing::debug;

/// Maps `(artist, title)` to a catalog track id through the [`TrackCache`].
///
/// Misses are searched in the catalog and the best hit is cached in both
/// tiers. "No match" is `Ok(None)` and is not cached, so a later run can
/// pick up tracks added to the catalog in the meantime.
pub struct TrackResolver {
    catalog: Arc<dyn CatalogClient>,
    cache: TrackCache,
}

impl TrackResolver {
    pub fn new(catalog: Arc<dyn CatalogClient>, cache: TrackCache) -> Self {
        Self { catalog, cache }
    }

    pub fn cache(&self) -> &TrackCache {
        &self.cache
    }

    pub fn catalog(&self) -> &Arc<dyn CatalogClient> {
        &self.catalog
    }

    /// Search transport errors are returned as is.
    pub async fn resolve(&self, artist: &str, title: &str) -> Result<Option<String>> {
        let key = cache_key(artist, title);

        if let Some((id, tier)) = self.cache.get(&key).await {
            match tier {
                CacheTier::Local => debug!(key = %key, "Local cache hit"),
                CacheTier::Shared => debug!(key = %key, "Shared cache hit"),
            }
            return Ok(Some(id));
        }

        let query = format!("{} {}", artist, title);
        let results = self.catalog.search_tracks(&query).await?;
        match results.into_iter().next() {
            Some(track) => {
                debug!(key = %key, track = %track.id, "Resolved by search");
                self.cache.put(&key, &track.id).await;
                Ok(Some(track.id))
            }
            None => {
                debug!(key = %key, "No catalog match");
                Ok(None)
            }
        }
    }
}
