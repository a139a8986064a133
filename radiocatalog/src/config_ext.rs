//! Catalog and cache settings on top of [`radioconfig::Config`]

use crate::cache::{MokaSharedCache, SharedCache, TrackCache, DEFAULT_LOCAL_MAX_SIZE, DEFAULT_SHARED_TTL};
use crate::spotify::{SpotifyApi, DEFAULT_API_BASE, DEFAULT_REQUEST_TIMEOUT_SECS};
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use radioconfig::Config;
use std::sync::Arc;
use std::time::Duration;

/// Environment variable checked when `catalog.access_token` is empty
pub const ACCESS_TOKEN_ENV: &str = "SPOTIFY_ACCESS_TOKEN";

/// Default Redis endpoint for the shared tier
pub const DEFAULT_SHARED_URL: &str = "redis://127.0.0.1/";

/// Implementation behind the shared cache tier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SharedBackend {
    /// In-process moka cache, lives as long as the process
    Memory,
    /// Redis server, shared between processes and runs
    Redis,
}

impl std::str::FromStr for SharedBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" | "moka" => Ok(SharedBackend::Memory),
            "redis" => Ok(SharedBackend::Redis),
            other => bail!("Unknown shared cache backend: {} (expected memory or redis)", other),
        }
    }
}

#[async_trait]
pub trait CatalogConfigExt {
    fn get_catalog_api_base(&self) -> String;

    /// `catalog.access_token`, falling back to `SPOTIFY_ACCESS_TOKEN`
    fn get_catalog_access_token(&self) -> Option<String>;

    fn get_catalog_timeout(&self) -> Duration;

    fn get_cache_local_max_size(&self) -> usize;

    fn get_cache_shared_enabled(&self) -> bool;

    fn get_cache_shared_ttl(&self) -> Duration;

    /// 0 means unbounded
    fn get_cache_shared_max_capacity(&self) -> u64;

    /// `cache.shared.backend`, `memory` unless configured
    fn get_cache_shared_backend(&self) -> Result<SharedBackend>;

    fn get_cache_shared_url(&self) -> String;

    fn build_catalog_client(&self) -> Result<SpotifyApi>;

    /// Local tier plus the configured shared tier, connecting to it if networked
    async fn build_track_cache(&self) -> Result<TrackCache>;
}

#[async_trait]
impl CatalogConfigExt for Config {
    fn get_catalog_api_base(&self) -> String {
        self.get_string_or(&["catalog", "api_base"], DEFAULT_API_BASE)
    }

    fn get_catalog_access_token(&self) -> Option<String> {
        self.get_string_opt(&["catalog", "access_token"])
            .filter(|t| !t.trim().is_empty())
            .or_else(|| std::env::var(ACCESS_TOKEN_ENV).ok())
            .filter(|t| !t.trim().is_empty())
    }

    fn get_catalog_timeout(&self) -> Duration {
        Duration::from_secs(self.get_u64_or(&["catalog", "timeout_secs"], DEFAULT_REQUEST_TIMEOUT_SECS))
    }

    fn get_cache_local_max_size(&self) -> usize {
        self.get_u64_or(&["cache", "local_max_size"], DEFAULT_LOCAL_MAX_SIZE as u64) as usize
    }

    fn get_cache_shared_enabled(&self) -> bool {
        self.get_bool_or(&["cache", "shared", "enabled"], false)
    }

    fn get_cache_shared_ttl(&self) -> Duration {
        self.get_duration_or(&["cache", "shared", "ttl"], DEFAULT_SHARED_TTL)
    }

    fn get_cache_shared_max_capacity(&self) -> u64 {
        self.get_u64_or(&["cache", "shared", "max_capacity"], 0)
    }

    fn get_cache_shared_backend(&self) -> Result<SharedBackend> {
        self.get_string_or(&["cache", "shared", "backend"], "memory").parse()
    }

    fn get_cache_shared_url(&self) -> String {
        self.get_string_or(&["cache", "shared", "url"], DEFAULT_SHARED_URL)
    }

    fn build_catalog_client(&self) -> Result<SpotifyApi> {
        let token = self.get_catalog_access_token().with_context(|| {
            format!(
                "No catalog access token: set catalog.access_token or {}",
                ACCESS_TOKEN_ENV
            )
        })?;
        SpotifyApi::builder()
            .api_base(self.get_catalog_api_base())
            .access_token(token)
            .timeout(self.get_catalog_timeout())
            .build()
            .context("Failed to build catalog client")
    }

    async fn build_track_cache(&self) -> Result<TrackCache> {
        let shared: Option<Arc<dyn SharedCache>> = if self.get_cache_shared_enabled() {
            let ttl = self.get_cache_shared_ttl();
            let backend = self.get_cache_shared_backend()?;
            tracing::info!(?backend, ttl_secs = ttl.as_secs(), "Shared track cache enabled");
            Some(match backend {
                SharedBackend::Memory => Arc::new(MokaSharedCache::new(
                    ttl,
                    self.get_cache_shared_max_capacity(),
                )),
                SharedBackend::Redis => connect_redis(&self.get_cache_shared_url(), ttl).await?,
            })
        } else {
            None
        };
        Ok(TrackCache::new(self.get_cache_local_max_size(), shared))
    }
}

#[cfg(feature = "redis")]
async fn connect_redis(url: &str, ttl: Duration) -> Result<Arc<dyn SharedCache>> {
    let cache = crate::cache::RedisSharedCache::connect(url, ttl)
        .await
        .with_context(|| format!("Failed to connect to shared cache at {}", url))?;
    Ok(Arc::new(cache))
}

#[cfg(not(feature = "redis"))]
async fn connect_redis(_url: &str, _ttl: Duration) -> Result<Arc<dyn SharedCache>> {
    bail!("cache.shared.backend is redis but this build lacks the `redis` feature")
}
