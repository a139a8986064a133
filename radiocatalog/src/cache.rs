//! Two-tier track id cache
//!
//! - **local**: bounded LRU in process memory, O(1) get/put, evicts the least
//!   recently used entry once the capacity is exceeded
//! - **shared**: optional, entries expire after a fixed time-to-live and are
//!   never evicted by size. Either in-process ([`MokaSharedCache`]) or, with
//!   the `redis` feature, a Redis server reachable by every run
//!   ([`RedisSharedCache`])
//!
//! Keys are the exact string `"artist - title"`; values are catalog track ids.

use async_trait::async_trait;
use lru::LruCache;
use moka::future::Cache as MokaCache;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Default local cache capacity
pub const DEFAULT_LOCAL_MAX_SIZE: usize = 10_000;

/// Default shared entry lifetime (756 hours, about a month)
pub const DEFAULT_SHARED_TTL: Duration = Duration::from_secs(756 * 3600);

/// Cache key for a song
pub fn cache_key(artist: &str, title: &str) -> String {
    format!("{} - {}", artist, title)
}

// ============================================================================
// Local LRU
// ============================================================================

/// Bounded in-process LRU. A capacity of 0 disables the tier.
#[derive(Debug)]
pub struct LocalCache {
    entries: Option<Mutex<LruCache<String, String>>>,
}

impl LocalCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: NonZeroUsize::new(capacity).map(|cap| Mutex::new(LruCache::new(cap))),
        }
    }

    fn with_entries<R>(&self, f: impl FnOnce(&mut LruCache<String, String>) -> R) -> Option<R> {
        let entries = self.entries.as_ref()?;
        let mut guard = entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        Some(f(&mut guard))
    }

    /// Looks up `key` and marks it most recently used
    pub fn get(&self, key: &str) -> Option<String> {
        self.with_entries(|lru| lru.get(key).cloned()).flatten()
    }

    pub fn put(&self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let evicted = self
            .with_entries(|lru| lru.push(key.clone(), value.into()))
            .flatten();
        if let Some((old, _)) = evicted {
            if old != key {
                tracing::trace!(key = %old, "Evicted from local track cache");
            }
        }
    }

    pub fn len(&self) -> usize {
        self.with_entries(|lru| lru.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.with_entries(|lru| lru.cap().get()).unwrap_or(0)
    }
}

// ============================================================================
// Shared tier
// ============================================================================

/// Cache tier shared between processes or runs, with time-based expiry
#[async_trait]
pub trait SharedCache: Send + Sync {
    async fn get(&self, key: &str) -> Option<String>;
    async fn put(&self, key: String, value: String);
}

/// Shared tier backed by moka, entries live for a fixed TTL
#[derive(Clone)]
pub struct MokaSharedCache {
    cache: MokaCache<String, String>,
}

impl MokaSharedCache {
    /// `max_capacity` of 0 means unbounded, so entries only leave by expiry
    pub fn new(ttl: Duration, max_capacity: u64) -> Self {
        let mut builder = MokaCache::<String, String>::builder().time_to_live(ttl);
        if max_capacity > 0 {
            builder = builder.max_capacity(max_capacity);
        }
        Self {
            cache: builder.build(),
        }
    }
}

#[async_trait]
impl SharedCache for MokaSharedCache {
    async fn get(&self, key: &str) -> Option<String> {
        self.cache.get(key).await
    }

    async fn put(&self, key: String, value: String) {
        self.cache.insert(key, value).await;
    }
}

/// Shared tier on a Redis server, entries written with `SET .. EX ttl`.
///
/// Redis failures never fail a lookup: they are logged and treated as a miss.
#[cfg(feature = "redis")]
#[derive(Clone)]
pub struct RedisSharedCache {
    conn: redis::aio::ConnectionManager,
    ttl: Duration,
    prefix: String,
}

#[cfg(feature = "redis")]
impl RedisSharedCache {
    /// Default key namespace
    pub const DEFAULT_PREFIX: &'static str = "radiosync:track:";

    /// Connects to `url` (e.g. `redis://127.0.0.1/`)
    pub async fn connect(url: &str, ttl: Duration) -> redis::RedisResult<Self> {
        let client = redis::Client::open(url)?;
        let conn = redis::aio::ConnectionManager::new(client).await?;
        tracing::info!(url = %url, ttl_secs = ttl.as_secs(), "Connected to shared Redis track cache");
        Ok(Self {
            conn,
            ttl,
            prefix: Self::DEFAULT_PREFIX.to_string(),
        })
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    fn key(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key)
    }
}

#[cfg(feature = "redis")]
#[async_trait]
impl SharedCache for RedisSharedCache {
    async fn get(&self, key: &str) -> Option<String> {
        use redis::AsyncCommands;

        let mut conn = self.conn.clone();
        match conn.get::<_, Option<String>>(self.key(key)).await {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Shared cache read failed");
                None
            }
        }
    }

    async fn put(&self, key: String, value: String) {
        use redis::AsyncCommands;

        let mut conn = self.conn.clone();
        let ttl = self.ttl.as_secs().max(1);
        if let Err(e) = conn.set_ex::<_, _, ()>(self.key(&key), value, ttl).await {
            tracing::warn!(key = %key, error = %e, "Shared cache write failed");
        }
    }
}

// ============================================================================
// Combined cache
// ============================================================================

/// Where a cached value was found
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheTier {
    Local,
    Shared,
}

/// Local LRU in front of an optional shared tier
pub struct TrackCache {
    local: LocalCache,
    shared: Option<Arc<dyn SharedCache>>,
}

impl std::fmt::Debug for TrackCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrackCache")
            .field("local", &self.local)
            .field("shared", &self.shared.is_some())
            .finish()
    }
}

impl TrackCache {
    pub fn new(local_capacity: usize, shared: Option<Arc<dyn SharedCache>>) -> Self {
        Self {
            local: LocalCache::new(local_capacity),
            shared,
        }
    }

    pub fn local(&self) -> &LocalCache {
        &self.local
    }

    pub fn has_shared(&self) -> bool {
        self.shared.is_some()
    }

    /// Local first, then shared; a shared hit is copied into the local tier
    pub async fn get(&self, key: &str) -> Option<(String, CacheTier)> {
        if let Some(id) = self.local.get(key) {
            return Some((id, CacheTier::Local));
        }
        let shared = self.shared.as_ref()?;
        let id = shared.get(key).await?;
        self.local.put(key, id.clone());
        Some((id, CacheTier::Shared))
    }

    /// Populates both tiers
    pub async fn put(&self, key: &str, track_id: &str) {
        self.local.put(key, track_id);
        if let Some(shared) = &self.shared {
            shared.put(key.to_string(), track_id.to_string()).await;
        }
    }
}
