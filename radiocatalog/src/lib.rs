//! # radiocatalog - catalog access for playlist synchronization
//!
//! - [`CatalogClient`]: the catalog operations the synchronizer uses, with a
//!   Spotify Web API implementation in [`SpotifyApi`]
//! - [`TrackCache`]: bounded local LRU plus optional TTL-based shared tier
//! - [`TrackResolver`]: `(artist, title)` to track id, cache first

pub mod cache;
pub mod client;
pub mod config_ext;
pub mod error;
pub mod models;
pub mod resolver;
pub mod spotify;

#[cfg(feature = "redis")]
pub use cache::RedisSharedCache;
pub use cache::{cache_key, CacheTier, LocalCache, MokaSharedCache, SharedCache, TrackCache};
pub use client::{CatalogClient, MAX_TRACKS_PER_REQUEST};
pub use config_ext::{CatalogConfigExt, SharedBackend};
pub use error::{CatalogError, Result};
pub use models::{ArtistRef, CatalogUser, PlaylistRef, TrackRef};
pub use resolver::TrackResolver;
pub use spotify::{SpotifyApi, SpotifyApiBuilder};
