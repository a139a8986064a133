//! Catalog client contract

use crate::error::Result;
use crate::models::{CatalogUser, PlaylistRef, TrackRef};
use async_trait::async_trait;

/// Maximum number of track ids accepted by one playlist write
pub const MAX_TRACKS_PER_REQUEST: usize = 100;

/// Operations the synchronizer needs from a music catalog.
///
/// Authentication is the implementor's concern; callers get a ready handle.
#[async_trait]
pub trait CatalogClient: Send + Sync {
    /// The authenticated user, also used as a session liveness check
    async fn current_user(&self) -> Result<CatalogUser>;

    /// Free-text track search, best match first
    async fn search_tracks(&self, query: &str) -> Result<Vec<TrackRef>>;

    async fn create_playlist(
        &self,
        user_id: &str,
        name: &str,
        description: &str,
        public: bool,
    ) -> Result<PlaylistRef>;

    /// Replaces the whole track list (an empty slice clears it).
    /// At most [`MAX_TRACKS_PER_REQUEST`] ids.
    async fn replace_playlist_tracks(&self, playlist_id: &str, track_ids: &[String]) -> Result<()>;

    /// Appends tracks in order. At most [`MAX_TRACKS_PER_REQUEST`] ids.
    async fn add_tracks_to_playlist(&self, playlist_id: &str, track_ids: &[String]) -> Result<()>;
}
