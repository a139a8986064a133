//! Spotify Web API client
//!
//! Only the endpoints used for playlist synchronization are covered. The
//! access token is obtained elsewhere and passed in as is.
//!
//! ```no_run
//! use radiocatalog::{CatalogClient, SpotifyApi};
//!
//! # async fn example() -> radiocatalog::Result<()> {
//! let api = SpotifyApi::builder().access_token("BQD...").build()?;
//! let me = api.current_user().await?;
//! let hits = api.search_tracks("Muse Uprising").await?;
//! # Ok(())
//! # }
//! ```

use crate::client::{CatalogClient, MAX_TRACKS_PER_REQUEST};
use crate::error::{CatalogError, Result};
use crate::models::{
    track_uri, CatalogUser, NewPlaylist, PlaylistRef, SearchResponse, TrackRef, TrackUris,
};
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};

/// Default Spotify API base URL
pub const DEFAULT_API_BASE: &str = "https://api.spotify.com/v1";

/// Default timeout for catalog requests (15 seconds)
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 15;

#[derive(Debug, Clone)]
pub struct SpotifyApi {
    client: Client,
    api_base: String,
    access_token: String,
    timeout: Duration,
}

impl SpotifyApi {
    pub fn builder() -> SpotifyApiBuilder {
        SpotifyApiBuilder::default()
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    fn request(&self, method: Method, endpoint: &str) -> RequestBuilder {
        let url = format!("{}{}", self.api_base, endpoint);
        debug!("{} {}", method, url);
        self.client
            .request(method, url)
            .bearer_auth(&self.access_token)
            .timeout(self.timeout)
    }

    async fn handle_response<T: DeserializeOwned>(&self, response: Response) -> Result<T> {
        let text = Self::check_status(response).await?;
        serde_json::from_str(&text).map_err(|e| {
            warn!("Failed to parse catalog response: {}", e);
            CatalogError::Json(e)
        })
    }

    async fn check_status(response: Response) -> Result<String> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<serde_json::Value>(&body)
                .ok()
                .and_then(|v| v.pointer("/error/message").and_then(|m| m.as_str()).map(String::from))
                .unwrap_or(body);
            warn!(status = status.as_u16(), "Catalog API error: {}", message);
            return Err(CatalogError::from_status_code(status.as_u16(), message));
        }
        Ok(response.text().await?)
    }

    fn check_batch(track_ids: &[String]) -> Result<TrackUris> {
        if track_ids.len() > MAX_TRACKS_PER_REQUEST {
            return Err(CatalogError::BatchTooLarge {
                count: track_ids.len(),
                max: MAX_TRACKS_PER_REQUEST,
            });
        }
        Ok(TrackUris {
            uris: track_ids.iter().map(|id| track_uri(id)).collect(),
        })
    }
}

#[async_trait]
impl CatalogClient for SpotifyApi {
    async fn current_user(&self) -> Result<CatalogUser> {
        let response = self.request(Method::GET, "/me").send().await?;
        self.handle_response(response).await
    }

    async fn search_tracks(&self, query: &str) -> Result<Vec<TrackRef>> {
        let response = self
            .request(Method::GET, "/search")
            .query(&[("q", query), ("type", "track"), ("limit", "10")])
            .send()
            .await?;
        let result: SearchResponse = self.handle_response(response).await?;
        Ok(result.tracks.map(|page| page.items).unwrap_or_default())
    }

    async fn create_playlist(
        &self,
        user_id: &str,
        name: &str,
        description: &str,
        public: bool,
    ) -> Result<PlaylistRef> {
        let response = self
            .request(Method::POST, &format!("/users/{}/playlists", user_id))
            .json(&NewPlaylist {
                name,
                description,
                public,
            })
            .send()
            .await?;
        self.handle_response(response).await
    }

    async fn replace_playlist_tracks(&self, playlist_id: &str, track_ids: &[String]) -> Result<()> {
        let body = Self::check_batch(track_ids)?;
        let response = self
            .request(Method::PUT, &format!("/playlists/{}/tracks", playlist_id))
            .json(&body)
            .send()
            .await?;
        Self::check_status(response).await.map(|_| ())
    }

    async fn add_tracks_to_playlist(&self, playlist_id: &str, track_ids: &[String]) -> Result<()> {
        if track_ids.is_empty() {
            return Ok(());
        }
        let body = Self::check_batch(track_ids)?;
        let response = self
            .request(Method::POST, &format!("/playlists/{}/tracks", playlist_id))
            .json(&body)
            .send()
            .await?;
        Self::check_status(response).await.map(|_| ())
    }
}

/// Builder for [`SpotifyApi`]
#[derive(Debug, Default)]
pub struct SpotifyApiBuilder {
    api_base: Option<String>,
    access_token: Option<String>,
    timeout: Option<Duration>,
    client: Option<Client>,
}

impl SpotifyApiBuilder {
    /// API base URL, mostly useful to point at a mock server
    pub fn api_base(mut self, url: impl Into<String>) -> Self {
        self.api_base = Some(url.into());
        self
    }

    pub fn access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn client(mut self, client: Client) -> Self {
        self.client = Some(client);
        self
    }

    pub fn build(self) -> Result<SpotifyApi> {
        let access_token = self
            .access_token
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| CatalogError::Configuration("missing access token".into()))?;

        let client = match self.client {
            Some(client) => client,
            None => Client::builder().build()?,
        };

        Ok(SpotifyApi {
            client,
            api_base: self
                .api_base
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string())
                .trim_end_matches('/')
                .to_string(),
            access_token,
            timeout: self
                .timeout
                .unwrap_or(Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS)),
        })
    }
}
