//! # radioscraper - now-playing extraction for radio stations
//!
//! Reads the song currently on air from heterogeneous station sources:
//!
//! - **html**: CSS selectors over a web page
//! - **json**: typed key/index paths over a JSON document
//! - **plaintext**: a regex with `artist` and `title` named groups
//!
//! Stations come from a JSON [`StationRegistry`]. The [`FetchCoordinator`]
//! fetches many stations concurrently with a bounded number of requests in
//! flight and returns whatever succeeded.
//!
//! ```no_run
//! use radioscraper::{FetchCoordinator, HttpFetcher, JsonStationRegistry};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> radioscraper::Result<()> {
//! let registry = JsonStationRegistry::load("stations.json")?;
//! let coordinator = FetchCoordinator::new(HttpFetcher::new()?, 8);
//! let songs = coordinator
//!     .fetch_from_registry(&registry, None, &CancellationToken::new())
//!     .await?;
//! for s in songs {
//!     println!("{}: {}", s.station_name, s.song);
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config_ext;
pub mod coordinator;
pub mod error;
pub mod json_path;
pub mod models;
pub mod registry;
pub mod strategy;

pub use client::{FetcherBuilder, HttpFetcher};
pub use config_ext::ScraperConfigExt;
pub use coordinator::FetchCoordinator;
pub use error::{Error, ExtractionError, Result};
pub use json_path::PathSegment;
pub use models::{
    is_valid_station_id, Song, SourceDescriptor, Station, StationSong, StationType,
    MAX_STATION_ID_LEN,
};
pub use registry::{JsonStationRegistry, StationRegistry};
pub use strategy::{HtmlScraper, JsonScraper, NowPlaying, PlaintextScraper, Scraper};
