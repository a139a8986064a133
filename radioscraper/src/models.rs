//! Station and song models
//!
//! Stations are read from the JSON station file. The extraction descriptor is
//! flattened into the station object and selected by its `type` field, so a
//! station always carries exactly the descriptor matching its type.

use crate::error::ExtractionError;
use crate::json_path::PathSegment;
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Station
// ============================================================================

/// Longest accepted station id.
///
/// Ids become `station_<id>` table names and PostgreSQL truncates
/// identifiers past 63 bytes.
pub const MAX_STATION_ID_LEN: usize = 55;

/// Ids name files and tables: 1 to [`MAX_STATION_ID_LEN`] chars of `[A-Za-z0-9_-]`
pub fn is_valid_station_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= MAX_STATION_ID_LEN
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// A configured now-playing source
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Station {
    /// Unique identifier, also used to name per-station storage
    pub id: String,
    /// Human-readable name
    pub name: String,
    /// URL of the now-playing document
    pub url: String,
    /// Extraction descriptor, tagged by `type`
    #[serde(flatten)]
    pub source: SourceDescriptor,
    /// Destination playlist in the catalog, created lazily
    #[serde(
        rename = "playlistId",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub playlist_id: Option<String>,
}

/// Kind of now-playing source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StationType {
    /// HTML page, CSS selectors
    TaggedMarkup,
    /// JSON document, key/index paths
    KeyedStructured,
    /// Plain text, regex with named groups
    PatternText,
}

impl fmt::Display for StationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StationType::TaggedMarkup => "html",
            StationType::KeyedStructured => "json",
            StationType::PatternText => "plaintext",
        };
        f.write_str(name)
    }
}

/// Extraction descriptor, one variant per [`StationType`]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum SourceDescriptor {
    #[serde(rename = "html", alias = "tagged-markup")]
    Html {
        #[serde(rename = "artistTag")]
        artist_tag: String,
        #[serde(rename = "titleTag")]
        title_tag: String,
    },
    #[serde(rename = "json", alias = "keyed-structured")]
    Json {
        #[serde(rename = "artistKey")]
        artist_key: Vec<PathSegment>,
        #[serde(rename = "titleKey")]
        title_key: Vec<PathSegment>,
    },
    #[serde(rename = "plaintext", alias = "pattern-text")]
    Plaintext { regex: String },
}

impl SourceDescriptor {
    pub fn station_type(&self) -> StationType {
        match self {
            SourceDescriptor::Html { .. } => StationType::TaggedMarkup,
            SourceDescriptor::Json { .. } => StationType::KeyedStructured,
            SourceDescriptor::Plaintext { .. } => StationType::PatternText,
        }
    }
}

impl Station {
    /// Station scraped with CSS selectors
    pub fn html(
        id: impl Into<String>,
        name: impl Into<String>,
        url: impl Into<String>,
        artist_tag: impl Into<String>,
        title_tag: impl Into<String>,
    ) -> Self {
        Self::with_source(
            id,
            name,
            url,
            SourceDescriptor::Html {
                artist_tag: artist_tag.into(),
                title_tag: title_tag.into(),
            },
        )
    }

    /// Station scraped with JSON paths
    pub fn json(
        id: impl Into<String>,
        name: impl Into<String>,
        url: impl Into<String>,
        artist_key: Vec<PathSegment>,
        title_key: Vec<PathSegment>,
    ) -> Self {
        Self::with_source(id, name, url, SourceDescriptor::Json { artist_key, title_key })
    }

    /// Station scraped with a regex over plain text
    pub fn plaintext(
        id: impl Into<String>,
        name: impl Into<String>,
        url: impl Into<String>,
        regex: impl Into<String>,
    ) -> Self {
        Self::with_source(id, name, url, SourceDescriptor::Plaintext { regex: regex.into() })
    }

    fn with_source(
        id: impl Into<String>,
        name: impl Into<String>,
        url: impl Into<String>,
        source: SourceDescriptor,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            url: url.into(),
            source,
            playlist_id: None,
        }
    }

    pub fn station_type(&self) -> StationType {
        self.source.station_type()
    }

    /// Destination playlist id, ignoring blank values
    pub fn destination_playlist(&self) -> Option<&str> {
        self.playlist_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }
}

// ============================================================================
// Song
// ============================================================================

/// A normalized (artist, title) pair
///
/// Both fields are trimmed and non-empty; [`Song::new`] is the only way to
/// build one from untrusted text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Song {
    pub artist: String,
    pub title: String,
}

impl Song {
    pub fn new(artist: impl AsRef<str>, title: impl AsRef<str>) -> Result<Self, ExtractionError> {
        let artist = artist.as_ref().trim();
        let title = title.as_ref().trim();
        if artist.is_empty() || title.is_empty() {
            return Err(ExtractionError::EmptySong);
        }
        Ok(Self {
            artist: artist.to_string(),
            title: title.to_string(),
        })
    }
}

impl fmt::Display for Song {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.artist, self.title)
    }
}

/// A song observed on a station during one fetch cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StationSong {
    pub station_id: String,
    pub station_name: String,
    pub song: Song,
}
