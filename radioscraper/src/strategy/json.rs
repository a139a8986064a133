//! Keyed-structured strategy: typed paths over a JSON document

use crate::error::ExtractionError;
use crate::json_path::{string_at, PathSegment};
use crate::models::Song;
use crate::strategy::NowPlaying;
use serde_json::Value;

#[derive(Debug, Clone)]
pub struct JsonScraper {
    url: String,
    artist_key: Vec<PathSegment>,
    title_key: Vec<PathSegment>,
}

impl JsonScraper {
    pub fn new(
        url: impl Into<String>,
        artist_key: Vec<PathSegment>,
        title_key: Vec<PathSegment>,
    ) -> Self {
        Self {
            url: url.into(),
            artist_key,
            title_key,
        }
    }
}

impl NowPlaying for JsonScraper {
    fn source_url(&self) -> &str {
        &self.url
    }

    fn extract(&self, body: &str) -> Result<Song, ExtractionError> {
        let document: Value = serde_json::from_str(body)
            .map_err(|e| ExtractionError::InvalidDocument(e.to_string()))?;
        let artist = string_at(&document, &self.artist_key)?;
        let title = string_at(&document, &self.title_key)?;
        Song::new(artist, title)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(segments: &[&str]) -> Vec<PathSegment> {
        segments.iter().map(|s| PathSegment::from(*s)).collect()
    }

    #[test]
    fn test_now_track_document() {
        let scraper = JsonScraper::new(
            "u",
            keys(&["now", "track", "artist"]),
            keys(&["now", "track", "title"]),
        );
        let body = r#"{"now":{"track":{"artist":"Muse","title":"Uprising"}}}"#;
        assert_eq!(
            scraper.extract(body).unwrap(),
            Song::new("Muse", "Uprising").unwrap()
        );
    }

    #[test]
    fn test_out_of_range_index() {
        let artist = vec!["tracks".into(), PathSegment::Index(3), "artist".into()];
        let title = vec!["tracks".into(), PathSegment::Index(0), "title".into()];
        let scraper = JsonScraper::new("u", artist, title);
        let body = r#"{"tracks":[{"artist":"Muse","title":"Uprising"}]}"#;
        assert_eq!(
            scraper.extract(body),
            Err(ExtractionError::IndexOutOfRange { index: 3, len: 1 })
        );
    }

    #[test]
    fn test_empty_leaf_is_invalid() {
        let scraper = JsonScraper::new("u", keys(&["a"]), keys(&["t"]));
        assert_eq!(
            scraper.extract(r#"{"a":"  ","t":"x"}"#),
            Err(ExtractionError::EmptySong)
        );
    }

    #[test]
    fn test_not_json() {
        let scraper = JsonScraper::new("u", keys(&["a"]), keys(&["t"]));
        assert!(matches!(
            scraper.extract("<html>"),
            Err(ExtractionError::InvalidDocument(_))
        ));
    }
}
