//! Scraper strategies
//!
//! Each station type has one strategy. A strategy only knows how to turn a
//! fetched body into a [`Song`]; fetching goes through the shared
//! [`HttpFetcher`] so every strategy gets the same timeout and status handling.

mod html;
mod json;
mod plaintext;

pub use html::HtmlScraper;
pub use json::JsonScraper;
pub use plaintext::PlaintextScraper;

use crate::client::HttpFetcher;
use crate::error::{ExtractionError, Result};
use crate::models::{Song, SourceDescriptor, Station};
use async_trait::async_trait;

/// Now-playing capability shared by all strategies
#[async_trait]
pub trait NowPlaying: Send + Sync {
    /// URL of the document to fetch
    fn source_url(&self) -> &str;

    /// Extracts the current song from a fetched body
    fn extract(&self, body: &str) -> std::result::Result<Song, ExtractionError>;

    /// Fetches the source and extracts the current song
    async fn now_playing(&self, http: &HttpFetcher) -> Result<Song> {
        let body = http.get_text(self.source_url()).await?;
        Ok(self.extract(&body)?)
    }
}

/// Strategy selected from a station's descriptor
#[derive(Debug, Clone)]
pub enum Scraper {
    Html(HtmlScraper),
    Json(JsonScraper),
    Plaintext(PlaintextScraper),
}

impl Scraper {
    /// Builds the strategy matching the station's type.
    ///
    /// Invalid selectors and patterns are rejected here, before any fetch.
    pub fn for_station(station: &Station) -> Result<Self> {
        let url = station.url.clone();
        Ok(match &station.source {
            SourceDescriptor::Html {
                artist_tag,
                title_tag,
            } => Scraper::Html(HtmlScraper::new(url, artist_tag, title_tag)?),
            SourceDescriptor::Json {
                artist_key,
                title_key,
            } => Scraper::Json(JsonScraper::new(url, artist_key.clone(), title_key.clone())),
            SourceDescriptor::Plaintext { regex } => {
                Scraper::Plaintext(PlaintextScraper::new(url, regex)?)
            }
        })
    }

    fn inner(&self) -> &dyn NowPlaying {
        match self {
            Scraper::Html(s) => s,
            Scraper::Json(s) => s,
            Scraper::Plaintext(s) => s,
        }
    }
}

impl NowPlaying for Scraper {
    fn source_url(&self) -> &str {
        self.inner().source_url()
    }

    fn extract(&self, body: &str) -> std::result::Result<Song, ExtractionError> {
        self.inner().extract(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_dispatch_by_type() {
        let station = Station::plaintext("p", "P", "http://x", r"(?P<artist>.+)/(?P<title>.+)");
        let scraper = Scraper::for_station(&station).unwrap();
        assert!(matches!(scraper, Scraper::Plaintext(_)));
        assert_eq!(scraper.source_url(), "http://x");
        assert_eq!(
            scraper.extract("Muse/Uprising").unwrap(),
            Song::new("Muse", "Uprising").unwrap()
        );
    }

    #[test]
    fn test_construction_errors() {
        let station = Station::plaintext("p", "P", "http://x", "(");
        assert!(matches!(
            Scraper::for_station(&station),
            Err(Error::InvalidPattern(_))
        ));
    }
}
