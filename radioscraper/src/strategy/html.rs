//! Tagged-markup strategy: CSS selectors over an HTML page

use crate::error::{Error, ExtractionError, Result};
use crate::models::Song;
use crate::strategy::NowPlaying;
use scraper::{Html, Selector};

/// Reads artist and title from the first element matching each selector
#[derive(Debug, Clone)]
pub struct HtmlScraper {
    url: String,
    artist_tag: String,
    title_tag: String,
}

impl HtmlScraper {
    /// Fails with [`Error::InvalidSelector`] if either selector does not parse.
    pub fn new(
        url: impl Into<String>,
        artist_tag: impl Into<String>,
        title_tag: impl Into<String>,
    ) -> Result<Self> {
        let artist_tag = artist_tag.into();
        let title_tag = title_tag.into();
        parse_selector(&artist_tag)?;
        parse_selector(&title_tag)?;
        Ok(Self {
            url: url.into(),
            artist_tag,
            title_tag,
        })
    }
}

fn parse_selector(tag: &str) -> Result<Selector> {
    Selector::parse(tag).map_err(|e| Error::InvalidSelector(format!("'{}': {}", tag, e)))
}

fn first_text(document: &Html, tag: &str) -> std::result::Result<String, ExtractionError> {
    let selector =
        Selector::parse(tag).map_err(|_| ExtractionError::EmptySelection(tag.to_string()))?;
    let text = document
        .select(&selector)
        .next()
        .map(|element| element.text().collect::<String>())
        .unwrap_or_default();

    let text = text.trim();
    if text.is_empty() {
        return Err(ExtractionError::EmptySelection(tag.to_string()));
    }
    Ok(text.to_string())
}

impl NowPlaying for HtmlScraper {
    fn source_url(&self) -> &str {
        &self.url
    }

    fn extract(&self, body: &str) -> std::result::Result<Song, ExtractionError> {
        let document = Html::parse_document(body);
        let artist = first_text(&document, &self.artist_tag)?;
        let title = first_text(&document, &self.title_tag)?;
        Song::new(artist, title)
    }
}
