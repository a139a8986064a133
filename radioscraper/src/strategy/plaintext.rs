//! Pattern-text strategy: a regex with `artist` and `title` groups, line by line

use crate::error::{Error, ExtractionError, Result};
use crate::models::Song;
use crate::strategy::NowPlaying;
use regex::Regex;

#[derive(Debug, Clone)]
pub struct PlaintextScraper {
    url: String,
    pattern: Regex,
    null_token: Regex,
}

impl PlaintextScraper {
    /// Compiles `pattern`, which must declare both named groups.
    pub fn new(url: impl Into<String>, pattern: &str) -> Result<Self> {
        let compiled =
            Regex::new(pattern).map_err(|e| Error::InvalidPattern(e.to_string()))?;

        for group in ["artist", "title"] {
            if !compiled.capture_names().flatten().any(|name| name == group) {
                return Err(Error::InvalidPattern(format!(
                    "missing named group '{}' in {}",
                    group, pattern
                )));
            }
        }

        let null_token =
            Regex::new(r"(?i)\bnull\b").map_err(|e| Error::InvalidPattern(e.to_string()))?;

        Ok(Self {
            url: url.into(),
            pattern: compiled,
            null_token,
        })
    }

    fn clean(&self, raw: &str) -> String {
        let without_nul = raw.replace('\0', "");
        self.null_token
            .replace_all(&without_nul, "")
            .trim()
            .to_string()
    }
}

impl NowPlaying for PlaintextScraper {
    fn source_url(&self) -> &str {
        &self.url
    }

    fn extract(&self, body: &str) -> std::result::Result<Song, ExtractionError> {
        for line in body.lines() {
            let Some(caps) = self.pattern.captures(line) else {
                continue;
            };
            let (Some(artist), Some(title)) = (caps.name("artist"), caps.name("title")) else {
                continue;
            };

            let artist = self.clean(artist.as_str());
            let title = self.clean(title.as_str());
            if artist.is_empty() || title.is_empty() {
                tracing::trace!(line = %line, "Rejected line with empty artist or title");
                continue;
            }
            return Song::new(artist, title);
        }
        Err(ExtractionError::NoMatch)
    }
}
