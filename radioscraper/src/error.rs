//! Error types for station scraping

/// Result type alias for scraping operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while fetching or extracting now-playing data
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Connection or protocol failure
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Source answered with a non-2xx status
    #[error("{url} returned status {status}")]
    Status { url: String, status: u16 },

    /// Source did not answer in time
    #[error("Request to {0} timed out")]
    Timeout(String),

    /// The surrounding cycle was cancelled
    #[error("Fetch cancelled")]
    Cancelled,

    /// The body was fetched but no song could be extracted
    #[error("Extraction failed: {0}")]
    Extraction(#[from] ExtractionError),

    /// Invalid `regex` descriptor
    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),

    /// Invalid CSS selector descriptor
    #[error("Invalid selector: {0}")]
    InvalidSelector(String),

    /// No station with that id in the registry
    #[error("Station not found: {0}")]
    StationNotFound(String),

    /// Station registry could not be read or written
    #[error("Station registry error: {0}")]
    Registry(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Network-level failure: non-2xx, timeout or connection failure.
    ///
    /// Transient and extraction failures are handled the same way (the station
    /// is skipped for this cycle), the distinction only matters for logs.
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::Http(_) | Error::Status { .. } | Error::Timeout(_))
    }

    /// Create a registry error
    pub fn registry(msg: impl Into<String>) -> Self {
        Self::Registry(msg.into())
    }
}

/// Extraction failures, one variant per way a descriptor can miss
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExtractionError {
    #[error("selector '{0}' yielded no text")]
    EmptySelection(String),

    #[error("expected an object for key '{key}', found {found}")]
    ExpectedObject { key: String, found: &'static str },

    #[error("expected an array for index {index}, found {found}")]
    ExpectedArray { index: usize, found: &'static str },

    #[error("key '{0}' not found")]
    MissingKey(String),

    #[error("index {index} out of range (length {len})")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("value at path is not a string, found {0}")]
    NotAString(&'static str),

    #[error("no line matched the pattern")]
    NoMatch,

    #[error("document could not be decoded: {0}")]
    InvalidDocument(String),

    #[error("artist and title must both be non-empty")]
    EmptySong,
}
