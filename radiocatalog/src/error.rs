//! Error types for the catalog client

use thiserror::Error;

pub type Result<T> = std::result::Result<T, CatalogError>;

#[derive(Error, Debug)]
pub enum CatalogError {
    /// Transport failure (connection, timeout, TLS)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with an error status
    #[error("Catalog API error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// Missing, expired or insufficient access token
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Rate limit exceeded, retry later")]
    RateLimited,

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    /// More track ids than a single playlist write accepts
    #[error("Too many tracks in one request: {count} (max {max})")]
    BatchTooLarge { count: usize, max: usize },

    #[error("Catalog configuration error: {0}")]
    Configuration(String),
}

impl CatalogError {
    pub fn from_status_code(status: u16, message: impl Into<String>) -> Self {
        match status {
            401 | 403 => Self::Unauthorized(message.into()),
            429 => Self::RateLimited,
            _ => Self::Api {
                status,
                message: message.into(),
            },
        }
    }

    pub fn is_auth_error(&self) -> bool {
        matches!(self, CatalogError::Unauthorized(_))
    }
}
