//! Error types for synchronization and scheduling

use radiocatalog::CatalogError;
use radiostore::StorageError;

pub type Result<T> = std::result::Result<T, SyncError>;

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// Missing playlist id, unknown station, bad range token or misuse
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Station registry error: {0}")]
    Registry(#[from] radioscraper::Error),

    #[error("Operation cancelled")]
    Cancelled,
}

impl SyncError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
