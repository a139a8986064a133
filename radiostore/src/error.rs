//! Error types for observation storage

pub type Result<T> = std::result::Result<T, StorageError>;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// No observation was ever recorded for this station
    #[error("No observation for station {0}")]
    NotFound(String),

    /// Station ids name files and tables, so only `[A-Za-z0-9_-]` is accepted
    #[error("Invalid station id: {0:?}")]
    InvalidStationId(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[cfg(feature = "postgres")]
    #[error("PostgreSQL error: {0}")]
    Postgres(#[from] sqlx::Error),

    /// A blocking storage task panicked or was cancelled
    #[error("Storage task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("Unknown storage backend: {0}")]
    UnknownBackend(String),

    #[error("Unknown time range: {0} (expected lasthour, lastday or lastweek)")]
    UnknownRange(String),

    /// Backend-specific failure that fits no other variant
    #[error("Storage backend error: {0}")]
    Backend(String),
}

impl StorageError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::NotFound(_))
    }
}

/// Checks that a station id can be used as a file or table name.
///
/// Same rule the station registry enforces at load time.
pub fn validate_station_id(id: &str) -> Result<()> {
    if radioscraper::is_valid_station_id(id) {
        Ok(())
    } else {
        Err(StorageError::InvalidStationId(id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_station_ids() {
        assert!(validate_station_id("fip").is_ok());
        assert!(validate_station_id("radio-nova_2").is_ok());
        assert!(validate_station_id("").is_err());
        assert!(validate_station_id("../etc").is_err());
        assert!(validate_station_id("a b").is_err());
        assert!(validate_station_id("x\"; DROP TABLE").is_err());
        assert!(validate_station_id("radio.fr").is_err());
        assert!(validate_station_id(&"a".repeat(55)).is_ok());
        assert!(validate_station_id(&"a".repeat(56)).is_err());
    }
}
