//! Storage settings on top of [`radioconfig::Config`]

use crate::{open_storage, Storage, StorageKind, TimeRange};
use anyhow::{Context, Result};
use async_trait::async_trait;
use radioconfig::Config;
use std::sync::Arc;

#[async_trait]
pub trait StorageConfigExt {
    /// `storage.type`, defaults to `file`
    fn get_storage_kind(&self) -> Result<StorageKind>;

    /// `storage.path`: relative paths are resolved against the config dir,
    /// URLs are returned as is
    fn get_storage_location(&self) -> String;

    /// `sync.range`, defaults to `lastday`
    fn get_sync_range(&self) -> Result<TimeRange>;

    /// Opens the configured backend
    async fn open_configured_storage(&self) -> Result<Arc<dyn Storage>>;
}

#[async_trait]
impl StorageConfigExt for Config {
    fn get_storage_kind(&self) -> Result<StorageKind> {
        let kind = self.get_string_or(&["storage", "type"], "file");
        kind.parse().context("Invalid storage.type")
    }

    fn get_storage_location(&self) -> String {
        let raw = self.get_string_or(&["storage", "path"], "data");
        if raw.contains("://") {
            raw
        } else {
            self.resolve_path(&raw).to_string_lossy().into_owned()
        }
    }

    fn get_sync_range(&self) -> Result<TimeRange> {
        let range = self.get_string_or(&["sync", "range"], "lastday");
        range.parse().context("Invalid sync.range")
    }

    async fn open_configured_storage(&self) -> Result<Arc<dyn Storage>> {
        let kind = self.get_storage_kind()?;
        let location = self.get_storage_location();
        open_storage(kind, &location)
            .await
            .with_context(|| format!("Failed to open {} storage at {}", kind, location))
    }
}
