//! # radiosync - playlist synchronization and daemon scheduling
//!
//! Ties the pipeline together: stations from `radioscraper`, history from
//! `radiostore`, track resolution and playlists from `radiocatalog`.
//!
//! - [`PlaylistSynchronizer`] replaces each station's playlist with the
//!   tracks it played during a time window.
//! - [`operations`] holds the one-shot commands (fetch, store, sync).
//! - [`Scheduler`] runs them periodically until stopped.
//!
//! ```no_run
//! use radioconfig::Config;
//! use radiosync::{AppContext, Scheduler, SyncConfigExt};
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = Config::load(None)?;
//! let ctx = Arc::new(AppContext::from_config(&config, true).await?);
//! let scheduler = Scheduler::new(ctx, config.get_scheduler_config()?);
//!
//! let stop = CancellationToken::new();
//! scheduler.run(stop).await?;
//! # Ok(())
//! # }
//! ```

pub mod config_ext;
pub mod context;
pub mod error;
pub mod operations;
pub mod scheduler;
pub mod synchronizer;

pub use config_ext::SyncConfigExt;
pub use context::AppContext;
pub use error::{Result, SyncError};
pub use operations::{fetch_and_store, fetch_now_playing, store_songs, sync_playlists, StoreSummary};
pub use scheduler::{Scheduler, SchedulerConfig, SchedulerState};
pub use synchronizer::{PlaylistSynchronizer, SyncOptions, SyncReport, SyncSummary};
