//! radio2spotify - mirror what radio stations play into Spotify playlists
//!
//! ```text
//! radio2spotify fetch [--station ID]
//! radio2spotify store [--station ID] [--dry-run]
//! radio2spotify playlist [--station ID] [--range lasthour|lastday|lastweek]
//! radio2spotify daemon [--station ID] [--no-store] [--no-playlist] ...
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use radioconfig::{parse_duration, Config};
use radiostore::{StorageConfigExt, TimeRange};
use radiosync::{
    fetch_and_store, fetch_now_playing, sync_playlists, AppContext, Scheduler, SyncConfigExt,
};
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "radio2spotify")]
#[command(about = "Mirror radio now-playing history into Spotify playlists")]
#[command(version)]
struct Cli {
    /// Configuration directory (holds config.yaml)
    #[arg(long, global = true, env = "RADIOSYNC_CONFIG")]
    config_dir: Option<PathBuf>,

    /// Log level, ignored when RUST_LOG is set
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print what each station is playing now
    Fetch {
        #[arg(long)]
        station: Option<String>,
    },

    /// Fetch and record new songs
    Store {
        #[arg(long)]
        station: Option<String>,

        /// Fetch and log, do not write
        #[arg(long)]
        dry_run: bool,
    },

    /// Rebuild playlists from recorded history
    Playlist {
        #[arg(long)]
        station: Option<String>,

        /// lasthour, lastday or lastweek (default: sync.range)
        #[arg(long, value_parser = parse_range)]
        range: Option<TimeRange>,
    },

    /// Run fetch and sync periodically until interrupted
    Daemon {
        /// Only synchronize this station's playlist
        #[arg(long)]
        station: Option<String>,

        #[arg(long, value_parser = parse_range)]
        range: Option<TimeRange>,

        /// Fetch without recording
        #[arg(long)]
        no_store: bool,

        /// Never touch the catalog
        #[arg(long)]
        no_playlist: bool,

        /// e.g. 30s, 5m (0 disables)
        #[arg(long, value_parser = parse_interval)]
        fetch_interval: Option<Duration>,

        #[arg(long, value_parser = parse_interval)]
        playlist_interval: Option<Duration>,

        #[arg(long, value_parser = parse_interval)]
        keepalive_interval: Option<Duration>,
    },
}

fn parse_range(s: &str) -> std::result::Result<TimeRange, String> {
    s.parse().map_err(|e: radiostore::StorageError| e.to_string())
}

fn parse_interval(s: &str) -> std::result::Result<Duration, String> {
    parse_duration(s).map_err(|e| e.to_string())
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load(cli.config_dir.as_deref()).context("Failed to load configuration")?;
    let level = cli.log_level.clone().unwrap_or_else(|| config.get_log_level());
    init_logging(&level);

    let stop = CancellationToken::new();
    tokio::spawn({
        let stop = stop.clone();
        async move {
            shutdown_signal().await;
            stop.cancel();
        }
    });

    match cli.command {
        Command::Fetch { station } => {
            let ctx = AppContext::from_config(&config, false).await?;
            let songs = fetch_now_playing(&ctx, station.as_deref(), &stop).await?;
            for entry in songs {
                println!("{}: {}", entry.station_name, entry.song);
            }
        }

        Command::Store { station, dry_run } => {
            let ctx = AppContext::from_config(&config, false).await?;
            fetch_and_store(&ctx, station.as_deref(), dry_run, &stop).await?;
        }

        Command::Playlist { station, range } => {
            let range = match range {
                Some(range) => range,
                None => config.get_sync_range()?,
            };
            let ctx = AppContext::from_config(&config, true).await?;
            let summary = sync_playlists(&ctx, range, station.as_deref(), &stop).await?;
            if summary.failed > 0 {
                warn!(failed = summary.failed, "Some playlists were not synchronized");
            }
        }

        Command::Daemon {
            station,
            range,
            no_store,
            no_playlist,
            fetch_interval,
            playlist_interval,
            keepalive_interval,
        } => {
            let mut scheduler_config = config.get_scheduler_config()?;
            let enabled = |d: Duration| (!d.is_zero()).then_some(d);
            if let Some(d) = fetch_interval {
                scheduler_config.fetch_interval = enabled(d);
            }
            if let Some(d) = playlist_interval {
                scheduler_config.sync_interval = enabled(d);
            }
            if let Some(d) = keepalive_interval {
                scheduler_config.keepalive_interval = enabled(d);
            }
            if let Some(range) = range {
                scheduler_config.range = range;
            }
            scheduler_config.pinned_station = station;
            scheduler_config.no_store |= no_store;

            let no_playlist = no_playlist || config.get_no_playlist();
            let ctx = AppContext::from_config(&config, !no_playlist).await?;

            info!(
                no_store = scheduler_config.no_store,
                no_playlist, "Starting daemon"
            );
            let scheduler = Scheduler::new(Arc::new(ctx), scheduler_config);
            scheduler.run(stop).await?;
        }
    }

    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Cannot listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received terminate signal, shutting down"),
    }
}
