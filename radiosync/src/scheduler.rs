//! Daemon loop
//!
//! Up to three periodic triggers: fetch-and-store, playlist sync and a
//! catalog keep-alive ping. A trigger with no interval never fires. Each
//! trigger runs at most one invocation at a time; a tick that arrives while
//! the previous one is still running is skipped.
//!
//! The scheduler goes `Idle -> Running -> Stopped` exactly once. Stopping
//! cancels in-flight cycles through the shared token and waits for them.

use crate::context::AppContext;
use crate::error::{Result, SyncError};
use crate::operations::{fetch_and_store, sync_playlists};
use radiostore::TimeRange;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerConfig {
    pub fetch_interval: Option<Duration>,
    pub sync_interval: Option<Duration>,
    pub keepalive_interval: Option<Duration>,
    pub keepalive_timeout: Duration,
    pub range: TimeRange,
    /// Sync only this station instead of every station with history
    pub pinned_station: Option<String>,
    /// Fetch and log, but do not persist
    pub no_store: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Running,
    Stopped,
}

#[derive(Debug, Clone, Copy)]
enum Trigger {
    Fetch,
    Sync,
    KeepAlive,
}

impl Trigger {
    fn name(self) -> &'static str {
        match self {
            Trigger::Fetch => "fetch",
            Trigger::Sync => "sync",
            Trigger::KeepAlive => "keepalive",
        }
    }
}

/// Clears the busy flag when a cycle ends, even if it panicked
struct BusyGuard(Arc<AtomicBool>);

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct Scheduler {
    ctx: Arc<AppContext>,
    config: SchedulerConfig,
    state: Mutex<SchedulerState>,
}

fn ticker(period: Option<Duration>) -> Option<Interval> {
    period.map(|period| {
        let mut interval = interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        interval
    })
}

async fn next_tick(interval: &mut Option<Interval>) {
    match interval {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}

impl Scheduler {
    /// The sync trigger is disabled when the context has no synchronizer,
    /// keep-alive when it has no catalog.
    pub fn new(ctx: Arc<AppContext>, mut config: SchedulerConfig) -> Self {
        if ctx.synchronizer.is_none() {
            config.sync_interval = None;
        }
        if ctx.catalog.is_none() {
            config.keepalive_interval = None;
        }
        Self {
            ctx,
            config,
            state: Mutex::new(SchedulerState::Idle),
        }
    }

    pub fn state(&self) -> SchedulerState {
        *self.state.lock().unwrap_or_else(|p| p.into_inner())
    }

    fn transition(&self, from: SchedulerState, to: SchedulerState) -> Result<()> {
        let mut state = self.state.lock().unwrap_or_else(|p| p.into_inner());
        if *state != from {
            return Err(SyncError::config(format!(
                "scheduler is {:?}, cannot move to {:?}",
                *state, to
            )));
        }
        *state = to;
        Ok(())
    }

    /// Runs until `stop` is cancelled, then waits for in-flight cycles.
    ///
    /// Fails if the scheduler was already started.
    pub async fn run(&self, stop: CancellationToken) -> Result<()> {
        self.transition(SchedulerState::Idle, SchedulerState::Running)?;
        info!(
            fetch = ?self.config.fetch_interval,
            sync = ?self.config.sync_interval,
            keepalive = ?self.config.keepalive_interval,
            range = %self.config.range,
            "Scheduler started"
        );

        let tracker = TaskTracker::new();
        let busy: [Arc<AtomicBool>; 3] = Default::default();

        let mut fetch = ticker(self.config.fetch_interval);
        let mut sync = ticker(self.config.sync_interval);
        let mut keepalive = ticker(self.config.keepalive_interval);

        loop {
            tokio::select! {
                biased;
                _ = stop.cancelled() => break,
                _ = next_tick(&mut fetch) => {
                    self.launch(&tracker, &busy[0], Trigger::Fetch, self.fetch_cycle(stop.clone()));
                }
                _ = next_tick(&mut sync) => {
                    self.launch(&tracker, &busy[1], Trigger::Sync, self.sync_cycle(stop.clone()));
                }
                _ = next_tick(&mut keepalive) => {
                    self.launch(&tracker, &busy[2], Trigger::KeepAlive, self.keepalive_cycle());
                }
            }
        }

        info!(in_flight = tracker.len(), "Stop requested, waiting for running cycles");
        tracker.close();
        tracker.wait().await;

        self.transition(SchedulerState::Running, SchedulerState::Stopped)?;
        info!("Scheduler stopped");
        Ok(())
    }

    fn launch<F>(&self, tracker: &TaskTracker, busy: &Arc<AtomicBool>, trigger: Trigger, cycle: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        if busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!(trigger = trigger.name(), "Previous run still in progress, skipping tick");
            return;
        }
        let guard = BusyGuard(busy.clone());
        debug!(trigger = trigger.name(), "Tick");
        tracker.spawn(async move {
            let _guard = guard;
            cycle.await;
        });
    }

    fn fetch_cycle(&self, cancel: CancellationToken) -> impl Future<Output = ()> + Send + 'static {
        let ctx = self.ctx.clone();
        let dry_run = self.config.no_store;
        async move {
            if let Err(e) = fetch_and_store(&ctx, None, dry_run, &cancel).await {
                warn!(error = %e, "Fetch cycle failed");
            }
        }
    }

    fn sync_cycle(&self, cancel: CancellationToken) -> impl Future<Output = ()> + Send + 'static {
        let ctx = self.ctx.clone();
        let range = self.config.range;
        let pinned = self.config.pinned_station.clone();
        async move {
            if let Err(e) = sync_playlists(&ctx, range, pinned.as_deref(), &cancel).await {
                warn!(error = %e, "Sync cycle failed");
            }
        }
    }

    fn keepalive_cycle(&self) -> impl Future<Output = ()> + Send + 'static {
        let catalog = self.ctx.catalog.clone();
        let timeout = self.config.keepalive_timeout;
        async move {
            let Some(catalog) = catalog else {
                return;
            };
            match tokio::time::timeout(timeout, catalog.current_user()).await {
                Ok(Ok(user)) => debug!(user = %user.id, "Catalog session alive"),
                Ok(Err(e)) => warn!(error = %e, "Catalog keep-alive failed"),
                Err(_) => warn!(timeout_secs = timeout.as_secs(), "Catalog keep-alive timed out"),
            }
        }
    }
}
