use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use chrono::{DateTime, Utc};
use coin_board_feed::{minute_of_day, synthetic_coins, Clock, FetchOrchestrator, FetchOutcome};
use log::{error, info, warn};
use shared::{filter_coins, sort_coins, Coin, CoinsResponse, DataStatus, SortKey, SortOrder};
use tokio::sync::Mutex;

pub const NOTICE_REFRESHED: &str = "Data refreshed";
pub const NOTICE_SAMPLE_DATA: &str = "Using sample data";
pub const NOTICE_TIMEOUT: &str = "Data fetch took too long. Please try again.";
pub const NOTICE_BUSY: &str = "Refresh already in progress";
pub const NOTICE_UPDATE_ERROR: &str = "Update error";

/// More consecutive failures than this raises `has_error`.
const ERROR_THRESHOLD: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DashboardSettings {
    /// Soft deadline for one refresh.
    pub deadline: Duration,
    pub refresh_interval: Duration,
    /// Used instead of `refresh_interval` while sample data is shown.
    pub fallback_refresh_interval: Duration,
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self {
            deadline: Duration::from_secs(20),
            refresh_interval: Duration::from_secs(60),
            fallback_refresh_interval: Duration::from_secs(120),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshResult {
    Completed(DataStatus),
    TimedOut,
    /// The pass ended without an outcome (it panicked or was cancelled).
    Failed,
    /// Another refresh was already running; nothing was done.
    Busy,
}

#[derive(Debug, Clone)]
struct Snapshot {
    coins: Vec<Coin>,
    status: DataStatus,
    last_updated: Option<DateTime<Utc>>,
    source: Option<String>,
    error_count: u32,
    consecutive_errors: u32,
    notice: Option<String>,
}

impl Default for Snapshot {
    fn default() -> Self {
        Self {
            coins: Vec::new(),
            status: DataStatus::Empty,
            last_updated: None,
            source: None,
            error_count: 0,
            consecutive_errors: 0,
            notice: None,
        }
    }
}

// Clears the in-flight flag however the refresh ends
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InFlight(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// The one place refreshes happen. Holds the orchestrator and the snapshot
/// served to readers.
pub struct Dashboard {
    orchestrator: Arc<Mutex<FetchOrchestrator>>,
    clock: Arc<dyn Clock>,
    in_flight: AtomicBool,
    snapshot: RwLock<Snapshot>,
    settings: DashboardSettings,
}

impl Dashboard {
    pub fn new(orchestrator: FetchOrchestrator, settings: DashboardSettings) -> Self {
        Self {
            clock: orchestrator.clock(),
            orchestrator: Arc::new(Mutex::new(orchestrator)),
            in_flight: AtomicBool::new(false),
            snapshot: RwLock::new(Snapshot::default()),
            settings,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub fn status(&self) -> DataStatus {
        self.read().status
    }

    /// Wait before the next automatic refresh, longer while sample data is shown.
    pub fn next_refresh_in(&self) -> Duration {
        if self.status().is_fallback() {
            self.settings.fallback_refresh_interval
        } else {
            self.settings.refresh_interval
        }
    }

    /// Runs one refresh unless another is in flight.
    ///
    /// The pass runs on its own task. Past the deadline this call stops
    /// waiting and keeps the previous data; the pass still finishes in the
    /// background so source health and the cache see its progress, but its
    /// outcome never reaches the snapshot. Passes queue on the orchestrator
    /// lock, so an abandoned pass always completes before any later one.
    pub async fn refresh(&self, force: bool) -> RefreshResult {
        let _guard = match InFlight::acquire(&self.in_flight) {
            Some(guard) => guard,
            None => {
                warn!("Fetch already in progress, skipping");
                return RefreshResult::Busy;
            }
        };

        let orchestrator = Arc::clone(&self.orchestrator);
        let pass = tokio::spawn(async move { orchestrator.lock().await.fetch_coins(force).await });

        match tokio::time::timeout(self.settings.deadline, pass).await {
            Ok(Ok(outcome)) => RefreshResult::Completed(self.apply(outcome)),
            Ok(Err(e)) => {
                error!("Refresh task ended without data: {}", e);
                self.mark_failed(NOTICE_UPDATE_ERROR);
                RefreshResult::Failed
            }
            Err(_) => {
                warn!(
                    "Refresh exceeded {}s deadline, keeping previous data",
                    self.settings.deadline.as_secs()
                );
                self.mark_failed(NOTICE_TIMEOUT);
                RefreshResult::TimedOut
            }
        }
    }

    fn apply(&self, outcome: FetchOutcome) -> DataStatus {
        let mut snapshot = self.write();

        let status = if outcome.is_fallback() {
            DataStatus::Fallback
        } else {
            DataStatus::Live
        };
        if !outcome.from_cache {
            info!("Loaded {} coins ({:?})", outcome.coins.len(), status);
        }

        snapshot.source = outcome.source_id().map(str::to_string);
        snapshot.coins = outcome.coins;
        snapshot.status = status;
        snapshot.last_updated = Some(outcome.fetched_at);
        snapshot.consecutive_errors = 0;
        snapshot.notice = Some(
            if status.is_fallback() {
                NOTICE_SAMPLE_DATA
            } else {
                NOTICE_REFRESHED
            }
            .to_string(),
        );

        status
    }

    fn mark_failed(&self, notice: &str) {
        let mut snapshot = self.write();
        snapshot.error_count += 1;
        snapshot.consecutive_errors += 1;
        snapshot.notice = Some(notice.to_string());

        if snapshot.coins.is_empty() {
            let now = self.clock.now();
            snapshot.coins = synthetic_coins(minute_of_day(now));
            snapshot.status = DataStatus::Fallback;
            snapshot.last_updated = Some(now);
            snapshot.source = None;
        } else if snapshot.status == DataStatus::Live {
            snapshot.status = DataStatus::Stale;
        }
    }

    /// Current data, filtered by `query` and ordered by `key`/`order`.
    pub fn response(&self, query: &str, key: SortKey, order: SortOrder) -> CoinsResponse {
        let snapshot = self.read();

        let mut data = filter_coins(&snapshot.coins, query);
        sort_coins(&mut data, key, order);

        CoinsResponse {
            data,
            last_updated: snapshot.last_updated,
            status: snapshot.status,
            is_fallback: snapshot.status.is_fallback(),
            is_loading: self.is_loading(),
            has_error: snapshot.consecutive_errors > ERROR_THRESHOLD,
            error_count: snapshot.error_count,
            consecutive_errors: snapshot.consecutive_errors,
            source: snapshot.source.clone(),
            notice: snapshot.notice.clone(),
        }
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Snapshot> {
        self.snapshot.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Snapshot> {
        self.snapshot.write().unwrap_or_else(PoisonError::into_inner)
    }
}
