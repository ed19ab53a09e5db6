//! ==============================================================================
//! refresh.rs - refresh coordinator (poll loop + stale-while-revalidate state)
//! ==============================================================================
//!
//! purpose:
//!     owns the only background activity in the host: a fixed-interval timer
//!     that re-fetches the deployment sheet. it keeps the last good record set
//!     visible while a refresh runs and after a refresh fails.
//!
//! state model:
//!
//! ```text
//!     Loading ──ok──▶ Ready(snapshot) ──err──▶ Stale { last_good: Some, failure }
//!        │               ▲      ▲                        │
//!        └──err──▶ Stale { last_good: None, failure } ───┴──ok──┘
//!
//!     - a success always replaces the record set wholesale
//!     - a failure never touches the record set
//!     - "connected" is exactly Ready
//!     - a separate in-flight counter says a fetch is running
//! ```
//!
//! concurrency:
//!     state lives behind Arc<RwLock<>> like the rest of the host. writers are
//!     fetch completions, readers take cloned DashboardView snapshots. two
//!     overlapping refreshes are not cancelled; whichever completes last wins.
//!
//! relationships:
//!     - polls: source.rs (RecordSource)
//!     - read by: server.rs (every handler renders from a DashboardView)
//!
//! ==============================================================================

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

use crate::aggregate::summarize;
use crate::domain::{SensorRecord, SensorSummary};
use crate::source::RecordSource;

/// one successful fetch, never mutated after creation
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub records: Arc<Vec<SensorRecord>>,
    pub fetched_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchFailure {
    pub message: String,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub enum RefreshState {
    /// nothing fetched yet
    Loading,
    Ready(Snapshot),
    Stale {
        last_good: Option<Snapshot>,
        failure: FetchFailure,
    },
}

impl RefreshState {
    pub fn succeeded(records: Vec<SensorRecord>, at: DateTime<Utc>) -> Self {
        Self::Ready(Snapshot { records: Arc::new(records), fetched_at: at })
    }

    pub fn failed(self, failure: FetchFailure) -> Self {
        let last_good = match self {
            Self::Loading => None,
            Self::Ready(snapshot) => Some(snapshot),
            Self::Stale { last_good, .. } => last_good,
        };
        Self::Stale { last_good, failure }
    }

    fn snapshot(&self) -> Option<&Snapshot> {
        match self {
            Self::Loading => None,
            Self::Ready(snapshot) => Some(snapshot),
            Self::Stale { last_good, .. } => last_good.as_ref(),
        }
    }

    pub fn records(&self) -> &[SensorRecord] {
        self.snapshot().map(|s| s.records.as_slice()).unwrap_or(&[])
    }

    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Ready(_))
    }

    pub fn last_error(&self) -> Option<&FetchFailure> {
        match self {
            Self::Stale { failure, .. } => Some(failure),
            _ => None,
        }
    }

    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.snapshot().map(|s| s.fetched_at)
    }
}

/// what a view function gets: an immutable copy of the coordinator state
#[derive(Debug, Clone)]
pub struct DashboardView {
    pub state: RefreshState,
    /// a fetch is running (or nothing has ever been fetched)
    pub loading: bool,
    pub source: String,
}

impl DashboardView {
    pub fn records(&self) -> &[SensorRecord] {
        self.state.records()
    }

    /// recomputed on every call
    pub fn summary(&self) -> SensorSummary {
        summarize(self.records())
    }

    pub fn is_connected(&self) -> bool {
        self.state.is_connected()
    }

    pub fn last_error(&self) -> Option<&FetchFailure> {
        self.state.last_error()
    }

    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.state.last_updated()
    }
}

struct Shared {
    state: RefreshState,
    in_flight: usize,
}

pub struct RefreshCoordinator<S> {
    source: Arc<S>,
    shared: Arc<RwLock<Shared>>,
}

impl<S> Clone for RefreshCoordinator<S> {
    fn clone(&self) -> Self {
        Self { source: self.source.clone(), shared: self.shared.clone() }
    }
}

impl<S: RecordSource> RefreshCoordinator<S> {
    pub fn new(source: S) -> Self {
        Self {
            source: Arc::new(source),
            shared: Arc::new(RwLock::new(Shared { state: RefreshState::Loading, in_flight: 0 })),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub async fn view(&self) -> DashboardView {
        let shared = self.shared.read().await;
        Self::view_of(&shared, &self.source)
    }

    fn view_of(shared: &Shared, source: &S) -> DashboardView {
        DashboardView {
            state: shared.state.clone(),
            loading: shared.in_flight > 0 || matches!(shared.state, RefreshState::Loading),
            source: source.describe(),
        }
    }

    /// fetch now and return the state after this fetch lands
    ///
    /// the fetch runs on its own task so it finishes (and settles the
    /// in-flight count) even if the caller is dropped.
    pub async fn refresh(&self) -> DashboardView {
        let task = tokio::spawn(Self::run_once(self.source.clone(), self.shared.clone()));
        match task.await {
            Ok(view) => view,
            Err(e) => {
                error!("[REFRESH] refresh task failed: {}", e);
                self.view().await
            }
        }
    }

    async fn run_once(source: Arc<S>, shared: Arc<RwLock<Shared>>) -> DashboardView {
        shared.write().await.in_flight += 1;

        // a panicking fetch surfaces here as a JoinError and is settled like
        // any other failure, so the in-flight count always comes back down
        let fetch = tokio::spawn({
            let source = source.clone();
            async move { source.fetch().await }
        });
        let result = match fetch.await {
            Ok(result) => result.map_err(|e| e.to_string()),
            Err(e) => Err(format!("fetch task failed: {e}")),
        };
        let now = Utc::now();

        let mut guard = shared.write().await;
        guard.in_flight = guard.in_flight.saturating_sub(1);
        let previous = std::mem::replace(&mut guard.state, RefreshState::Loading);
        guard.state = match result {
            Ok(records) => {
                info!("[REFRESH] ✓ {} records from {}", records.len(), source.describe());
                RefreshState::succeeded(records, now)
            }
            Err(message) => {
                warn!(
                    "[REFRESH] ⚠ {} failed, keeping {} cached records: {}",
                    source.describe(),
                    previous.records().len(),
                    message
                );
                previous.failed(FetchFailure { message, at: now })
            }
        };
        Self::view_of(&guard, &source)
    }

    /// start the auto-refresh timer; the first tick fetches immediately
    pub fn spawn(&self, period: Duration) -> RefreshHandle {
        let coordinator = self.clone();
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                coordinator.refresh().await;
            }
        });
        info!("[REFRESH] auto-refresh every {}s", period.as_secs());
        RefreshHandle { task }
    }
}

/// owns the auto-refresh timer; dropping it stops the timer
pub struct RefreshHandle {
    task: JoinHandle<()>,
}

impl RefreshHandle {
    pub fn shutdown(self) {
        // Drop does the abort
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for RefreshHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SensorStatus;

    fn records(statuses: &[&str]) -> Vec<SensorRecord> {
        statuses
            .iter()
            .map(|s| SensorRecord { status: SensorStatus::parse(s), ..Default::default() })
            .collect()
    }

    fn failure(msg: &str) -> FetchFailure {
        FetchFailure { message: msg.to_string(), at: DateTime::UNIX_EPOCH }
    }

    #[test]
    fn loading_has_nothing() {
        let state = RefreshState::Loading;
        assert!(state.records().is_empty());
        assert!(!state.is_connected());
        assert!(state.last_error().is_none());
        assert!(state.last_updated().is_none());
    }

    #[test]
    fn failure_keeps_last_good_records() {
        let now = Utc::now();
        let state = RefreshState::succeeded(records(&["Live", "NA"]), now);
        let state = state.failed(failure("timeout"));

        assert_eq!(state.records().len(), 2);
        assert!(!state.is_connected());
        assert_eq!(state.last_error().map(|f| f.message.as_str()), Some("timeout"));
        assert_eq!(state.last_updated(), Some(now));

        let state = state.failed(failure("dns"));
        assert_eq!(state.records().len(), 2);
        assert_eq!(state.last_error().map(|f| f.message.as_str()), Some("dns"));
    }

    #[test]
    fn failure_before_first_success_is_empty_and_stale() {
        let state = RefreshState::Loading.failed(failure("offline"));
        assert!(state.records().is_empty());
        assert!(matches!(state, RefreshState::Stale { last_good: None, .. }));
    }
}
