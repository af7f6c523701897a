use std::time::{Duration, Instant};

use log::{debug, warn};
use tokio::sync::mpsc;

use crate::error::Result;
use crate::gitlab::types::MergeRequest;
use crate::gitlab::{ClientHandle, MergeRequestProvider};

/// How long a successful result stays fresh before a background refresh
/// becomes eligible.
pub const STALE_AFTER: Duration = Duration::from_secs(60);

/// Result of the open-merge-requests query, as the renderer sees it.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryState {
    /// Nothing fetched yet for the current project path
    Idle,
    /// First fetch for the current path is in flight
    Loading,
    /// The last fetch failed; causes are not distinguished
    Error,
    Ready {
        merge_requests: Vec<MergeRequest>,
        fetched_at: Instant,
    },
}

/// Completion of one fetch, tagged with the project path it was issued for.
struct FetchOutcome {
    project_path: String,
    result: Result<Vec<MergeRequest>>,
}

/// Drives the one query the dashboard needs and owns its result state.
///
/// Fetches run on spawned tasks and report back over a channel that the
/// event loop drains via [`QueryService::poll`]. At most one fetch is in
/// flight at a time; a completion whose project path no longer matches the
/// current one is discarded, so the latest path always wins. Errors are
/// sticky: nothing re-fetches until the user acts (manual refresh, saving
/// the configuration, or changing the project path).
pub struct QueryService {
    state: QueryState,
    project_path: Option<String>,
    in_flight: bool,
    tx: mpsc::UnboundedSender<FetchOutcome>,
    rx: mpsc::UnboundedReceiver<FetchOutcome>,
}

impl Default for QueryService {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryService {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            state: QueryState::Idle,
            project_path: None,
            in_flight: false,
            tx,
            rx,
        }
    }

    pub fn state(&self) -> &QueryState {
        &self.state
    }

    pub fn project_path(&self) -> Option<&str> {
        self.project_path.as_deref()
    }

    /// Whether a fetch is currently in flight (first load or background
    /// refresh).
    pub fn is_fetching(&self) -> bool {
        self.in_flight
    }

    /// Point the service at a different project path.
    ///
    /// Resets the result state; any in-flight fetch for the old path keeps
    /// running but its completion will be discarded on arrival.
    pub fn set_project_path(&mut self, project_path: Option<String>) {
        if self.project_path == project_path {
            return;
        }
        self.project_path = project_path;
        self.state = QueryState::Idle;
    }

    /// Start a fetch if the current result is missing or stale.
    ///
    /// Called from the event-loop tick. Does nothing while unconfigured,
    /// while a fetch is in flight, or after an error (errors only re-fetch
    /// through [`QueryService::refresh`]). Returns whether a fetch started.
    pub fn ensure_fresh(&mut self, handle: &ClientHandle) -> bool {
        let wanted = match &self.state {
            QueryState::Idle => true,
            QueryState::Ready { fetched_at, .. } => fetched_at.elapsed() >= STALE_AFTER,
            QueryState::Loading | QueryState::Error => false,
        };

        if !wanted {
            return false;
        }
        self.spawn_fetch(handle)
    }

    /// User-requested fetch: also valid from the error state.
    ///
    /// Returns whether a fetch started.
    pub fn refresh(&mut self, handle: &ClientHandle) -> bool {
        if matches!(self.state, QueryState::Loading) {
            return false;
        }
        self.spawn_fetch(handle)
    }

    fn spawn_fetch(&mut self, handle: &ClientHandle) -> bool {
        if self.in_flight {
            return false;
        }

        let Some(project_path) = self.project_path.clone() else {
            return false;
        };

        // Guarded by configuration presence; an uninitialized handle here
        // would be a caller bug, not something to crash the loop over.
        let client = match handle.get() {
            Ok(client) => client,
            Err(e) => {
                warn!("Refusing to fetch: {e}");
                return false;
            }
        };

        if !matches!(self.state, QueryState::Ready { .. }) {
            self.state = QueryState::Loading;
        }
        self.in_flight = true;

        let tx = self.tx.clone();
        let provider = MergeRequestProvider::new(client, project_path.clone());
        tokio::spawn(async move {
            let result = provider.fetch_open_merge_requests().await;
            // The receiver only drops when the whole app shuts down.
            let _ = tx.send(FetchOutcome {
                project_path,
                result,
            });
        });

        true
    }

    /// Drain completed fetches into the result state.
    pub fn poll(&mut self) {
        while let Ok(outcome) = self.rx.try_recv() {
            self.apply(outcome);
        }
    }

    fn apply(&mut self, outcome: FetchOutcome) {
        // Only one fetch is ever in flight, so whatever arrives is it.
        self.in_flight = false;

        if self.project_path.as_deref() != Some(outcome.project_path.as_str()) {
            debug!(
                "Discarding stale result for superseded project path '{}'",
                outcome.project_path
            );
            return;
        }

        match outcome.result {
            Ok(merge_requests) => {
                self.state = QueryState::Ready {
                    merge_requests,
                    fetched_at: Instant::now(),
                };
            }
            Err(e) => {
                warn!("Merge request query failed: {e}");
                self.state = QueryState::Error;
            }
        }
    }
}
