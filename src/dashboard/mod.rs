//! Live dashboard state
//!
//! [`DashboardFeed`] keeps an up-to-date [`DashboardSnapshot`] by re-fetching
//! aggregate statistics and recent incidents whenever the push channel
//! reports an incident change.
//!
//! ## Flow
//! - channel message with `incident_id` → [`RefreshBatcher`] (debounce)
//! - batched [`RefreshRequest`] → stats + recent incidents fetched together
//! - result published through a `watch` channel

pub mod batcher;
pub mod filter;

use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::api::{ApiClient, IncidentQuery};
use crate::channel::{Subscription, UpdateChannel, UpdateMessage};
use crate::types::{DashboardStats, Incident};

pub use batcher::{RefreshBatcher, RefreshRequest};
pub use filter::{IncidentView, ViewCounts};

/// Tuning for [`DashboardFeed`]
#[derive(Debug, Clone)]
pub struct FeedOptions {
    /// How many recent incidents to fetch
    pub recent_limit: u32,
    /// Debounce window for incident notifications
    pub batch_window: Duration,
    /// Ids buffered before a forced refresh
    pub max_batch: usize,
}

impl Default for FeedOptions {
    fn default() -> Self {
        Self {
            recent_limit: 20,
            batch_window: Duration::from_millis(250),
            max_batch: 100,
        }
    }
}

/// Latest dashboard data
#[derive(Debug, Clone, Default)]
pub struct DashboardSnapshot {
    pub stats: Option<DashboardStats>,
    pub incidents: Vec<Incident>,
    /// Last fetch failure; previous data is kept
    pub error: Option<String>,
    /// Time of the last successful refresh
    pub refreshed_at: Option<DateTime<Utc>>,
    /// Number of refresh attempts, successful or not
    pub refreshes: u64,
    /// Incidents that triggered the last refresh
    pub last_trigger: Vec<i64>,
}

impl DashboardSnapshot {
    pub fn is_loaded(&self) -> bool {
        self.refreshed_at.is_some()
    }

    pub fn view_counts(&self) -> ViewCounts {
        ViewCounts::tally(&self.incidents)
    }
}

/// Channel-driven dashboard refresher
pub struct DashboardFeed {
    snapshot: watch::Receiver<DashboardSnapshot>,
    requests: mpsc::Sender<RefreshRequest>,
    subscription: Option<Subscription>,
    tasks: Vec<JoinHandle<()>>,
}

impl DashboardFeed {
    /// Subscribe to `channel` and start refreshing
    ///
    /// An initial refresh runs immediately. Must be called within a Tokio
    /// runtime.
    pub fn start(api: ApiClient, channel: &UpdateChannel, options: FeedOptions) -> Self {
        let (snapshot_tx, snapshot_rx) = watch::channel(DashboardSnapshot::default());
        let (request_tx, request_rx) = mpsc::channel::<RefreshRequest>(1);
        let (ids_tx, ids_rx) = mpsc::channel::<i64>(1024);

        let subscription = channel.subscribe(move |msg: &UpdateMessage| {
            if let Some(id) = msg.incident_id() {
                log::debug!("[Dashboard] Incident {} changed", id);
                if ids_tx.try_send(id).is_err() {
                    log::warn!("[Dashboard] Notification queue full, dropping incident {}", id);
                }
            }
        });

        let batcher =
            RefreshBatcher::with_config(request_tx.clone(), options.batch_window, options.max_batch);
        let batcher_task = tokio::spawn(batcher.run(ids_rx));
        let refresh_task = tokio::spawn(run_refresher(
            api,
            options.recent_limit,
            snapshot_tx,
            request_rx,
        ));

        Self {
            snapshot: snapshot_rx,
            requests: request_tx,
            subscription: Some(subscription),
            tasks: vec![batcher_task, refresh_task],
        }
    }

    /// Current snapshot
    pub fn snapshot(&self) -> DashboardSnapshot {
        self.snapshot.borrow().clone()
    }

    /// Receiver notified on every refresh
    pub fn watch(&self) -> watch::Receiver<DashboardSnapshot> {
        self.snapshot.clone()
    }

    /// Queue a refresh regardless of channel activity
    pub async fn refresh_now(&self) {
        if self.requests.send(RefreshRequest::manual()).await.is_err() {
            log::warn!("[Dashboard] Refresher stopped, ignoring refresh request");
        }
    }

    /// Unsubscribe from the channel and stop background work
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.unsubscribe();
        }
        for task in self.tasks.drain(..) {
            task.abort();
        }
    }
}

impl Drop for DashboardFeed {
    fn drop(&mut self) {
        self.shutdown();
    }
}

async fn run_refresher(
    api: ApiClient,
    recent_limit: u32,
    snapshot: watch::Sender<DashboardSnapshot>,
    mut requests: mpsc::Receiver<RefreshRequest>,
) {
    refresh(&api, recent_limit, &snapshot, RefreshRequest::manual()).await;

    while let Some(request) = requests.recv().await {
        refresh(&api, recent_limit, &snapshot, request).await;
    }
}

/// Fetch stats and recent incidents together and publish the result
async fn refresh(
    api: &ApiClient,
    recent_limit: u32,
    snapshot: &watch::Sender<DashboardSnapshot>,
    request: RefreshRequest,
) {
    let query = IncidentQuery::new().limit(recent_limit);
    let (stats, incidents) = tokio::join!(api.dashboard_stats(), api.list_incidents(&query));

    snapshot.send_modify(|snap| {
        snap.refreshes += 1;
        snap.last_trigger = request.incident_ids;

        match (stats, incidents) {
            (Ok(stats), Ok(incidents)) => {
                log::debug!(
                    "[Dashboard] Refreshed: {} total, {} active",
                    stats.total_incidents,
                    stats.active_incidents
                );
                snap.stats = Some(stats);
                snap.incidents = incidents;
                snap.error = None;
                snap.refreshed_at = Some(Utc::now());
            }
            (Err(e), _) | (_, Err(e)) => {
                log::warn!("[Dashboard] Refresh failed: {}", e);
                snap.error = Some(e.to_string());
            }
        }
    });
}
