//! Polling notification feed.
//!
//! The poller fetches the latest broadcast notifications on a fixed
//! interval and syncs them into a local [`NotificationFeed`]. A failed
//! or empty fetch never disturbs what the banner already shows; the
//! feed only ever moves forward on a successful non-empty result.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use disha_core::error::Result;
use disha_core::feed::{Notification, NotificationFeed};

/// How often the portal is asked for fresh notifications.
pub const POLL_INTERVAL: Duration = Duration::from_secs(30);

/// Seam between the poller and the wire. Implemented over
/// `GET /notifications` by `PortalApi`, and by fakes in tests.
#[async_trait]
pub trait NotificationSource: Send + Sync {
    /// The latest broadcast notifications, newest first.
    async fn latest(&self) -> Result<Vec<Notification>>;
}

/// Stops the polling loop. No fetch is issued after `stop()`. Must be
/// invoked when the owning view is torn down.
#[derive(Debug, Clone)]
pub struct StopHandle {
    token: CancellationToken,
}

impl StopHandle {
    pub fn stop(&self) {
        self.token.cancel();
    }
}

/// Owns the notification feed of one banner and keeps it synced.
///
/// Rotation (`advance`) and dismissal are local controls over the
/// fetched list; both publish a fresh snapshot to subscribers.
pub struct NotificationPoller {
    source: Arc<dyn NotificationSource>,
    feed: Arc<Mutex<NotificationFeed>>,
    snapshots: watch::Sender<NotificationFeed>,
    interval: Duration,
}

impl NotificationPoller {
    pub fn new(source: Arc<dyn NotificationSource>) -> Self {
        Self::with_interval(source, POLL_INTERVAL)
    }

    /// Overrides the poll interval; tests use short intervals.
    pub fn with_interval(source: Arc<dyn NotificationSource>, interval: Duration) -> Self {
        let (snapshots, _) = watch::channel(NotificationFeed::new());
        Self {
            source,
            feed: Arc::new(Mutex::new(NotificationFeed::new())),
            snapshots,
            interval,
        }
    }

    /// Subscribes to feed snapshots. The receiver always holds the
    /// most recent state; intermediate snapshots may be skipped.
    pub fn subscribe(&self) -> watch::Receiver<NotificationFeed> {
        self.snapshots.subscribe()
    }

    /// Snapshot of the feed as it stands right now.
    pub fn feed(&self) -> NotificationFeed {
        lock(&self.feed).clone()
    }

    /// Spawns the polling loop: one fetch immediately, then one per
    /// interval until the returned handle is stopped.
    pub fn start(&self) -> StopHandle {
        let token = CancellationToken::new();
        tokio::spawn(run_poller(
            self.source.clone(),
            self.feed.clone(),
            self.snapshots.clone(),
            token.clone(),
            self.interval,
        ));
        StopHandle { token }
    }

    /// Rotates the banner to the next notification.
    pub fn advance(&self) {
        let snapshot = {
            let mut feed = lock(&self.feed);
            feed.advance();
            feed.clone()
        };
        let _ = self.snapshots.send(snapshot);
    }

    /// Hides the banner until the next successful non-empty fetch.
    pub fn dismiss(&self) {
        let snapshot = {
            let mut feed = lock(&self.feed);
            feed.dismiss();
            feed.clone()
        };
        let _ = self.snapshots.send(snapshot);
    }
}

fn lock(feed: &Arc<Mutex<NotificationFeed>>) -> MutexGuard<'_, NotificationFeed> {
    feed.lock().expect("notification feed mutex poisoned")
}

async fn run_poller(
    source: Arc<dyn NotificationSource>,
    feed: Arc<Mutex<NotificationFeed>>,
    snapshots: watch::Sender<NotificationFeed>,
    token: CancellationToken,
    interval: Duration,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = token.cancelled() => return,
            _ = ticker.tick() => {}
        }

        let fetched = tokio::select! {
            biased;
            _ = token.cancelled() => return,
            fetched = source.latest() => fetched,
        };

        match fetched {
            Ok(items) if !items.is_empty() => {
                let snapshot = {
                    let mut feed = lock(&feed);
                    feed.replace(items);
                    feed.clone()
                };
                let _ = snapshots.send(snapshot);
            }
            Ok(_) => {
                tracing::debug!("[NotificationPoller] fetch returned no notifications");
            }
            Err(err) => {
                // Transport failures are a silent no-op; the prior
                // state stays on screen.
                tracing::warn!("[NotificationPoller] fetch failed: {err}");
            }
        }
    }
}
