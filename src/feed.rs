use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, Notify};

use crate::error::FeedError;
use crate::types::workout::LocationFix;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionStatus {
    Granted,
    Denied,
    #[default]
    Undetermined,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permissions {
    pub foreground: PermissionStatus,
    pub background: PermissionStatus,
}

impl Permissions {
    pub fn granted() -> Self {
        Self {
            foreground: PermissionStatus::Granted,
            background: PermissionStatus::Granted,
        }
    }
}

/// Creates a connected sender/stream pair for one tracking subscription.
pub fn fix_channel() -> (FixSender, FixStream) {
    let (tx, rx) = mpsc::unbounded_channel();
    let arrived = Arc::new(Notify::new());
    (
        FixSender {
            tx,
            arrived: arrived.clone(),
        },
        FixStream { rx, arrived },
    )
}

/// Feed side of a subscription. Every accepted fix also wakes the stream's arrival signal.
pub struct FixSender {
    tx: mpsc::UnboundedSender<LocationFix>,
    arrived: Arc<Notify>,
}

impl FixSender {
    /// Queues `fix` for the subscriber. Returns `false` once the stream is gone.
    pub fn send(&self, fix: LocationFix) -> bool {
        if self.tx.send(fix).is_err() {
            return false;
        }
        self.arrived.notify_one();
        true
    }
}

/// Fixes delivered after tracking started. A stopped stream cannot be resumed; a new
/// `start_tracking` hands out a new one.
///
/// Reading never waits: a consumer waits on [`FixStream::arrivals`] and then drains with
/// [`FixStream::try_next`], so a fix is only ever taken out of the queue by whoever holds the
/// stream. Fixes queued before the feed stopped stay readable after it stops.
pub struct FixStream {
    rx: mpsc::UnboundedReceiver<LocationFix>,
    arrived: Arc<Notify>,
}

impl FixStream {
    /// Signal that fires after a fix has been queued. Wakeups coalesce.
    pub fn arrivals(&self) -> Arc<Notify> {
        self.arrived.clone()
    }

    pub fn try_next(&mut self) -> Option<LocationFix> {
        self.rx.try_recv().ok()
    }

    /// Takes every fix currently queued.
    pub fn drain(&mut self) -> Vec<LocationFix> {
        std::iter::from_fn(|| self.try_next()).collect()
    }
}

/// Source of live positions (the platform location service in production).
#[async_trait]
pub trait LocationFeed: Send + Sync {
    /// Resolves once the feed is subscribed. Fails when foreground permission is not
    /// granted or an initial position cannot be obtained.
    async fn start_tracking(&self) -> Result<FixStream, FeedError>;

    /// Unsubscribes synchronously. Safe to call when not tracking.
    fn stop_tracking(&self);

    fn clear_history(&self);

    fn is_tracking(&self) -> bool;

    fn current_fix(&self) -> Option<LocationFix>;

    /// Every fix received since tracking started.
    fn history(&self) -> Vec<LocationFix>;

    fn permissions(&self) -> Permissions;
}

#[derive(Debug, Clone, Copy)]
pub struct PushFeedOptions {
    /// Answer given when an undetermined permission is requested.
    pub auto_grant: bool,
    pub require_initial_fix: bool,
}

impl Default for PushFeedOptions {
    fn default() -> Self {
        Self {
            auto_grant: true,
            require_initial_fix: false,
        }
    }
}

#[derive(Default)]
struct FeedInner {
    permissions: Permissions,
    subscriber: Option<FixSender>,
    current: Option<LocationFix>,
    history: Vec<LocationFix>,
}

/// Feed driven by fixes pushed in from outside (the HTTP fix endpoint, or tests).
pub struct PushFeed {
    options: PushFeedOptions,
    inner: Mutex<FeedInner>,
}

impl PushFeed {
    pub fn new(options: PushFeedOptions) -> Self {
        Self {
            options,
            inner: Mutex::new(FeedInner::default()),
        }
    }

    pub fn with_permissions(options: PushFeedOptions, permissions: Permissions) -> Self {
        let feed = Self::new(options);
        feed.set_permissions(permissions);
        feed
    }

    fn lock(&self) -> MutexGuard<'_, FeedInner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn set_permissions(&self, permissions: Permissions) {
        self.lock().permissions = permissions;
    }

    /// Records `fix` as the latest position and, while tracking, forwards it to the
    /// subscriber. Returns whether the feed is tracking.
    pub fn publish(&self, fix: LocationFix) -> bool {
        let mut inner = self.lock();
        inner.current = Some(fix.clone());

        let Some(tx) = inner.subscriber.as_ref() else {
            return false;
        };

        if !tx.send(fix.clone()) {
            tracing::debug!("Fix subscriber went away; tracking stopped");
            inner.subscriber = None;
            return false;
        }
        inner.history.push(fix);
        true
    }

    fn request(&self, status: PermissionStatus) -> PermissionStatus {
        match status {
            PermissionStatus::Undetermined if self.options.auto_grant => PermissionStatus::Granted,
            PermissionStatus::Undetermined => PermissionStatus::Denied,
            other => other,
        }
    }
}

#[async_trait]
impl LocationFeed for PushFeed {
    async fn start_tracking(&self) -> Result<FixStream, FeedError> {
        let mut inner = self.lock();

        let foreground = self.request(inner.permissions.foreground);
        inner.permissions.foreground = foreground;
        if foreground != PermissionStatus::Granted {
            tracing::error!("Foreground location permission not granted.");
            return Err(FeedError::PermissionDenied(
                "foreground location permission not granted".to_string(),
            ));
        }

        let background = self.request(inner.permissions.background);
        inner.permissions.background = background;
        if background != PermissionStatus::Granted {
            tracing::warn!("Background location permission not granted. Tracking might be limited.");
        }

        if self.options.require_initial_fix && inner.current.is_none() {
            return Err(FeedError::PositionUnavailable(
                "no position has been reported yet".to_string(),
            ));
        }

        let (tx, stream) = fix_channel();
        inner.subscriber = Some(tx);
        inner.history = inner.current.iter().cloned().collect();

        tracing::info!("Location tracking started");
        Ok(stream)
    }

    fn stop_tracking(&self) {
        if self.lock().subscriber.take().is_some() {
            tracing::info!("Location tracking stopped");
        }
    }

    fn clear_history(&self) {
        self.lock().history.clear();
    }

    fn is_tracking(&self) -> bool {
        self.lock().subscriber.is_some()
    }

    fn current_fix(&self) -> Option<LocationFix> {
        self.lock().current.clone()
    }

    fn history(&self) -> Vec<LocationFix> {
        self.lock().history.clone()
    }

    fn permissions(&self) -> Permissions {
        self.lock().permissions
    }
}
