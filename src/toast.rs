use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use crate::notifier::{NotificationPhase, NotificationSink, ToastId};

/// One notification as displayed by the UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub id: ToastId,
    pub phase: NotificationPhase,
    pub message: String,
    pub shown_at: Instant,
}

#[derive(Default)]
struct QueueInner {
    next_id: u64,
    toasts: Vec<Toast>,
    /// Bumped on every change so views can cheaply detect updates.
    version: u64,
}

/// The dashboard's notification sink.
///
/// Progress toasts stay until dismissed; success and failure toasts expire
/// after `ttl`. Cheaply cloneable.
#[derive(Clone)]
pub struct ToastQueue {
    inner: Arc<Mutex<QueueInner>>,
    ttl: Duration,
}

impl ToastQueue {
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: Arc::new(Mutex::new(QueueInner::default())),
            ttl,
        }
    }

    fn lock(&self) -> MutexGuard<'_, QueueInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Toasts still visible at `now`, oldest first.
    pub fn visible_at(&self, now: Instant) -> Vec<Toast> {
        self.lock()
            .toasts
            .iter()
            .filter(|t| !self.expired(t, now))
            .cloned()
            .collect()
    }

    pub fn visible(&self) -> Vec<Toast> {
        self.visible_at(Instant::now())
    }

    /// Drop expired toasts. Returns `true` if anything was removed.
    pub fn prune(&self) -> bool {
        let now = Instant::now();
        let mut inner = self.lock();
        let before = inner.toasts.len();
        inner.toasts.retain(|t| !self.expired(t, now));
        let changed = inner.toasts.len() != before;
        if changed {
            inner.version += 1;
        }
        changed
    }

    /// User dismissal of the newest visible toast.
    pub fn dismiss_latest(&self) -> Option<ToastId> {
        self.dismiss_latest_at(Instant::now())
    }

    /// Dismiss the newest toast still visible at `now`. Expired toasts that
    /// have not been pruned yet are skipped.
    pub fn dismiss_latest_at(&self, now: Instant) -> Option<ToastId> {
        let mut inner = self.lock();
        let idx = inner.toasts.iter().rposition(|t| !self.expired(t, now))?;
        let toast = inner.toasts.remove(idx);
        inner.version += 1;
        Some(toast.id)
    }

    pub fn version(&self) -> u64 {
        self.lock().version
    }

    fn expired(&self, toast: &Toast, now: Instant) -> bool {
        toast.phase.is_terminal() && now.saturating_duration_since(toast.shown_at) >= self.ttl
    }
}

impl NotificationSink for ToastQueue {
    fn show(&self, phase: NotificationPhase, message: &str) -> ToastId {
        let mut inner = self.lock();
        inner.next_id += 1;
        let id = ToastId(inner.next_id);
        inner.toasts.push(Toast {
            id,
            phase,
            message: message.to_owned(),
            shown_at: Instant::now(),
        });
        inner.version += 1;
        tracing::debug!("toast {id:?} shown ({phase:?}): {message}");
        id
    }

    fn dismiss(&self, id: ToastId) {
        let mut inner = self.lock();
        let before = inner.toasts.len();
        inner.toasts.retain(|t| t.id != id);
        if inner.toasts.len() != before {
            inner.version += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_toasts_expire_progress_does_not() {
        let queue = ToastQueue::new(Duration::from_secs(4));
        queue.show(NotificationPhase::Progress, "Stopping deployment…");
        queue.show(NotificationPhase::Success, "Deployment stopped");

        let later = Instant::now() + Duration::from_secs(5);
        let visible = queue.visible_at(later);
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].phase, NotificationPhase::Progress);
    }

    #[test]
    fn dismiss_removes_only_that_toast() {
        let queue = ToastQueue::new(Duration::from_secs(4));
        let a = queue.show(NotificationPhase::Progress, "a");
        let b = queue.show(NotificationPhase::Failure, "b");
        queue.dismiss(a);
        let ids: Vec<_> = queue.visible().iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![b]);
    }

    #[test]
    fn dismiss_latest_pops_newest() {
        let queue = ToastQueue::new(Duration::from_secs(4));
        queue.show(NotificationPhase::Success, "a");
        let b = queue.show(NotificationPhase::Success, "b");
        assert_eq!(queue.dismiss_latest(), Some(b));
        assert_eq!(queue.visible().len(), 1);
    }

    #[test]
    fn dismiss_latest_skips_expired_toasts() {
        let queue = ToastQueue::new(Duration::from_secs(4));
        let progress = queue.show(NotificationPhase::Progress, "Redeploying…");
        queue.show(NotificationPhase::Success, "Deployment stopped");

        let later = Instant::now() + Duration::from_secs(5);
        assert_eq!(queue.dismiss_latest_at(later), Some(progress));
        assert!(queue.visible_at(later).is_empty());
        assert_eq!(queue.dismiss_latest_at(later), None);
    }

    #[test]
    fn version_tracks_changes() {
        let queue = ToastQueue::new(Duration::from_secs(4));
        let v0 = queue.version();
        let id = queue.show(NotificationPhase::Progress, "x");
        assert!(queue.version() > v0);
        let v1 = queue.version();
        queue.dismiss(ToastId(id.0 + 100));
        assert_eq!(queue.version(), v1);
    }
}
