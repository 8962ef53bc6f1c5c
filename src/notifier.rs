use std::sync::{Arc, Mutex, PoisonError};

// ---------------------------------------------------------------------------
// Sink contract
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationPhase {
    Progress,
    Success,
    Failure,
}

impl NotificationPhase {
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Progress)
    }
}

/// Opaque handle returned by a sink for one shown notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ToastId(pub u64);

/// Where notifications are displayed.
pub trait NotificationSink: Send + Sync {
    fn show(&self, phase: NotificationPhase, message: &str) -> ToastId;
    fn dismiss(&self, id: ToastId);
}

// ---------------------------------------------------------------------------
// Notifier
// ---------------------------------------------------------------------------

/// Correlates one action invocation with its progress notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionHandle {
    toast: ToastId,
}

impl ActionHandle {
    pub fn toast_id(self) -> ToastId {
        self.toast
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Success(String),
    Failure(String),
}

/// Single-slot progress notifier for one UI context.
///
/// The slot holds the progress notification of the most recent `begin`. At
/// most one progress notification from this notifier is visible at a time, and
/// resolving an older action never dismisses a newer action's notification.
pub struct ActionNotifier {
    sink: Arc<dyn NotificationSink>,
    slot: Mutex<Option<ToastId>>,
}

impl ActionNotifier {
    pub fn new(sink: Arc<dyn NotificationSink>) -> Self {
        Self {
            sink,
            slot: Mutex::new(None),
        }
    }

    /// Replace whatever the slot shows with a new progress notification.
    pub fn begin(&self, message: &str) -> ActionHandle {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = slot.take() {
            self.sink.dismiss(previous);
        }
        let toast = self.sink.show(NotificationPhase::Progress, message);
        *slot = Some(toast);
        ActionHandle { toast }
    }

    /// Finish the action behind `handle` with a terminal notification.
    pub fn resolve(&self, handle: ActionHandle, outcome: Outcome) {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        if *slot == Some(handle.toast) {
            self.sink.dismiss(handle.toast);
            *slot = None;
        } else {
            tracing::debug!(
                "notifier: toast {:?} already superseded, leaving slot untouched",
                handle.toast
            );
        }
        match outcome {
            Outcome::Success(msg) => self.sink.show(NotificationPhase::Success, &msg),
            Outcome::Failure(msg) => self.sink.show(NotificationPhase::Failure, &msg),
        };
    }

    /// Progress notification currently held by the slot.
    pub fn current(&self) -> Option<ToastId> {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    #[derive(Default)]
    struct MemorySink {
        next: Mutex<u64>,
        visible: Mutex<BTreeMap<ToastId, (NotificationPhase, String)>>,
    }

    impl MemorySink {
        fn progress_count(&self) -> usize {
            self.visible
                .lock()
                .unwrap()
                .values()
                .filter(|(p, _)| *p == NotificationPhase::Progress)
                .count()
        }

        fn is_visible(&self, id: ToastId) -> bool {
            self.visible.lock().unwrap().contains_key(&id)
        }
    }

    impl NotificationSink for MemorySink {
        fn show(&self, phase: NotificationPhase, message: &str) -> ToastId {
            let mut next = self.next.lock().unwrap();
            *next += 1;
            let id = ToastId(*next);
            self.visible
                .lock()
                .unwrap()
                .insert(id, (phase, message.to_owned()));
            id
        }

        fn dismiss(&self, id: ToastId) {
            self.visible.lock().unwrap().remove(&id);
        }
    }

    fn notifier() -> (Arc<MemorySink>, ActionNotifier) {
        let sink = Arc::new(MemorySink::default());
        let notifier = ActionNotifier::new(Arc::clone(&sink) as Arc<dyn NotificationSink>);
        (sink, notifier)
    }

    #[test]
    fn second_begin_dismisses_first() {
        let (sink, notifier) = notifier();
        let first = notifier.begin("Restarting deployment…");
        let second = notifier.begin("Stopping deployment…");

        assert!(!sink.is_visible(first.toast_id()));
        assert!(sink.is_visible(second.toast_id()));
        assert_eq!(sink.progress_count(), 1);
        assert_eq!(notifier.current(), Some(second.toast_id()));
    }

    #[test]
    fn stale_resolve_leaves_newer_progress_visible() {
        let (sink, notifier) = notifier();
        let first = notifier.begin("Restarting deployment…");
        let second = notifier.begin("Redeploying…");

        notifier.resolve(first, Outcome::Success("Deployment restarted".to_owned()));

        assert!(sink.is_visible(second.toast_id()));
        assert_eq!(sink.progress_count(), 1);
        assert_eq!(notifier.current(), Some(second.toast_id()));
    }

    #[test]
    fn resolve_replaces_progress_with_terminal() {
        let (sink, notifier) = notifier();
        let handle = notifier.begin("Stopping deployment…");
        notifier.resolve(handle, Outcome::Failure("quota exceeded".to_owned()));

        assert_eq!(sink.progress_count(), 0);
        assert_eq!(notifier.current(), None);
        let visible = sink.visible.lock().unwrap();
        let (phase, msg) = visible.values().next().unwrap();
        assert_eq!(*phase, NotificationPhase::Failure);
        assert_eq!(msg, "quota exceeded");
    }
}
