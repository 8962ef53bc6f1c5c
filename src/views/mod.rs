pub mod deployments;
pub mod services;

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};

use crate::dispatch::{ActionDispatcher, ActionKind, DispatchError};
use crate::engine::{EngineHandle, action_for};
use crate::notifier::{ActionNotifier, NotificationSink};
use crate::store::{EntityListStore, ListFetcher, ListState, ListStatus, LoadingPolicy, Subscription};
use crate::theme::ResolvedTheme;
use crate::toast::ToastQueue;

/// Fallback theme when none is provided via props.
pub(crate) fn default_theme() -> ResolvedTheme {
    ResolvedTheme::default()
}

/// Input mode of a list view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum InputMode {
    Normal,
    /// Row action menu open; the index is the highlighted entry.
    Menu(usize),
    /// Waiting for y/n before dispatching on the given entity id.
    Confirm(ActionKind, String),
    Timestamps,
}

/// Non-UI half of a list view: the store, the view's notifier slot and
/// dispatcher, and change counters the render loop polls.
pub(crate) struct ListController<F: ListFetcher> {
    engine: EngineHandle,
    store: EntityListStore<F>,
    dispatcher: ActionDispatcher,
    version: Arc<AtomicU64>,
    reset: Arc<AtomicBool>,
    fetched_at: Arc<Mutex<Option<DateTime<Utc>>>>,
    _subscriptions: [Subscription; 2],
}

impl<F: ListFetcher> ListController<F> {
    pub(crate) fn new(
        engine: &EngineHandle,
        fetcher: F,
        policy: LoadingPolicy,
        toasts: &ToastQueue,
        actions: &[ActionKind],
    ) -> Self {
        let store = EntityListStore::new(fetcher, policy);
        let sink: Arc<dyn NotificationSink> = Arc::new(toasts.clone());
        let notifier = Arc::new(ActionNotifier::new(sink));
        let backend = engine.backend();
        let dispatcher = actions.iter().fold(
            ActionDispatcher::new(engine.runtime().clone(), notifier, Arc::new(store.clone())),
            |d, &kind| d.with_action(kind, action_for(&backend, kind)),
        );

        let version = Arc::new(AtomicU64::new(0));
        let reset = Arc::new(AtomicBool::new(false));
        let fetched_at = Arc::new(Mutex::new(None));

        let on_change = {
            let version = Arc::clone(&version);
            let fetched_at = Arc::clone(&fetched_at);
            store.subscribe(move |state: &ListState<F::Item>| {
                if state.status == ListStatus::Ready {
                    *fetched_at.lock().unwrap_or_else(PoisonError::into_inner) = Some(Utc::now());
                }
                version.fetch_add(1, Ordering::SeqCst);
            })
        };
        let on_reset = {
            let reset = Arc::clone(&reset);
            store.on_reset(move |_| reset.store(true, Ordering::SeqCst))
        };

        Self {
            engine: engine.clone(),
            store,
            dispatcher,
            version,
            reset,
            fetched_at,
            _subscriptions: [on_change, on_reset],
        }
    }

    pub(crate) fn load(&self, scope: F::Scope) {
        let fut = self.store.load(scope);
        self.engine.spawn(fut);
    }

    pub(crate) fn refresh(&self) {
        let fut = self.store.refresh();
        self.engine.spawn(fut);
    }

    pub(crate) fn state(&self) -> ListState<F::Item> {
        self.store.state()
    }

    pub(crate) fn dispatch(
        &self,
        kind: ActionKind,
        entity_id: &str,
        display_name: Option<&str>,
    ) -> Result<(), DispatchError> {
        // The task reports through the notifier; nothing waits on it here.
        self.dispatcher
            .dispatch_named(kind, entity_id, display_name)
            .map(|_| ())
    }

    /// Bumped on every store transition.
    pub(crate) fn version(&self) -> u64 {
        self.version.load(Ordering::SeqCst)
    }

    /// `true` once after the visible id-set changed.
    pub(crate) fn take_reset(&self) -> bool {
        self.reset.swap(false, Ordering::SeqCst)
    }

    pub(crate) fn fetched_at(&self) -> Option<DateTime<Utc>> {
        *self.fetched_at.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Keep `cursor` inside a list of `len` rows and `scroll` such that the
/// cursor is visible in a window of `visible` rows.
pub(crate) fn clamp_cursor(cursor: usize, scroll: usize, len: usize, visible: usize) -> (usize, usize) {
    let cursor = cursor.min(len.saturating_sub(1));
    let visible = visible.max(1);
    let scroll = if cursor < scroll {
        cursor
    } else if cursor >= scroll + visible {
        cursor + 1 - visible
    } else {
        scroll
    };
    (cursor, scroll)
}
