use std::collections::HashSet;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Collaborator contracts
// ---------------------------------------------------------------------------

/// A row of a list. Identity (and equality for refresh diffing) is the id.
pub trait Entity: Clone + Send + Sync + 'static {
    fn id(&self) -> &str;
}

/// A list load failed. Stale items stay visible.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct FetchError {
    pub message: String,
}

impl FetchError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Remote list-fetch capability for one kind of entity.
#[async_trait]
pub trait ListFetcher: Send + Sync + 'static {
    type Scope: Clone + Send + Sync + 'static;
    type Item: Entity;

    async fn fetch(&self, scope: &Self::Scope) -> Result<Vec<Self::Item>, FetchError>;
}

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// What happens to the visible items while a load is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadingPolicy {
    /// Items are emptied on `Loading` and restored on `Error`.
    #[default]
    Clear,
    /// The previous items stay visible until the load settles.
    RetainStale,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListStatus {
    Loading,
    Ready,
    Error(FetchError),
}

#[derive(Debug, Clone)]
pub struct ListState<T> {
    pub status: ListStatus,
    pub items: Arc<[T]>,
}

impl<T> ListState<T> {
    pub fn is_loading(&self) -> bool {
        self.status == ListStatus::Loading
    }

    pub fn error(&self) -> Option<&FetchError> {
        match &self.status {
            ListStatus::Error(e) => Some(e),
            _ => None,
        }
    }
}

impl<T> Default for ListState<T> {
    fn default() -> Self {
        Self {
            status: ListStatus::Loading,
            items: Arc::from(Vec::new()),
        }
    }
}

/// Result of one `load` call as seen by its caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The response was applied to the store.
    Applied,
    /// A newer load was issued meanwhile; the response was dropped.
    Discarded,
    /// `refresh` was called before any `load`.
    Skipped,
}

// ---------------------------------------------------------------------------
// Subscriptions
// ---------------------------------------------------------------------------

type Observer<T> = Arc<dyn Fn(&ListState<T>) + Send + Sync>;
type ResetHook<T> = Arc<dyn Fn(&[T]) + Send + Sync>;

/// Keeps an observer registered. Dropping it unsubscribes.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    pub fn unsubscribe(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

struct Shared<S, T> {
    state: ListState<T>,
    last_scope: Option<S>,
    /// Items of the last successful load; what `Error` falls back to.
    last_good: Arc<[T]>,
    /// Id-set of the last `Ready` state, `None` before the first one.
    ready_ids: Option<HashSet<String>>,
    next_observer: u64,
    observers: Vec<(u64, Observer<T>)>,
    reset_hooks: Vec<(u64, ResetHook<T>)>,
}

struct StoreInner<F: ListFetcher> {
    fetcher: F,
    policy: LoadingPolicy,
    /// Sequence number of the most recently issued load.
    latest_seq: AtomicU64,
    shared: Mutex<Shared<F::Scope, F::Item>>,
}

impl<F: ListFetcher> StoreInner<F> {
    fn lock(&self) -> MutexGuard<'_, Shared<F::Scope, F::Item>> {
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// The current list of entities for one scope plus its load status.
///
/// Cheaply cloneable; clones share the same state.
pub struct EntityListStore<F: ListFetcher> {
    inner: Arc<StoreInner<F>>,
}

impl<F: ListFetcher> Clone for EntityListStore<F> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<F: ListFetcher> EntityListStore<F> {
    pub fn new(fetcher: F, policy: LoadingPolicy) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                fetcher,
                policy,
                latest_seq: AtomicU64::new(0),
                shared: Mutex::new(Shared {
                    state: ListState::default(),
                    last_scope: None,
                    last_good: Arc::from(Vec::new()),
                    ready_ids: None,
                    next_observer: 0,
                    observers: Vec::new(),
                    reset_hooks: Vec::new(),
                }),
            }),
        }
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> ListState<F::Item> {
        self.inner.lock().state.clone()
    }

    /// Scope of the most recent `load`.
    pub fn scope(&self) -> Option<F::Scope> {
        self.inner.lock().last_scope.clone()
    }

    /// Load the list for `scope`.
    ///
    /// The sequence number is issued and `Loading` published when this is
    /// called, not when the returned future is first polled, so responses are
    /// ordered by call order.
    pub fn load(
        &self,
        scope: F::Scope,
    ) -> impl Future<Output = LoadOutcome> + Send + 'static + use<F> {
        self.run(self.begin_load(Some(scope)))
    }

    /// Re-run `load` with the last-used scope.
    ///
    /// The scope is read in the same critical section that issues the
    /// sequence number, so a concurrent `load` cannot slip in between.
    pub fn refresh(&self) -> impl Future<Output = LoadOutcome> + Send + 'static + use<F> {
        self.run(self.begin_load(None))
    }

    fn run(
        &self,
        started: Option<(u64, F::Scope)>,
    ) -> impl Future<Output = LoadOutcome> + Send + 'static + use<F> {
        let inner = Arc::clone(&self.inner);
        async move {
            let Some((seq, scope)) = started else {
                return LoadOutcome::Skipped;
            };
            let result = inner.fetcher.fetch(&scope).await;
            settle(&inner, seq, result)
        }
    }

    /// Drop all items, including the last known-good snapshot.
    pub fn clear(&self) {
        let (observers, snapshot) = {
            let mut shared = self.inner.lock();
            shared.last_good = Arc::from(Vec::new());
            shared.state.items = Arc::from(Vec::new());
            (collect_observers(&shared), shared.state.clone())
        };
        for observer in observers {
            observer(&snapshot);
        }
    }

    /// Call `on_change` after every state transition.
    pub fn subscribe(
        &self,
        on_change: impl Fn(&ListState<F::Item>) + Send + Sync + 'static,
    ) -> Subscription {
        let id = {
            let mut shared = self.inner.lock();
            let id = shared.next_observer;
            shared.next_observer += 1;
            shared.observers.push((id, Arc::new(on_change)));
            id
        };
        let weak = Arc::downgrade(&self.inner);
        Subscription {
            cancel: Some(Box::new(move || {
                remove_observer(&weak, id, false);
            })),
        }
    }

    /// Call `on_reset` whenever a load settles with a different id-set than
    /// the previous `Ready` state. Views reset cursor and layout state here.
    pub fn on_reset(
        &self,
        on_reset: impl Fn(&[F::Item]) + Send + Sync + 'static,
    ) -> Subscription {
        let id = {
            let mut shared = self.inner.lock();
            let id = shared.next_observer;
            shared.next_observer += 1;
            shared.reset_hooks.push((id, Arc::new(on_reset)));
            id
        };
        let weak = Arc::downgrade(&self.inner);
        Subscription {
            cancel: Some(Box::new(move || {
                remove_observer(&weak, id, true);
            })),
        }
    }

    /// Issue a sequence number and publish `Loading` for `scope`, or for the
    /// last-used scope when `None`. Returns `None` if there is no scope yet.
    fn begin_load(&self, scope: Option<F::Scope>) -> Option<(u64, F::Scope)> {
        let (seq, scope, observers, snapshot) = {
            let mut shared = self.inner.lock();
            let scope = scope.or_else(|| shared.last_scope.clone())?;
            // Issued under the lock: the latest sequence number always
            // belongs to the latest `last_scope` and `Loading` write.
            let seq = self.inner.latest_seq.fetch_add(1, Ordering::SeqCst) + 1;
            shared.last_scope = Some(scope.clone());
            shared.state.status = ListStatus::Loading;
            if self.inner.policy == LoadingPolicy::Clear {
                shared.state.items = Arc::from(Vec::new());
            }
            (seq, scope, collect_observers(&shared), shared.state.clone())
        };
        tracing::debug!("store: load #{seq} issued");
        for observer in observers {
            observer(&snapshot);
        }
        Some((seq, scope))
    }
}

fn collect_observers<S, T>(shared: &Shared<S, T>) -> Vec<Observer<T>> {
    shared.observers.iter().map(|(_, o)| Arc::clone(o)).collect()
}

fn remove_observer<F: ListFetcher>(weak: &Weak<StoreInner<F>>, id: u64, reset: bool) {
    let Some(inner) = weak.upgrade() else {
        return;
    };
    let mut shared = inner.lock();
    if reset {
        shared.reset_hooks.retain(|(i, _)| *i != id);
    } else {
        shared.observers.retain(|(i, _)| *i != id);
    }
}

fn settle<F: ListFetcher>(
    inner: &StoreInner<F>,
    seq: u64,
    result: Result<Vec<F::Item>, FetchError>,
) -> LoadOutcome {
    let mut reset = None;
    let (observers, snapshot) = {
        let mut shared = inner.lock();
        // Checked under the lock so a concurrent `begin_load` cannot slip in
        // between the check and the write.
        let latest = inner.latest_seq.load(Ordering::SeqCst);
        if seq != latest {
            tracing::debug!("store: discarding stale response #{seq} (latest #{latest})");
            return LoadOutcome::Discarded;
        }
        match result {
            Ok(items) => {
                let ids: HashSet<String> = items.iter().map(|i| i.id().to_owned()).collect();
                let items: Arc<[F::Item]> = Arc::from(items);
                if shared.ready_ids.as_ref().is_some_and(|prev| *prev != ids) {
                    let hooks: Vec<_> = shared
                        .reset_hooks
                        .iter()
                        .map(|(_, h)| Arc::clone(h))
                        .collect();
                    reset = Some((hooks, Arc::clone(&items)));
                }
                tracing::debug!("store: load #{seq} ready, {} items", items.len());
                shared.ready_ids = Some(ids);
                shared.last_good = Arc::clone(&items);
                shared.state = ListState {
                    status: ListStatus::Ready,
                    items,
                };
            }
            Err(e) => {
                tracing::warn!("store: load #{seq} failed: {e}");
                shared.state = ListState {
                    status: ListStatus::Error(e),
                    items: Arc::clone(&shared.last_good),
                };
            }
        }
        (collect_observers(&shared), shared.state.clone())
    };
    if let Some((hooks, items)) = reset {
        for hook in hooks {
            hook(&items);
        }
    }
    for observer in observers {
        observer(&snapshot);
    }
    LoadOutcome::Applied
}

// ---------------------------------------------------------------------------
// Refresh seam for the dispatcher
// ---------------------------------------------------------------------------

/// Anything that can re-fetch its list after a remote action succeeded.
#[async_trait]
pub trait RefreshTarget: Send + Sync {
    async fn refresh_list(&self);
}

#[async_trait]
impl<F: ListFetcher> RefreshTarget for EntityListStore<F> {
    async fn refresh_list(&self) {
        self.refresh().await;
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::AtomicUsize;

    use tokio::sync::oneshot;

    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Row(&'static str);

    impl Entity for Row {
        fn id(&self) -> &str {
            self.0
        }
    }

    /// Fetcher whose responses are released by the test, keyed by scope.
    #[derive(Default)]
    struct GatedFetcher {
        gates: Mutex<HashMap<&'static str, oneshot::Receiver<Result<Vec<Row>, FetchError>>>>,
    }

    impl GatedFetcher {
        fn gate(&self, scope: &'static str) -> oneshot::Sender<Result<Vec<Row>, FetchError>> {
            let (tx, rx) = oneshot::channel();
            self.gates.lock().unwrap().insert(scope, rx);
            tx
        }
    }

    #[async_trait]
    impl ListFetcher for Arc<GatedFetcher> {
        type Scope = &'static str;
        type Item = Row;

        async fn fetch(&self, scope: &&'static str) -> Result<Vec<Row>, FetchError> {
            let rx = self.gates.lock().unwrap().remove(scope).expect("gate registered");
            rx.await.expect("gate released")
        }
    }

    /// Fetcher answering immediately from a script, counting calls.
    struct ScriptedFetcher {
        calls: AtomicUsize,
        script: Mutex<Vec<Result<Vec<Row>, FetchError>>>,
    }

    #[async_trait]
    impl ListFetcher for Arc<ScriptedFetcher> {
        type Scope = ();
        type Item = Row;

        async fn fetch(&self, _scope: &()) -> Result<Vec<Row>, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.script.lock().unwrap().remove(0)
        }
    }

    fn scripted(script: Vec<Result<Vec<Row>, FetchError>>) -> Arc<ScriptedFetcher> {
        Arc::new(ScriptedFetcher {
            calls: AtomicUsize::new(0),
            script: Mutex::new(script),
        })
    }

    /// Fetcher answering with a single row named after the scope.
    struct EchoFetcher;

    #[async_trait]
    impl ListFetcher for EchoFetcher {
        type Scope = &'static str;
        type Item = Row;

        async fn fetch(&self, scope: &&'static str) -> Result<Vec<Row>, FetchError> {
            tokio::task::yield_now().await;
            Ok(vec![Row(*scope)])
        }
    }

    fn ids(state: &ListState<Row>) -> Vec<&'static str> {
        state.items.iter().map(|r| r.0).collect()
    }

    #[tokio::test]
    async fn late_stale_response_is_discarded() {
        let fetcher = Arc::new(GatedFetcher::default());
        let first = fetcher.gate("req-1");
        let second = fetcher.gate("req-2");
        let store = EntityListStore::new(Arc::clone(&fetcher), LoadingPolicy::Clear);

        let load1 = tokio::spawn(store.load("req-1"));
        let load2 = tokio::spawn(store.load("req-2"));

        second.send(Ok(vec![Row("b")])).unwrap();
        assert_eq!(load2.await.unwrap(), LoadOutcome::Applied);
        first.send(Ok(vec![Row("a")])).unwrap();
        assert_eq!(load1.await.unwrap(), LoadOutcome::Discarded);

        let state = store.state();
        assert_eq!(state.status, ListStatus::Ready);
        assert_eq!(ids(&state), vec!["b"]);
    }

    #[tokio::test]
    async fn stale_error_does_not_clobber_newer_ready() {
        let fetcher = Arc::new(GatedFetcher::default());
        let first = fetcher.gate("req-1");
        let second = fetcher.gate("req-2");
        let store = EntityListStore::new(Arc::clone(&fetcher), LoadingPolicy::Clear);

        let load1 = tokio::spawn(store.load("req-1"));
        let load2 = tokio::spawn(store.load("req-2"));
        second.send(Ok(vec![Row("b")])).unwrap();
        load2.await.unwrap();
        first.send(Err(FetchError::new("boom"))).unwrap();
        load1.await.unwrap();

        assert_eq!(store.state().status, ListStatus::Ready);
    }

    #[tokio::test]
    async fn error_retains_last_good_items() {
        let fetcher = scripted(vec![
            Ok(vec![Row("a"), Row("b")]),
            Err(FetchError::new("network down")),
        ]);
        let store = EntityListStore::new(fetcher, LoadingPolicy::Clear);

        store.load(()).await;
        store.refresh().await;

        let state = store.state();
        assert_eq!(state.error(), Some(&FetchError::new("network down")));
        assert_eq!(ids(&state), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn clear_policy_empties_items_while_loading() {
        let fetcher = scripted(vec![Ok(vec![Row("a")]), Ok(vec![Row("a")])]);
        let store = EntityListStore::new(fetcher, LoadingPolicy::Clear);
        store.load(()).await;

        let pending = store.refresh();
        let state = store.state();
        assert!(state.is_loading());
        assert!(state.items.is_empty());
        pending.await;
    }

    #[tokio::test]
    async fn retain_policy_keeps_items_while_loading() {
        let fetcher = scripted(vec![Ok(vec![Row("a")]), Ok(vec![Row("a")])]);
        let store = EntityListStore::new(fetcher, LoadingPolicy::RetainStale);
        store.load(()).await;

        let pending = store.refresh();
        let state = store.state();
        assert!(state.is_loading());
        assert_eq!(ids(&state), vec!["a"]);
        pending.await;
    }

    #[tokio::test]
    async fn refresh_without_scope_is_skipped() {
        let fetcher = scripted(vec![]);
        let store = EntityListStore::new(Arc::clone(&fetcher), LoadingPolicy::Clear);
        assert_eq!(store.refresh().await, LoadOutcome::Skipped);
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn subscribers_see_every_transition_until_dropped() {
        let fetcher = scripted(vec![Ok(vec![Row("a")]), Ok(vec![Row("a")])]);
        let store = EntityListStore::new(fetcher, LoadingPolicy::Clear);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let sub = store.subscribe(move |s| sink.lock().unwrap().push(s.status.clone()));

        store.load(()).await;
        assert_eq!(
            *seen.lock().unwrap(),
            vec![ListStatus::Loading, ListStatus::Ready]
        );

        sub.unsubscribe();
        store.refresh().await;
        assert_eq!(seen.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn reset_fires_only_when_id_set_changes() {
        let fetcher = scripted(vec![
            Ok(vec![Row("a"), Row("b")]),
            Ok(vec![Row("b"), Row("a")]),
            Ok(vec![Row("a"), Row("c")]),
        ]);
        let store = EntityListStore::new(fetcher, LoadingPolicy::Clear);
        let resets = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&resets);
        let _sub = store.on_reset(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        store.load(()).await;
        store.refresh().await;
        assert_eq!(resets.load(Ordering::SeqCst), 0);
        store.refresh().await;
        assert_eq!(resets.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn concurrent_loads_settle_on_the_latest_scope() {
        let store = EntityListStore::new(EchoFetcher, LoadingPolicy::Clear);
        for _ in 0..200 {
            let a = spawn_load(&store, Some("a"));
            let b = spawn_load(&store, None);
            let c = spawn_load(&store, Some("c"));
            a.await.unwrap();
            b.await.unwrap();
            c.await.unwrap();

            let state = store.state();
            assert_eq!(state.status, ListStatus::Ready);
            let scope = store.scope().unwrap();
            assert_eq!(ids(&state), vec![scope]);
        }
    }

    /// Begin a load (or a refresh for `None`) on a worker thread.
    fn spawn_load(
        store: &EntityListStore<EchoFetcher>,
        scope: Option<&'static str>,
    ) -> tokio::task::JoinHandle<LoadOutcome> {
        let store = store.clone();
        tokio::spawn(async move {
            match scope {
                Some(scope) => store.load(scope).await,
                None => store.refresh().await,
            }
        })
    }
}
