//! Local mirror of one remote collection.
//!
//! The mirror is the UI's copy of the collection: an ordered list keyed by
//! record id. Reads are snapshots, writes are synchronous and never hold the
//! lock across an await, so every mutation is atomic with respect to other
//! callers. The only suspension points are gateway calls.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt, Shared};
use tracing::{debug, info, warn};

use sa_core::ports::{AuthContextPort, ListQuery, Pagination, RemoteGatewayPort};
use sa_core::{
    derive_view, Entity, FetchError, FilterSortDescriptor, LoadState, MutationError,
    MutationKind, PendingMutation, RecordId,
};

use crate::timeout::with_timeout;
use crate::transaction::Transaction;

type LoadOutcome<T> = Result<Vec<T>, FetchError>;
type SharedLoad<T> = Shared<BoxFuture<'static, LoadOutcome<T>>>;

/// Synchronous change applied to the mirror without any I/O.
#[derive(Debug, Clone, PartialEq)]
pub enum MirrorMutation<T: Entity> {
    /// Replace the entry with the same id in place, or append it.
    Upsert(T),
    Remove(RecordId),
}

struct InFlight<T> {
    query: ListQuery,
    load: SharedLoad<T>,
}

pub(crate) struct PendingSlot<T> {
    marker: u64,
    mutation: PendingMutation<T>,
}

pub(crate) struct MirrorInner<T: Entity> {
    pub(crate) records: Vec<T>,
    load_state: LoadState,
    in_flight: Option<InFlight<T>>,
    pending: HashMap<RecordId, PendingSlot<T>>,
    removed: HashSet<RecordId>,
    pagination: Option<Pagination>,
    next_marker: u64,
}

pub(crate) type SharedInner<T> = Arc<Mutex<MirrorInner<T>>>;

pub(crate) fn lock_inner<T: Entity>(inner: &Mutex<MirrorInner<T>>) -> MutexGuard<'_, MirrorInner<T>> {
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<T: Entity> MirrorInner<T> {
    fn new() -> Self {
        Self {
            records: Vec::new(),
            load_state: LoadState::Idle,
            in_flight: None,
            pending: HashMap::new(),
            removed: HashSet::new(),
            pagination: None,
            next_marker: 0,
        }
    }

    pub(crate) fn position(&self, id: &RecordId) -> Option<usize> {
        self.records.iter().position(|r| r.id() == id)
    }

    pub(crate) fn apply(&mut self, mutation: MirrorMutation<T>) {
        match mutation {
            MirrorMutation::Upsert(record) => {
                self.removed.remove(record.id());
                match self.position(record.id()) {
                    Some(index) => self.records[index] = record,
                    None => self.records.push(record),
                }
            }
            MirrorMutation::Remove(id) => {
                self.records.retain(|r| r.id() != &id);
                self.removed.insert(id);
            }
        }
    }

    /// Whether `id` was removed from the mirror and has not come back since.
    pub(crate) fn was_removed(&self, id: &RecordId) -> bool {
        self.removed.contains(id)
    }

    /// Puts `record` back at `index` (clamped), replacing any entry with the
    /// same id.
    pub(crate) fn restore_at(&mut self, index: usize, record: T) {
        match self.position(record.id()) {
            Some(existing) => self.records[existing] = record,
            None => {
                let index = index.min(self.records.len());
                self.records.insert(index, record);
            }
        }
    }

    pub(crate) fn mark_pending(
        &mut self,
        id: RecordId,
        kind: MutationKind,
        previous: Option<T>,
    ) -> u64 {
        self.next_marker += 1;
        let marker = self.next_marker;
        self.pending.insert(
            id,
            PendingSlot {
                marker,
                mutation: PendingMutation { kind, previous },
            },
        );
        marker
    }

    /// Clears the marker only if it is still the one that was set; a later
    /// mutation of the same record owns the slot otherwise.
    pub(crate) fn clear_pending(&mut self, id: &RecordId, marker: u64) {
        if self.pending.get(id).is_some_and(|slot| slot.marker == marker) {
            self.pending.remove(id);
        }
    }

    fn replace_all(&mut self, records: Vec<T>) {
        let mut seen = HashSet::with_capacity(records.len());
        let before = records.len();
        self.records = records
            .into_iter()
            .filter(|r| seen.insert(r.id().clone()))
            .collect();
        self.removed.retain(|id| !seen.contains(id));
        if self.records.len() != before {
            warn!(
                collection = T::COLLECTION,
                dropped = before - self.records.len(),
                "server returned duplicate ids, keeping first occurrence"
            );
        }
    }
}

/// Removes a pending marker when dropped.
pub(crate) struct PendingGuard<T: Entity> {
    inner: SharedInner<T>,
    id: RecordId,
    marker: u64,
}

impl<T: Entity> Drop for PendingGuard<T> {
    fn drop(&mut self) {
        lock_inner(&self.inner).clear_pending(&self.id, self.marker);
    }
}

/// Holder of the authoritative-for-the-UI copy of a remote collection.
pub struct MirrorStore<T: Entity> {
    gateway: Arc<dyn RemoteGatewayPort<T>>,
    auth: Arc<dyn AuthContextPort>,
    request_timeout: Duration,
    inner: SharedInner<T>,
}

impl<T: Entity> MirrorStore<T> {
    pub fn new(
        gateway: Arc<dyn RemoteGatewayPort<T>>,
        auth: Arc<dyn AuthContextPort>,
        request_timeout: Duration,
    ) -> Self {
        Self {
            gateway,
            auth,
            request_timeout,
            inner: Arc::new(Mutex::new(MirrorInner::new())),
        }
    }

    pub(crate) fn gateway(&self) -> &Arc<dyn RemoteGatewayPort<T>> {
        &self.gateway
    }

    pub(crate) fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    fn lock(&self) -> MutexGuard<'_, MirrorInner<T>> {
        lock_inner(&self.inner)
    }

    /// Replaces the mirror with the full remote collection.
    ///
    /// A call made while another load with the same query is outstanding
    /// joins it and receives the same outcome; the gateway sees a single
    /// `get_all`. A load with a different query waits for the outstanding
    /// one and then fetches. On failure the existing contents are kept.
    pub async fn load(&self) -> Result<Vec<T>, FetchError> {
        self.load_with(ListQuery::all()).await
    }

    /// Server-side pagination variant of [`MirrorStore::load`]: the mirror
    /// holds the returned page and [`MirrorStore::pagination`] describes it.
    pub async fn load_page(&self, query: ListQuery) -> Result<Vec<T>, FetchError> {
        self.load_with(query).await
    }

    #[tracing::instrument(
        name = "usecase.mirror.load",
        skip(self),
        fields(collection = T::COLLECTION)
    )]
    async fn load_with(&self, query: ListQuery) -> Result<Vec<T>, FetchError> {
        if !self.auth.status().is_resolved() {
            debug!("auth context still loading, skipping fetch");
            return Err(FetchError::AuthNotReady);
        }

        let load = loop {
            let waiting = {
                let mut inner = self.lock();
                let current = inner
                    .in_flight
                    .as_ref()
                    .map(|f| (f.query == query, f.load.clone()));
                match current {
                    Some((true, in_flight)) => {
                        debug!("joining in-flight load");
                        break in_flight;
                    }
                    Some((false, other)) => other,
                    None => {
                        if let Some(next) = inner.load_state.begin() {
                            inner.load_state = next;
                        }
                        let load = self.fetch(query.clone()).boxed().shared();
                        inner.in_flight = Some(InFlight {
                            query: query.clone(),
                            load: load.clone(),
                        });
                        break load;
                    }
                }
            };
            debug!("load with another query in flight, waiting for it");
            let _ = waiting.await;
        };

        load.await
    }

    fn fetch(&self, query: ListQuery) -> impl std::future::Future<Output = LoadOutcome<T>> + Send + 'static {
        let gateway = Arc::clone(&self.gateway);
        let inner = Arc::clone(&self.inner);
        let limit = self.request_timeout;

        async move {
            let result = with_timeout(limit, gateway.get_all(&query))
                .await
                .map_err(FetchError::from);

            let mut guard = lock_inner(&inner);
            guard.in_flight = None;
            let state = std::mem::take(&mut guard.load_state);
            match result {
                Ok(response) => {
                    guard.replace_all(response.data);
                    guard.pagination = response.pagination;
                    guard.load_state = state.on_loaded();
                    info!(
                        collection = T::COLLECTION,
                        count = guard.records.len(),
                        "mirror loaded"
                    );
                    Ok(guard.records.clone())
                }
                Err(err) => {
                    guard.load_state = state.on_failed(err.clone());
                    warn!(collection = T::COLLECTION, error = %err, "mirror load failed, keeping stale contents");
                    Err(err)
                }
            }
        }
    }

    /// Applies a mutation synchronously, no I/O.
    pub fn apply(&self, mutation: MirrorMutation<T>) {
        self.lock().apply(mutation);
    }

    /// Copy of the current contents.
    pub fn snapshot(&self) -> Vec<T> {
        self.lock().records.clone()
    }

    /// Derived view of the current contents.
    pub fn view(&self, descriptor: &FilterSortDescriptor) -> Vec<T> {
        derive_view(&self.lock().records, descriptor)
    }

    pub fn get(&self, id: &RecordId) -> Option<T> {
        let inner = self.lock();
        inner.position(id).map(|index| inner.records[index].clone())
    }

    pub fn contains(&self, id: &RecordId) -> bool {
        self.lock().position(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.lock().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().records.is_empty()
    }

    pub fn load_state(&self) -> LoadState {
        self.lock().load_state.clone()
    }

    pub fn pagination(&self) -> Option<Pagination> {
        self.lock().pagination
    }

    /// Kind of the outstanding mutation on `id`, if any. UIs use this to
    /// disable the triggering control.
    pub fn pending(&self, id: &RecordId) -> Option<MutationKind> {
        self.lock().pending.get(id).map(|slot| slot.mutation.kind)
    }

    pub fn has_pending(&self) -> bool {
        !self.lock().pending.is_empty()
    }

    pub(crate) fn track(
        &self,
        id: RecordId,
        kind: MutationKind,
        previous: Option<T>,
    ) -> PendingGuard<T> {
        let marker = self.lock().mark_pending(id.clone(), kind, previous);
        PendingGuard {
            inner: Arc::clone(&self.inner),
            id,
            marker,
        }
    }

    /// Writes `optimistic` over the entry with the same id and returns the
    /// handle that either commits the server's answer or restores the
    /// previous entry.
    pub fn begin(&self, optimistic: T) -> Result<Transaction<T>, MutationError> {
        let id = optimistic.id().clone();
        let mut inner = self.lock();
        let index = inner
            .position(&id)
            .ok_or_else(|| MutationError::NotFound { id: id.clone() })?;
        let previous = std::mem::replace(&mut inner.records[index], optimistic);
        let marker = inner.mark_pending(id.clone(), MutationKind::Update, Some(previous.clone()));
        drop(inner);

        Ok(Transaction::new(
            Arc::clone(&self.inner),
            id,
            previous,
            index,
            marker,
        ))
    }
}
