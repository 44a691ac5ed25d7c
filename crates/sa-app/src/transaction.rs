//! Optimistic write handle.
//!
//! A [`Transaction`] is created by [`crate::MirrorStore::begin`] after the
//! optimistic value is already visible in the mirror. It must end in exactly
//! one of [`Transaction::commit`] or [`Transaction::rollback`]; a handle that
//! is dropped unfinished (for example because the awaiting future was
//! cancelled) rolls back.

use tracing::{debug, warn};

use sa_core::{Entity, RecordId};

use crate::mirror_store::{lock_inner, SharedInner};

#[must_use = "an unfinished transaction rolls back when dropped"]
pub struct Transaction<T: Entity> {
    inner: SharedInner<T>,
    id: RecordId,
    previous: T,
    index: usize,
    marker: u64,
    finished: bool,
}

impl<T: Entity> Transaction<T> {
    pub(crate) fn new(
        inner: SharedInner<T>,
        id: RecordId,
        previous: T,
        index: usize,
        marker: u64,
    ) -> Self {
        Self {
            inner,
            id,
            previous,
            index,
            marker,
            finished: false,
        }
    }

    pub fn id(&self) -> &RecordId {
        &self.id
    }

    /// Entry as it was before the optimistic write.
    pub fn previous(&self) -> &T {
        &self.previous
    }

    /// Reconciles the mirror entry with the server's value and returns the
    /// merged record.
    ///
    /// Last write wins: the server value is applied even if the entry was
    /// changed while the call was in flight. An entry whose removal was
    /// confirmed in the meantime stays removed.
    pub fn commit(mut self, server: T) -> T {
        self.finished = true;
        let mut inner = lock_inner(&self.inner);
        inner.clear_pending(&self.id, self.marker);
        match inner.position(&self.id) {
            Some(index) => {
                inner.records[index].reconcile(server);
                inner.records[index].clone()
            }
            None if inner.was_removed(&self.id) => {
                debug!(collection = T::COLLECTION, id = %self.id, "entry removed before commit, not re-inserting");
                server
            }
            None => {
                debug!(collection = T::COLLECTION, id = %self.id, "entry vanished before commit, re-inserting");
                inner.restore_at(self.index, server.clone());
                server
            }
        }
    }

    /// Restores the entry to exactly its pre-transaction value. An entry that
    /// has left the mirror meanwhile is not brought back.
    pub fn rollback(mut self) {
        self.finished = true;
        self.restore();
    }

    fn restore(&self) {
        let mut inner = lock_inner(&self.inner);
        inner.clear_pending(&self.id, self.marker);
        if inner.position(&self.id).is_none() {
            debug!(collection = T::COLLECTION, id = %self.id, "entry left the mirror, nothing to roll back");
            return;
        }
        inner.restore_at(self.index, self.previous.clone());
        warn!(collection = T::COLLECTION, id = %self.id, "optimistic write rolled back");
    }
}

impl<T: Entity> Drop for Transaction<T> {
    fn drop(&mut self) {
        if !self.finished {
            self.restore();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use chrono::Utc;
    use sa_core::catalog::{Collection, CollectionDraft, CollectionPatch};
    use sa_core::ports::{
        AuthContextPort, AuthStatus, GatewayError, ListQuery, ListResponse, RemoteGatewayPort,
    };
    use sa_core::MutationKind;

    use crate::mirror_store::{MirrorMutation, MirrorStore};

    use super::*;

    struct NoGateway;

    #[async_trait]
    impl RemoteGatewayPort<Collection> for NoGateway {
        async fn get_all(
            &self,
            _query: &ListQuery,
        ) -> Result<ListResponse<Collection>, GatewayError> {
            Err(GatewayError::Network("offline".into()))
        }

        async fn create(&self, _draft: &CollectionDraft) -> Result<Collection, GatewayError> {
            Err(GatewayError::Network("offline".into()))
        }

        async fn update(
            &self,
            _id: &RecordId,
            _patch: &CollectionPatch,
        ) -> Result<Collection, GatewayError> {
            Err(GatewayError::Network("offline".into()))
        }

        async fn remove(&self, _id: &RecordId) -> Result<bool, GatewayError> {
            Err(GatewayError::Network("offline".into()))
        }
    }

    struct Ready;

    impl AuthContextPort for Ready {
        fn status(&self) -> AuthStatus {
            AuthStatus::Unauthenticated
        }
    }

    fn seeded() -> MirrorStore<Collection> {
        let store = MirrorStore::new(Arc::new(NoGateway), Arc::new(Ready), Duration::ZERO);
        for (id, name) in [("a", "Summer"), ("b", "Winter"), ("c", "Sale")] {
            store.apply(MirrorMutation::Upsert(Collection::from_draft(
                RecordId::from(id),
                CollectionDraft {
                    name: name.into(),
                    description: None,
                    featured: false,
                },
                Utc::now(),
            )));
        }
        store
    }

    fn featured(store: &MirrorStore<Collection>, id: &str) -> Collection {
        let mut record = store.get(&RecordId::from(id)).unwrap();
        record.apply_patch(&CollectionPatch::featured(true));
        record
    }

    #[test]
    fn optimistic_value_is_visible_until_rollback() {
        let store = seeded();
        let before = store.snapshot();

        let tx = store.begin(featured(&store, "b")).unwrap();
        assert!(store.get(&RecordId::from("b")).unwrap().featured);
        assert_eq!(store.pending(&RecordId::from("b")), Some(MutationKind::Update));

        tx.rollback();
        assert_eq!(store.snapshot(), before);
        assert_eq!(store.pending(&RecordId::from("b")), None);
    }

    #[test]
    fn rollback_does_not_resurrect_removed_entry() {
        let store = seeded();

        let tx = store.begin(featured(&store, "b")).unwrap();
        store.apply(MirrorMutation::Remove(RecordId::from("b")));
        tx.rollback();

        assert!(!store.contains(&RecordId::from("b")));
        assert_eq!(store.len(), 2);
        assert!(!store.has_pending());
    }

    #[test]
    fn commit_after_removal_keeps_entry_removed() {
        let store = seeded();

        let tx = store.begin(featured(&store, "a")).unwrap();
        store.apply(MirrorMutation::Remove(RecordId::from("a")));
        let server = tx.previous().clone();
        tx.commit(server);

        assert!(!store.contains(&RecordId::from("a")));
    }

    #[test]
    fn rollback_restores_previous_value_in_place() {
        let store = seeded();
        let before = store.snapshot();

        let tx = store.begin(featured(&store, "b")).unwrap();
        store.apply(MirrorMutation::Upsert(featured(&store, "c")));
        tx.rollback();

        assert_eq!(store.get(&RecordId::from("b")), before.get(1).cloned());
        let ids: Vec<String> = store.snapshot().iter().map(|c| c.id.to_string()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn commit_applies_server_value() {
        let store = seeded();
        let tx = store.begin(featured(&store, "a")).unwrap();

        let mut server = tx.previous().clone();
        server.featured = true;
        server.updated_at = Utc::now() + chrono::Duration::seconds(5);
        let merged = tx.commit(server.clone());

        assert_eq!(merged, server);
        assert_eq!(store.get(&RecordId::from("a")).unwrap(), server);
        assert!(!store.has_pending());
    }

    #[test]
    fn dropped_transaction_rolls_back() {
        let store = seeded();
        let before = store.snapshot();
        {
            let _tx = store.begin(featured(&store, "c")).unwrap();
        }
        assert_eq!(store.snapshot(), before);
    }
}
