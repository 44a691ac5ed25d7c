//! Optimistic CRUD over a mirrored collection.
//!
//! - create: validated, then inserted once the server returns the record
//!   with its authoritative id and timestamps.
//! - update: applied to the mirror immediately, reconciled with the server
//!   value on success, restored field-for-field on failure.
//! - delete: not optimistic; the record leaves the mirror only after the
//!   server confirms. Protected records are refused without a gateway call.
//!
//! Successful mutations can fire invalidation signals so that sibling
//! components (badge counters, permission caches) refresh.

use std::sync::Arc;

use tracing::{info, warn};

use sa_core::{DeleteProtection, Entity, MutationError, MutationKind, RecordId};

use crate::invalidation::InvalidationRegistry;
use crate::mirror_store::{MirrorMutation, MirrorStore};
use crate::timeout::with_timeout;

struct InvalidationTarget {
    registry: Arc<InvalidationRegistry>,
    sections: Vec<String>,
}

pub struct OptimisticMutator<T: Entity> {
    store: Arc<MirrorStore<T>>,
    protection: DeleteProtection,
    invalidation: Option<InvalidationTarget>,
}

impl<T: Entity> OptimisticMutator<T> {
    pub fn new(store: Arc<MirrorStore<T>>) -> Self {
        Self {
            store,
            protection: DeleteProtection::none(),
            invalidation: None,
        }
    }

    pub fn with_protection(mut self, protection: DeleteProtection) -> Self {
        self.protection = protection;
        self
    }

    /// Sections to invalidate after every successful mutation.
    pub fn invalidating<I, S>(mut self, registry: Arc<InvalidationRegistry>, sections: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.invalidation = Some(InvalidationTarget {
            registry,
            sections: sections.into_iter().map(Into::into).collect(),
        });
        self
    }

    pub fn store(&self) -> &Arc<MirrorStore<T>> {
        &self.store
    }

    #[tracing::instrument(
        name = "usecase.mutator.create",
        skip(self, draft),
        fields(collection = T::COLLECTION)
    )]
    pub async fn create_record(&self, draft: T::Draft) -> Result<T, MutationError> {
        T::validate_draft(&draft)?;

        // The server assigns the id; the marker is keyed by a local one.
        let _pending = self
            .store
            .track(RecordId::new(), MutationKind::Create, None);

        let created = with_timeout(
            self.store.request_timeout(),
            self.store.gateway().create(&draft),
        )
        .await
        .map_err(|err| {
            warn!(error = %err, "create failed, nothing inserted");
            MutationError::from(err)
        })?;

        self.store.apply(MirrorMutation::Upsert(created.clone()));
        info!(id = %created.id(), "record created");
        self.notify_invalidation();
        Ok(created)
    }

    #[tracing::instrument(
        name = "usecase.mutator.update",
        skip(self, id, patch),
        fields(collection = T::COLLECTION, id = %id)
    )]
    pub async fn update_record(&self, id: &RecordId, patch: T::Patch) -> Result<T, MutationError> {
        let current = self
            .store
            .get(id)
            .ok_or_else(|| MutationError::NotFound { id: id.clone() })?;
        T::validate_patch(&patch)?;

        let mut optimistic = current;
        optimistic.apply_patch(&patch);
        let transaction = self.store.begin(optimistic)?;

        match with_timeout(
            self.store.request_timeout(),
            self.store.gateway().update(id, &patch),
        )
        .await
        {
            Ok(server) => {
                let merged = transaction.commit(server);
                info!("record updated");
                self.notify_invalidation();
                Ok(merged)
            }
            Err(err) => {
                transaction.rollback();
                warn!(error = %err, "update failed");
                Err(err.into())
            }
        }
    }

    #[tracing::instrument(
        name = "usecase.mutator.delete",
        skip(self, id),
        fields(collection = T::COLLECTION, id = %id)
    )]
    pub async fn delete_record(&self, id: &RecordId) -> Result<(), MutationError> {
        let record = self
            .store
            .get(id)
            .ok_or_else(|| MutationError::NotFound { id: id.clone() })?;
        self.protection.check(&record)?;

        let _pending = self
            .store
            .track(id.clone(), MutationKind::Delete, Some(record));

        let removed = with_timeout(
            self.store.request_timeout(),
            self.store.gateway().remove(id),
        )
        .await
        .map_err(|err| {
            warn!(error = %err, "delete failed, record kept");
            MutationError::from(err)
        })?;

        if !removed {
            warn!("server did not delete the record");
            return Err(MutationError::Server {
                status: None,
                message: format!("record {id} was not deleted"),
            });
        }

        self.store.apply(MirrorMutation::Remove(id.clone()));
        info!("record deleted");
        self.notify_invalidation();
        Ok(())
    }

    fn notify_invalidation(&self) {
        if let Some(target) = &self.invalidation {
            for section in &target.sections {
                target.registry.invalidate(section);
            }
        }
    }
}
