//! Consistency properties of the mirror and the optimistic mutator,
//! exercised against the in-memory gateway.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Notify;

use sa_app::{MirrorStore, OptimisticMutator};
use sa_core::catalog::{Collection, CollectionDraft, CollectionPatch, Role, RoleDraft};
use sa_core::ports::{AuthStatus, GatewayError, ListQuery, ListResponse, RemoteGatewayPort};
use sa_core::{DeleteProtection, Entity, RecordId, FetchError, LoadState, MutationError, MutationKind};
use sa_infra::{GatewayOp, InMemoryGateway, StaticAuthContext, SystemClock};

const TIMEOUT: Duration = Duration::from_secs(5);

fn signed_out() -> Arc<StaticAuthContext> {
    Arc::new(StaticAuthContext::anonymous())
}

async fn collections(names: &[&str]) -> (Arc<InMemoryGateway<Collection>>, Arc<MirrorStore<Collection>>) {
    let gateway = Arc::new(InMemoryGateway::<Collection>::new(Arc::new(SystemClock)));
    for name in names {
        gateway
            .create(&CollectionDraft {
                name: name.to_string(),
                description: None,
                featured: false,
            })
            .await
            .unwrap();
    }
    let store = Arc::new(MirrorStore::new(gateway.clone(), signed_out(), TIMEOUT));
    store.load().await.unwrap();
    (gateway, store)
}

#[tokio::test]
async fn failed_update_restores_the_entry_field_for_field() {
    let (gateway, store) = collections(&["Summer", "Winter"]).await;
    let mutator = Arc::new(OptimisticMutator::new(store.clone()));
    let before = store.snapshot();
    let target = before[1].id.clone();

    gateway.hold();
    gateway.fail_next(GatewayOp::Update, GatewayError::Network("connection reset".into()));
    let update = tokio::spawn({
        let mutator = Arc::clone(&mutator);
        let target = target.clone();
        async move {
            mutator
                .update_record(&target, CollectionPatch::featured(true))
                .await
        }
    });
    tokio::task::yield_now().await;

    // Optimistic value visible while the call is outstanding.
    assert!(store.get(&target).unwrap().featured);
    assert_eq!(store.pending(&target), Some(MutationKind::Update));

    gateway.release();
    let err = update.await.unwrap().unwrap_err();

    assert_eq!(err, MutationError::Network("connection reset".into()));
    assert_eq!(store.snapshot(), before);
    assert!(!store.has_pending());
}

#[tokio::test]
async fn successful_update_keeps_server_timestamps() {
    let (_gateway, store) = collections(&["Summer"]).await;
    let mutator = OptimisticMutator::new(store.clone());
    let original = store.snapshot().remove(0);

    let updated = mutator
        .update_record(original.id(), CollectionPatch::featured(true))
        .await
        .unwrap();

    assert!(updated.featured);
    assert!(updated.updated_at >= original.updated_at);
    assert_eq!(store.get(original.id()), Some(updated));
}

#[tokio::test]
async fn concurrent_loads_share_one_fetch() {
    let (gateway, store) = collections(&["Summer"]).await;
    let before = gateway.calls(GatewayOp::GetAll);

    gateway.hold();
    let release = async {
        tokio::task::yield_now().await;
        assert!(store.load_state().is_loading());
        gateway.release();
    };
    let (first, second, ()) = tokio::join!(store.load(), store.load(), release);

    assert_eq!(gateway.calls(GatewayOp::GetAll) - before, 1);
    assert_eq!(first.unwrap(), second.unwrap());
    assert_eq!(store.load_state(), LoadState::Loaded);
}

#[tokio::test]
async fn full_load_does_not_join_a_page_load() {
    let (gateway, store) = collections(&["Summer", "Winter", "Sale"]).await;
    let before = gateway.calls(GatewayOp::GetAll);

    gateway.hold();
    let release = async {
        tokio::task::yield_now().await;
        gateway.release();
    };
    let (page, full, ()) = tokio::join!(
        store.load_page(ListQuery::page(1, 1)),
        store.load(),
        release
    );

    assert_eq!(page.unwrap().len(), 1);
    assert_eq!(full.unwrap().len(), 3);
    assert_eq!(gateway.calls(GatewayOp::GetAll) - before, 2);
    assert_eq!(store.len(), 3);
    assert_eq!(store.pagination(), None);
}

#[tokio::test]
async fn failed_load_keeps_stale_contents() {
    let (gateway, store) = collections(&["Summer", "Winter"]).await;
    let before = store.snapshot();

    gateway.fail_next(
        GatewayOp::GetAll,
        GatewayError::Server {
            status: Some(500),
            message: "boom".into(),
        },
    );
    let err = store.load().await.unwrap_err();

    assert!(matches!(err, FetchError::Server { status: Some(500), .. }));
    assert_eq!(store.snapshot(), before);
    assert!(matches!(store.load_state(), LoadState::Failed(_)));
}

#[tokio::test]
async fn load_waits_for_auth_to_resolve() {
    let gateway = Arc::new(InMemoryGateway::<Collection>::new(Arc::new(SystemClock)));
    let store = MirrorStore::new(
        gateway.clone(),
        Arc::new(StaticAuthContext::new(AuthStatus::Loading)),
        TIMEOUT,
    );

    assert_eq!(store.load().await.unwrap_err(), FetchError::AuthNotReady);
    assert_eq!(gateway.total_calls(), 0);
}

#[tokio::test]
async fn delete_removes_only_after_confirmation() {
    let (gateway, store) = collections(&["Summer", "Winter"]).await;
    let mutator = Arc::new(OptimisticMutator::new(store.clone()));
    let target = store.snapshot()[0].id.clone();

    gateway.hold();
    let delete = tokio::spawn({
        let mutator = Arc::clone(&mutator);
        let target = target.clone();
        async move { mutator.delete_record(&target).await }
    });
    tokio::task::yield_now().await;

    assert!(store.contains(&target));
    assert_eq!(store.pending(&target), Some(MutationKind::Delete));

    gateway.release();
    delete.await.unwrap().unwrap();

    assert!(!store.contains(&target));
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn failed_delete_leaves_the_mirror_untouched() {
    let (gateway, store) = collections(&["Summer"]).await;
    let mutator = OptimisticMutator::new(store.clone());
    let before = store.snapshot();

    gateway.fail_next(GatewayOp::Remove, GatewayError::Timeout { after_ms: 5000 });
    let err = mutator.delete_record(before[0].id()).await.unwrap_err();

    assert_eq!(err, MutationError::Timeout { after_ms: 5000 });
    assert_eq!(store.snapshot(), before);
}

#[tokio::test]
async fn protected_roles_are_refused_without_gateway_calls() {
    let gateway = Arc::new(InMemoryGateway::<Role>::new(Arc::new(SystemClock)));
    for title in ["Admin", "Editor"] {
        gateway
            .create(&RoleDraft {
                title: title.to_string(),
                routes: Vec::new(),
            })
            .await
            .unwrap();
    }
    let store = Arc::new(MirrorStore::new(gateway.clone(), signed_out(), TIMEOUT));
    store.load().await.unwrap();
    let mutator = OptimisticMutator::new(store.clone())
        .with_protection(DeleteProtection::from_names(["Admin", "User"]));
    let calls_before = gateway.total_calls();
    let admin = store
        .snapshot()
        .into_iter()
        .find(|role| role.title == "Admin")
        .unwrap();

    let err = mutator.delete_record(&admin.id).await.unwrap_err();

    assert_eq!(
        err,
        MutationError::Protected {
            name: "Admin".into()
        }
    );
    assert_eq!(gateway.total_calls(), calls_before);
    assert!(store.contains(&admin.id));
}

#[tokio::test]
async fn invalid_draft_never_reaches_the_gateway() {
    let (gateway, store) = collections(&[]).await;
    let mutator = OptimisticMutator::new(store.clone());

    let err = mutator
        .create_record(CollectionDraft {
            name: "   ".into(),
            description: None,
            featured: false,
        })
        .await
        .unwrap_err();

    assert!(matches!(err, MutationError::Validation(_)));
    assert_eq!(gateway.calls(GatewayOp::Create), 0);
    assert!(store.is_empty());
}

/// Holds updates until `open` is notified; every other call goes straight
/// through.
struct UpdateGate {
    inner: Arc<InMemoryGateway<Collection>>,
    open: Notify,
}

#[async_trait]
impl RemoteGatewayPort<Collection> for UpdateGate {
    async fn get_all(&self, query: &ListQuery) -> Result<ListResponse<Collection>, GatewayError> {
        self.inner.get_all(query).await
    }

    async fn create(&self, draft: &CollectionDraft) -> Result<Collection, GatewayError> {
        self.inner.create(draft).await
    }

    async fn update(&self, id: &RecordId, patch: &CollectionPatch) -> Result<Collection, GatewayError> {
        self.open.notified().await;
        self.inner.update(id, patch).await
    }

    async fn remove(&self, id: &RecordId) -> Result<bool, GatewayError> {
        self.inner.remove(id).await
    }
}

#[tokio::test]
async fn failed_update_does_not_bring_back_a_deleted_record() {
    let inner = Arc::new(InMemoryGateway::<Collection>::new(Arc::new(SystemClock)));
    for name in ["Summer", "Winter"] {
        inner
            .create(&CollectionDraft {
                name: name.to_string(),
                description: None,
                featured: false,
            })
            .await
            .unwrap();
    }
    let gateway = Arc::new(UpdateGate {
        inner,
        open: Notify::new(),
    });
    let store = Arc::new(MirrorStore::new(gateway.clone(), signed_out(), TIMEOUT));
    store.load().await.unwrap();
    let mutator = Arc::new(OptimisticMutator::new(store.clone()));
    let target = store.snapshot()[0].id.clone();

    let update = tokio::spawn({
        let mutator = Arc::clone(&mutator);
        let target = target.clone();
        async move {
            mutator
                .update_record(&target, CollectionPatch::featured(true))
                .await
        }
    });
    tokio::task::yield_now().await;
    assert!(store.get(&target).unwrap().featured);

    mutator.delete_record(&target).await.unwrap();
    assert!(!store.contains(&target));

    gateway.open.notify_one();
    let err = update.await.unwrap().unwrap_err();

    assert!(matches!(err, MutationError::Server { status: Some(404), .. }));
    assert!(!store.contains(&target));
    assert_eq!(store.len(), 1);
    assert!(!store.has_pending());
}
