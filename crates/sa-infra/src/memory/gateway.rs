use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;
use tracing::debug;

use sa_core::ports::{
    ClockPort, GatewayError, ListQuery, ListResponse, Pagination, RemoteGatewayPort,
};
use sa_core::{paginate, Entity, FilterSortDescriptor, RecordId};

use crate::time::SystemClock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GatewayOp {
    GetAll,
    Create,
    Update,
    Remove,
}

impl GatewayOp {
    const ALL: [GatewayOp; 4] = [Self::GetAll, Self::Create, Self::Update, Self::Remove];

    fn index(self) -> usize {
        match self {
            Self::GetAll => 0,
            Self::Create => 1,
            Self::Update => 2,
            Self::Remove => 3,
        }
    }
}

struct Script {
    failures: HashMap<GatewayOp, VecDeque<GatewayError>>,
    delay: Duration,
}

/// A collection kept in memory and served through [`RemoteGatewayPort`].
///
/// Ids are UUIDs and timestamps come from the injected clock. Calls are
/// counted per operation. Tests can script failures, add latency, or hold
/// every call at a gate until [`InMemoryGateway::release`].
pub struct InMemoryGateway<T: Entity> {
    records: Mutex<Vec<T>>,
    clock: Arc<dyn ClockPort>,
    calls: [AtomicUsize; 4],
    script: Mutex<Script>,
    gate: watch::Sender<bool>,
}

fn lock<V>(mutex: &Mutex<V>) -> MutexGuard<'_, V> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<T: Entity> InMemoryGateway<T> {
    pub fn new(clock: Arc<dyn ClockPort>) -> Self {
        let (gate, _) = watch::channel(true);
        Self {
            records: Mutex::new(Vec::new()),
            clock,
            calls: Default::default(),
            script: Mutex::new(Script {
                failures: HashMap::new(),
                delay: Duration::ZERO,
            }),
            gate,
        }
    }

    pub fn seeded(records: Vec<T>) -> Self {
        let gateway = Self::new(Arc::new(SystemClock));
        *lock(&gateway.records) = records;
        gateway
    }

    pub fn records(&self) -> Vec<T> {
        lock(&self.records).clone()
    }

    pub fn calls(&self, op: GatewayOp) -> usize {
        self.calls[op.index()].load(Ordering::SeqCst)
    }

    pub fn total_calls(&self) -> usize {
        GatewayOp::ALL.iter().map(|op| self.calls(*op)).sum()
    }

    /// The next call of `op` fails with `error`. Queues up when called
    /// repeatedly.
    pub fn fail_next(&self, op: GatewayOp, error: GatewayError) {
        lock(&self.script)
            .failures
            .entry(op)
            .or_default()
            .push_back(error);
    }

    /// Latency added to every call.
    pub fn set_delay(&self, delay: Duration) {
        lock(&self.script).delay = delay;
    }

    /// Calls started from now on wait until [`InMemoryGateway::release`].
    pub fn hold(&self) {
        self.gate.send_replace(false);
    }

    pub fn release(&self) {
        self.gate.send_replace(true);
    }

    async fn enter(&self, op: GatewayOp) -> Result<(), GatewayError> {
        self.calls[op.index()].fetch_add(1, Ordering::SeqCst);

        let mut gate = self.gate.subscribe();
        if gate.wait_for(|open| *open).await.is_err() {
            return Err(GatewayError::Aborted);
        }

        let (delay, failure) = {
            let mut script = lock(&self.script);
            let failure = script
                .failures
                .get_mut(&op)
                .and_then(VecDeque::pop_front);
            (script.delay, failure)
        };
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        match failure {
            Some(error) => {
                debug!(?op, error = %error, "scripted failure");
                Err(error)
            }
            None => Ok(()),
        }
    }

    fn not_found(id: &RecordId) -> GatewayError {
        GatewayError::Server {
            status: Some(404),
            message: format!("{} {id} not found", T::COLLECTION),
        }
    }
}

#[async_trait]
impl<T: Entity> RemoteGatewayPort<T> for InMemoryGateway<T> {
    async fn get_all(&self, query: &ListQuery) -> Result<ListResponse<T>, GatewayError> {
        self.enter(GatewayOp::GetAll).await?;

        let matching = {
            let records = lock(&self.records);
            let descriptor = FilterSortDescriptor::searching(query.search.clone().unwrap_or_default());
            sa_core::derive_view(&records, &descriptor)
        };

        if !query.is_paginated() {
            return Ok(ListResponse::unpaginated(matching));
        }

        let page = query.page.unwrap_or(1);
        let limit = query.limit.unwrap_or(0);
        let sliced = paginate(&matching, page as usize, limit as usize);
        Ok(ListResponse {
            data: sliced.items,
            pagination: Some(Pagination {
                page,
                limit,
                total: sliced.total as u64,
                total_pages: u32::try_from(sliced.total_pages).unwrap_or(u32::MAX),
            }),
        })
    }

    async fn create(&self, draft: &T::Draft) -> Result<T, GatewayError> {
        self.enter(GatewayOp::Create).await?;

        let record = T::from_draft(RecordId::new(), draft.clone(), self.clock.now());
        lock(&self.records).push(record.clone());
        Ok(record)
    }

    async fn update(&self, id: &RecordId, patch: &T::Patch) -> Result<T, GatewayError> {
        self.enter(GatewayOp::Update).await?;

        let mut records = lock(&self.records);
        let record = records
            .iter_mut()
            .find(|record| record.id() == id)
            .ok_or_else(|| Self::not_found(id))?;
        record.apply_patch(patch);
        record.touch(self.clock.now());
        Ok(record.clone())
    }

    async fn remove(&self, id: &RecordId) -> Result<bool, GatewayError> {
        self.enter(GatewayOp::Remove).await?;

        let mut records = lock(&self.records);
        let before = records.len();
        records.retain(|record| record.id() != id);
        Ok(records.len() < before)
    }
}
