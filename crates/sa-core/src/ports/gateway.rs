use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::errors::GatewayError;
use crate::entity::Entity;
use crate::ids::RecordId;

/// Options for `get_all`.
///
/// The default query asks for the whole collection. `page`/`limit`/`search`
/// select the server-side pagination contract instead.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub search: Option<String>,
}

impl ListQuery {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn page(page: u32, limit: u32) -> Self {
        Self {
            page: Some(page),
            limit: Some(limit),
            search: None,
        }
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        let search = search.into();
        self.search = (!search.trim().is_empty()).then_some(search);
        self
    }

    pub fn is_paginated(&self) -> bool {
        self.page.is_some() || self.limit.is_some()
    }
}

/// Pagination block returned by servers that paginate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub total_pages: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListResponse<T> {
    pub data: Vec<T>,
    pub pagination: Option<Pagination>,
}

impl<T> ListResponse<T> {
    pub fn unpaginated(data: Vec<T>) -> Self {
        Self {
            data,
            pagination: None,
        }
    }
}

/// Persistence of one remote collection.
///
/// Implementations own the records: ids and timestamps are assigned by the
/// server, and `update` returns the merged record as stored.
#[async_trait]
pub trait RemoteGatewayPort<T: Entity>: Send + Sync {
    async fn get_all(&self, query: &ListQuery) -> Result<ListResponse<T>, GatewayError>;

    async fn create(&self, draft: &T::Draft) -> Result<T, GatewayError>;

    async fn update(&self, id: &RecordId, patch: &T::Patch) -> Result<T, GatewayError>;

    /// Returns `false` when the server acknowledged the call but did not
    /// delete anything.
    async fn remove(&self, id: &RecordId) -> Result<bool, GatewayError>;
}
