use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::is_blank;
use crate::entity::{Entity, SortValue};
use crate::error::ValidationError;
use crate::ids::RecordId;

/// An admin role and the routes it grants access to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    pub id: RecordId,
    pub title: String,
    #[serde(default)]
    pub routes: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleDraft {
    pub title: String,
    #[serde(default)]
    pub routes: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RolePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub routes: Option<Vec<String>>,
}

impl Entity for Role {
    type Draft = RoleDraft;
    type Patch = RolePatch;

    const COLLECTION: &'static str = "roles";

    fn id(&self) -> &RecordId {
        &self.id
    }

    fn validate_draft(draft: &RoleDraft) -> Result<(), ValidationError> {
        if is_blank(&draft.title) {
            return Err(ValidationError::required("title"));
        }
        Ok(())
    }

    fn validate_patch(patch: &RolePatch) -> Result<(), ValidationError> {
        match &patch.title {
            Some(title) if is_blank(title) => Err(ValidationError::required("title")),
            _ => Ok(()),
        }
    }

    fn from_draft(id: RecordId, draft: RoleDraft, now: DateTime<Utc>) -> Self {
        Self {
            id,
            title: draft.title,
            routes: draft.routes,
            created_at: now,
            updated_at: now,
        }
    }

    fn apply_patch(&mut self, patch: &RolePatch) {
        if let Some(title) = &patch.title {
            self.title = title.clone();
        }
        if let Some(routes) = &patch.routes {
            self.routes = routes.clone();
        }
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }

    fn searchable_text(&self) -> Vec<&str> {
        std::iter::once(self.title.as_str())
            .chain(self.routes.iter().map(String::as_str))
            .collect()
    }

    fn sort_value(&self, key: &str) -> SortValue {
        match key {
            "id" => SortValue::Text(self.id.to_string()),
            "title" => SortValue::Text(self.title.clone()),
            "routes" => SortValue::Number(self.routes.len() as f64),
            "createdAt" => SortValue::timestamp(&self.created_at),
            "updatedAt" => SortValue::timestamp(&self.updated_at),
            _ => SortValue::Missing,
        }
    }

    fn protected_name(&self) -> Option<&str> {
        Some(&self.title)
    }
}
