use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::is_blank;
use crate::entity::{Entity, SortValue};
use crate::error::ValidationError;
use crate::ids::RecordId;

/// A product attribute (e.g. "Size") with its allowed values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attribute {
    pub id: RecordId,
    pub name: String,
    #[serde(default)]
    pub values: Vec<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeDraft {
    pub name: String,
    #[serde(default)]
    pub values: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<String>>,
}

impl Entity for Attribute {
    type Draft = AttributeDraft;
    type Patch = AttributePatch;

    const COLLECTION: &'static str = "attributes";

    fn id(&self) -> &RecordId {
        &self.id
    }

    fn validate_draft(draft: &AttributeDraft) -> Result<(), ValidationError> {
        if is_blank(&draft.name) {
            return Err(ValidationError::required("name"));
        }
        if draft.values.iter().any(|v| is_blank(v)) {
            return Err(ValidationError::new("values", "must not contain blank entries"));
        }
        Ok(())
    }

    fn from_draft(id: RecordId, draft: AttributeDraft, now: DateTime<Utc>) -> Self {
        Self {
            id,
            name: draft.name,
            values: draft.values,
            created_at: now,
        }
    }

    fn apply_patch(&mut self, patch: &AttributePatch) {
        if let Some(name) = &patch.name {
            self.name = name.clone();
        }
        if let Some(values) = &patch.values {
            self.values = values.clone();
        }
    }

    fn searchable_text(&self) -> Vec<&str> {
        std::iter::once(self.name.as_str())
            .chain(self.values.iter().map(String::as_str))
            .collect()
    }

    fn sort_value(&self, key: &str) -> SortValue {
        match key {
            "name" => SortValue::Text(self.name.clone()),
            "values" => SortValue::Number(self.values.len() as f64),
            "createdAt" => SortValue::timestamp(&self.created_at),
            _ => SortValue::Missing,
        }
    }
}
