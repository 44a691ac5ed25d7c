use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{clearable, is_blank};
use crate::entity::{Entity, SortValue};
use crate::error::ValidationError;
use crate::ids::RecordId;

/// A merchandising collection (group of products).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Collection {
    pub id: RecordId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub featured: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionDraft {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub featured: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// `Some(None)` clears the description.
    #[serde(
        default,
        deserialize_with = "clearable",
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub featured: Option<bool>,
}

impl CollectionPatch {
    pub fn featured(featured: bool) -> Self {
        Self {
            featured: Some(featured),
            ..Self::default()
        }
    }
}

impl Entity for Collection {
    type Draft = CollectionDraft;
    type Patch = CollectionPatch;

    const COLLECTION: &'static str = "collections";

    fn id(&self) -> &RecordId {
        &self.id
    }

    fn validate_draft(draft: &CollectionDraft) -> Result<(), ValidationError> {
        if is_blank(&draft.name) {
            return Err(ValidationError::required("name"));
        }
        Ok(())
    }

    fn validate_patch(patch: &CollectionPatch) -> Result<(), ValidationError> {
        match &patch.name {
            Some(name) if is_blank(name) => Err(ValidationError::required("name")),
            _ => Ok(()),
        }
    }

    fn from_draft(id: RecordId, draft: CollectionDraft, now: DateTime<Utc>) -> Self {
        Self {
            id,
            name: draft.name,
            description: draft.description,
            featured: draft.featured,
            created_at: now,
            updated_at: now,
        }
    }

    fn apply_patch(&mut self, patch: &CollectionPatch) {
        if let Some(name) = &patch.name {
            self.name = name.clone();
        }
        if let Some(description) = &patch.description {
            self.description = description.clone();
        }
        if let Some(featured) = patch.featured {
            self.featured = featured;
        }
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }

    fn searchable_text(&self) -> Vec<&str> {
        let mut fields = vec![self.name.as_str()];
        fields.extend(self.description.as_deref());
        fields
    }

    fn sort_value(&self, key: &str) -> SortValue {
        match key {
            "name" => SortValue::Text(self.name.clone()),
            "description" => SortValue::from_optional_text(self.description.as_deref()),
            "featured" => SortValue::Bool(self.featured),
            "createdAt" => SortValue::timestamp(&self.created_at),
            "updatedAt" => SortValue::timestamp(&self.updated_at),
            _ => SortValue::Missing,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summer() -> Collection {
        Collection::from_draft(
            RecordId::from("c1"),
            CollectionDraft {
                name: "Summer".into(),
                description: Some("Beachwear".into()),
                featured: false,
            },
            Utc::now(),
        )
    }

    #[test]
    fn description_can_be_cleared_or_left_alone() {
        let mut collection = summer();
        collection.apply_patch(&CollectionPatch::featured(true));
        assert_eq!(collection.description.as_deref(), Some("Beachwear"));

        collection.apply_patch(&CollectionPatch {
            description: Some(None),
            ..CollectionPatch::default()
        });
        assert_eq!(collection.description, None);
    }

    #[test]
    fn null_description_in_a_patch_means_clear() {
        let clear: CollectionPatch =
            serde_json::from_value(serde_json::json!({ "description": null })).unwrap();
        assert_eq!(clear.description, Some(None));

        let absent: CollectionPatch = serde_json::from_value(serde_json::json!({})).unwrap();
        assert_eq!(absent.description, None);

        assert_eq!(
            serde_json::to_value(&clear).unwrap(),
            serde_json::json!({ "description": null })
        );
    }
}
