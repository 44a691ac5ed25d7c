use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::is_blank;
use crate::entity::{Entity, SortValue};
use crate::error::ValidationError;
use crate::ids::RecordId;

/// An uploaded media item shown in the gallery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GalleryImage {
    pub id: RecordId,
    #[serde(default)]
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub featured: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GalleryImageDraft {
    #[serde(default)]
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub featured: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GalleryImagePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub featured: Option<bool>,
}

impl Entity for GalleryImage {
    type Draft = GalleryImageDraft;
    type Patch = GalleryImagePatch;

    const COLLECTION: &'static str = "gallery";

    fn id(&self) -> &RecordId {
        &self.id
    }

    fn validate_draft(draft: &GalleryImageDraft) -> Result<(), ValidationError> {
        if is_blank(&draft.url) {
            return Err(ValidationError::required("url"));
        }
        Ok(())
    }

    fn from_draft(id: RecordId, draft: GalleryImageDraft, now: DateTime<Utc>) -> Self {
        Self {
            id,
            title: draft.title,
            url: draft.url,
            featured: draft.featured,
            created_at: now,
        }
    }

    fn apply_patch(&mut self, patch: &GalleryImagePatch) {
        if let Some(title) = &patch.title {
            self.title = title.clone();
        }
        if let Some(featured) = patch.featured {
            self.featured = featured;
        }
    }

    fn searchable_text(&self) -> Vec<&str> {
        vec![self.title.as_str(), self.url.as_str()]
    }

    fn sort_value(&self, key: &str) -> SortValue {
        match key {
            "title" => SortValue::Text(self.title.clone()),
            "featured" => SortValue::Bool(self.featured),
            "createdAt" => SortValue::timestamp(&self.created_at),
            _ => SortValue::Missing,
        }
    }
}
