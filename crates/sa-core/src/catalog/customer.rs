use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{clearable, is_blank};
use crate::entity::{Entity, SortValue};
use crate::error::ValidationError;
use crate::ids::RecordId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: RecordId,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerDraft {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(
        default,
        deserialize_with = "clearable",
        skip_serializing_if = "Option::is_none"
    )]
    pub phone: Option<Option<String>>,
}

fn check_email(email: &str) -> Result<(), ValidationError> {
    if is_blank(email) {
        return Err(ValidationError::required("email"));
    }
    if !email.contains('@') {
        return Err(ValidationError::new("email", "must be an email address"));
    }
    Ok(())
}

impl Entity for Customer {
    type Draft = CustomerDraft;
    type Patch = CustomerPatch;

    const COLLECTION: &'static str = "customers";

    fn id(&self) -> &RecordId {
        &self.id
    }

    fn validate_draft(draft: &CustomerDraft) -> Result<(), ValidationError> {
        if is_blank(&draft.name) {
            return Err(ValidationError::required("name"));
        }
        check_email(&draft.email)
    }

    fn validate_patch(patch: &CustomerPatch) -> Result<(), ValidationError> {
        if let Some(name) = &patch.name {
            if is_blank(name) {
                return Err(ValidationError::required("name"));
            }
        }
        match &patch.email {
            Some(email) => check_email(email),
            None => Ok(()),
        }
    }

    fn from_draft(id: RecordId, draft: CustomerDraft, now: DateTime<Utc>) -> Self {
        Self {
            id,
            name: draft.name,
            email: draft.email,
            phone: draft.phone,
            created_at: now,
        }
    }

    fn apply_patch(&mut self, patch: &CustomerPatch) {
        if let Some(name) = &patch.name {
            self.name = name.clone();
        }
        if let Some(email) = &patch.email {
            self.email = email.clone();
        }
        if let Some(phone) = &patch.phone {
            self.phone = phone.clone();
        }
    }

    fn searchable_text(&self) -> Vec<&str> {
        let mut fields = vec![self.name.as_str(), self.email.as_str()];
        fields.extend(self.phone.as_deref());
        fields
    }

    fn sort_value(&self, key: &str) -> SortValue {
        match key {
            "name" => SortValue::Text(self.name.clone()),
            "email" => SortValue::Text(self.email.to_lowercase()),
            "phone" => SortValue::from_optional_text(self.phone.as_deref()),
            "createdAt" => SortValue::timestamp(&self.created_at),
            _ => SortValue::Missing,
        }
    }
}
