//! Client-side delete protection.

use std::collections::BTreeSet;

use crate::entity::Entity;
use crate::error::MutationError;

/// Fixed set of reserved names whose records refuse deletion before any
/// gateway call (e.g. the system roles "Admin" and "User").
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeleteProtection {
    protected: BTreeSet<String>,
}

impl DeleteProtection {
    /// Nothing is protected.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            protected: names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_protected(&self, name: &str) -> bool {
        self.protected.contains(name)
    }

    pub fn check<T: Entity>(&self, record: &T) -> Result<(), MutationError> {
        match record.protected_name() {
            Some(name) if self.is_protected(name) => Err(MutationError::Protected {
                name: name.to_string(),
            }),
            _ => Ok(()),
        }
    }
}
