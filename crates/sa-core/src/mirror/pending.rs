use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MutationKind {
    Create,
    Update,
    Delete,
}

/// Marker for a mutation whose gateway call has not resolved yet.
///
/// `previous` is the mirror entry before the optimistic write (`None` for
/// creates); it is what a rollback restores.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingMutation<T> {
    pub kind: MutationKind,
    pub previous: Option<T>,
}
