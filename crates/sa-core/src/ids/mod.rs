//! ID type wrappers for type safety.

mod id_macro;

use id_macro::impl_id;
use serde::{Deserialize, Serialize};

/// Identifier of a record owned by the remote gateway.
///
/// Server-assigned ids are opaque strings; locally synthesized ids are UUID v4.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

/// Identifier of the signed-in user, as exposed by the auth context.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl_id!(RecordId, UserId);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_id_serializes_as_plain_string() {
        let id = RecordId::from("role-1");
        assert_eq!(serde_json::to_value(&id).unwrap(), serde_json::json!("role-1"));
    }

    #[test]
    fn generated_ids_are_unique() {
        assert_ne!(RecordId::new(), RecordId::new());
    }
}
