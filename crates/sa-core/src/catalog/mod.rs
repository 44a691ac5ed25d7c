//! Catalog entities managed by the admin screens.

mod attribute;
mod collection;
mod customer;
mod gallery;
mod role;

pub use attribute::{Attribute, AttributeDraft, AttributePatch};
pub use collection::{Collection, CollectionDraft, CollectionPatch};
pub use customer::{Customer, CustomerDraft, CustomerPatch};
pub use gallery::{GalleryImage, GalleryImageDraft, GalleryImagePatch};
pub use role::{Role, RoleDraft, RolePatch};

use serde::{Deserialize, Deserializer};

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

/// Patch field that can be left out, cleared with `null`, or set. An absent
/// key falls back to `#[serde(default)]`; a present key, `null` included,
/// lands here.
fn clearable<'de, D, V>(deserializer: D) -> Result<Option<Option<V>>, D::Error>
where
    D: Deserializer<'de>,
    V: Deserialize<'de>,
{
    Option::<V>::deserialize(deserializer).map(Some)
}
