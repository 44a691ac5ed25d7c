//! Derived view: the filtered, sorted and paginated projection of a mirror.
//!
//! Everything here is a pure function of `(snapshot, descriptor)`. The view
//! is recomputed from the full snapshot on every call and never patched
//! incrementally, so it cannot drift from the mirror it was computed from.

mod descriptor;
mod paginate;

pub use descriptor::{FilterSortDescriptor, SortDirection};
pub use paginate::{paginate, Page};

use crate::entity::Entity;

/// Computes the exact sequence of records to render.
///
/// 1. Trimmed, non-empty `search_text` keeps records with a case-insensitive
///    substring match in any searchable field.
/// 2. A set `sort_key` stable-sorts by [`Entity::sort_value`]; `Desc`
///    reverses the comparator, so equal keys keep their mirror order.
pub fn derive_view<T: Entity>(records: &[T], descriptor: &FilterSortDescriptor) -> Vec<T> {
    let needle = descriptor.normalized_search();

    let mut visible: Vec<T> = records
        .iter()
        .filter(|record| match &needle {
            Some(needle) => matches_search(*record, needle),
            None => true,
        })
        .cloned()
        .collect();

    if let Some(key) = descriptor.sort_key.as_deref() {
        let direction = descriptor.sort_direction;
        // slice::sort_by is stable
        visible.sort_by(|a, b| {
            let ordering = a.sort_value(key).compare(&b.sort_value(key));
            direction.apply(ordering)
        });
    }

    visible
}

fn matches_search<T: Entity>(record: &T, needle: &str) -> bool {
    record
        .searchable_text()
        .iter()
        .any(|field| field.to_lowercase().contains(needle))
}
