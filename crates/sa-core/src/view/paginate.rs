use serde::Serialize;

/// One page of a derived view.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    /// 1-based page number that was requested.
    pub page: usize,
    pub page_size: usize,
    pub total: usize,
    pub total_pages: usize,
}

/// Slices `records` into a 1-based page.
///
/// A `page_size` of 0 means "everything on one page". Pages past the end
/// (and page 0) are empty rather than an error.
pub fn paginate<T: Clone>(records: &[T], page: usize, page_size: usize) -> Page<T> {
    let total = records.len();
    if page_size == 0 {
        return Page {
            items: records.to_vec(),
            page,
            page_size,
            total,
            total_pages: usize::from(total > 0),
        };
    }

    let total_pages = total.div_ceil(page_size);
    let items = match page.checked_sub(1) {
        Some(index) => records
            .iter()
            .skip(index.saturating_mul(page_size))
            .take(page_size)
            .cloned()
            .collect(),
        None => Vec::new(),
    };

    Page {
        items,
        page,
        page_size,
        total,
        total_pages,
    }
}
