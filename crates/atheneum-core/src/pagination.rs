//! Pagination page-number computation

use serde::{Deserialize, Serialize};

/// The subset of navigation pages that apply to the current page
///
/// Entries are present only when meaningfully distinct: `first`/`last`
/// require more than one page overall and a current page away from that
/// edge; `prev`/`next` require a page in that direction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageNumbers {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prev: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last: Option<u64>,
}

impl PageNumbers {
    /// Compute navigation page numbers for a result window
    ///
    /// `limit` must be positive; callers bounds-check it beforehand.
    pub fn compute(limit: u64, offset: u64, total: u64) -> Self {
        let current = current_page(limit, offset);
        let total_pages = total_pages(limit, total);

        let mut pages = PageNumbers::default();
        if total_pages > 1 && current > 1 {
            pages.first = Some(1);
        }
        if current > 1 {
            pages.prev = Some(current - 1);
        }
        if current < total_pages {
            pages.next = Some(current + 1);
        }
        if total_pages > 1 && current < total_pages {
            pages.last = Some(total_pages);
        }
        pages
    }

    pub fn is_empty(&self) -> bool {
        self.first.is_none() && self.prev.is_none() && self.next.is_none() && self.last.is_none()
    }
}

/// 1-based page number containing `offset`
pub fn current_page(limit: u64, offset: u64) -> u64 {
    (offset / limit) + 1
}

/// Total number of pages needed for `total` rows
pub fn total_pages(limit: u64, total: u64) -> u64 {
    total.div_ceil(limit)
}

/// The offset that lands on 1-based `page`
pub fn offset_for_page(page: u64, limit: u64) -> u64 {
    (page * limit).saturating_sub(limit)
}
