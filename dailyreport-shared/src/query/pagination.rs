/// Page metadata for list responses

use serde::{Deserialize, Serialize};

/// Navigation metadata for one page of a result set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub current_page: i64,
    pub items_per_page: i64,
    pub total_items: i64,
    pub total_pages: i64,
    pub has_next_page: bool,
    pub has_prev_page: bool,
    pub next_page: Option<i64>,
    pub prev_page: Option<i64>,
}

/// Computes page metadata
///
/// `total_pages` is `ceil(total / limit)`, so it is 0 for an empty result.
/// A non-positive `limit` is treated as 1.
///
/// # Example
///
/// ```
/// use dailyreport_shared::query::pagination::calculate_pagination;
///
/// let p = calculate_pagination(2, 10, 25);
/// assert_eq!(p.total_pages, 3);
/// assert_eq!(p.next_page, Some(3));
/// assert_eq!(p.prev_page, Some(1));
/// ```
pub fn calculate_pagination(page: i64, limit: i64, total: i64) -> Pagination {
    let limit = limit.max(1);
    let total = total.max(0);
    let total_pages = (total + limit - 1) / limit;
    let has_next_page = page < total_pages;
    let has_prev_page = page > 1;

    Pagination {
        current_page: page,
        items_per_page: limit,
        total_items: total,
        total_pages,
        has_next_page,
        has_prev_page,
        next_page: has_next_page.then_some(page + 1),
        prev_page: has_prev_page.then_some(page - 1),
    }
}

/// One page of a list operation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total_count: i64,
    pub page: i64,
    pub limit: i64,
    pub page_count: i64,
    pub pagination: Pagination,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total_count: i64, page: i64, limit: i64) -> Self {
        let pagination = calculate_pagination(page, limit, total_count);
        Self {
            items,
            total_count,
            page,
            limit,
            page_count: pagination.total_pages,
            pagination,
        }
    }

    /// Converts every item, keeping the metadata
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total_count: self.total_count,
            page: self.page,
            limit: self.limit,
            page_count: self.page_count,
            pagination: self.pagination,
        }
    }
}
