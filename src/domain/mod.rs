use serde::{Deserialize, Serialize};

pub mod invoice;
pub mod menu_item;
pub mod money;
pub mod order;
pub mod payment;
pub mod table;

/// Default page size used by list endpoints.
pub const DEFAULT_ITEMS_PER_PAGE: usize = 20;

/// Page selection applied to list queries (1-based `page`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub page: usize,
    pub per_page: usize,
}

impl Pagination {
    /// Number of rows to skip, or `None` when the page lies beyond what a
    /// query can address.
    pub fn offset(&self) -> Option<i64> {
        let rows = (self.page.max(1) - 1).checked_mul(self.per_page)?;
        i64::try_from(rows).ok()
    }

    /// Maximum number of rows to return.
    pub fn limit(&self) -> Option<i64> {
        i64::try_from(self.per_page).ok()
    }
}

/// One page of results together with the paging position.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub total_pages: usize,
    pub total: usize,
}

impl<T> Paginated<T> {
    pub fn new(items: Vec<T>, page: usize, per_page: usize, total: usize) -> Self {
        Self {
            items,
            page,
            total_pages: total.div_ceil(per_page.max(1)),
            total,
        }
    }
}
