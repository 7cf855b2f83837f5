//! Pagination utilities for service layer
//!
//! Provides a simple `Pagination` struct, helpers to normalize inputs, and the
//! page envelope returned by listings.

use serde::Serialize;

/// Pagination parameters
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pagination {
    /// 1-based page index
    pub page: u32,
    /// items per page
    pub per_page: u32,
}

impl Pagination {
    /// Clamp to `1..=max_per_page` and convert to a 0-based page index.
    pub fn normalize(self, max_per_page: u32) -> (u64, u64) {
        let page = if self.page == 0 { 1 } else { self.page };
        let per_page = self.per_page.clamp(1, max_per_page.max(1));
        ((page - 1) as u64, per_page as u64)
    }
}

impl Default for Pagination {
    fn default() -> Self { Self { page: 1, per_page: 5 } }
}

/// Metadata accompanying a page of results.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    pub page: u64,
    pub limit: u64,
    pub total_items: u64,
    pub total_pages: u64,
}

impl PageMeta {
    /// `page_idx` is 0-based; the reported page is 1-based.
    pub fn new(page_idx: u64, limit: u64, total_items: u64) -> Self {
        let total_pages = if limit == 0 { 0 } else { total_items.div_ceil(limit) };
        Self { page: page_idx + 1, limit, total_items, total_pages }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub pagination: PageMeta,
}
