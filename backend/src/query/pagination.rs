//! Pagination
//!
//! Page/limit requests, their configured defaults, and paged results.

use serde::{Deserialize, Serialize};

/// Default page number when a request omits it
pub const DEFAULT_PAGE: u32 = 1;

/// Default page size when a request omits it
pub const DEFAULT_LIMIT: u32 = 10;

/// Largest page size a request may ask for
pub const MAX_LIMIT: u32 = 100;

/// Configured pagination defaults
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationDefaults {
    /// Page used when the request has none
    pub page: u32,
    /// Page size used when the request has none
    pub limit: u32,
    /// Upper bound on the page size
    pub max_limit: u32,
}

impl Default for PaginationDefaults {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
            max_limit: MAX_LIMIT,
        }
    }
}

/// Requested page, both fields optional
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    /// 1-based page number
    pub page: Option<u32>,
    /// Page size
    pub limit: Option<u32>,
}

impl Pagination {
    /// Explicit page and limit
    pub fn new(page: u32, limit: u32) -> Self {
        Self {
            page: Some(page),
            limit: Some(limit),
        }
    }

    /// Resolve against the defaults; zero counts as absent
    pub fn resolve(&self, defaults: &PaginationDefaults) -> (u32, u32) {
        let page = self.page.filter(|p| *p > 0).unwrap_or(defaults.page);
        let limit = self
            .limit
            .filter(|l| *l > 0)
            .unwrap_or(defaults.limit)
            .min(defaults.max_limit.max(1));
        (page, limit)
    }
}

/// Rows of paged procedures carry the total match count in every row
pub trait PageRow {
    /// `total_count` projected by the procedure
    fn total_count(&self) -> i64;
}

/// One page of results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    /// Rows on this page
    pub items: Vec<T>,
    /// Rows matching the search across all pages
    pub total_count: i64,
    /// Page number
    pub page: u32,
    /// Page size
    pub limit: u32,
    /// Number of pages
    pub total_pages: u32,
}

impl<T> Page<T> {
    /// Build a page from its rows and the total count
    pub fn new(items: Vec<T>, total_count: i64, page: u32, limit: u32) -> Self {
        let total = total_count.max(0) as u64;
        let total_pages = if limit == 0 {
            0
        } else {
            total.div_ceil(u64::from(limit)) as u32
        };
        Self {
            items,
            total_count: total_count.max(0),
            page,
            limit,
            total_pages,
        }
    }

    /// An empty page
    pub fn empty(page: u32, limit: u32) -> Self {
        Self::new(Vec::new(), 0, page, limit)
    }

    /// Transform the items, keeping the paging metadata
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total_count: self.total_count,
            page: self.page,
            limit: self.limit,
            total_pages: self.total_pages,
        }
    }
}

impl<T: PageRow> Page<T> {
    /// Build a page from rows that carry `total_count`
    ///
    /// No rows means a total of 0. Past the first page, go through
    /// `QueryDispatcher::fetch_page`, which asks the count procedure instead.
    pub fn from_rows(items: Vec<T>, page: u32, limit: u32) -> Self {
        let total_count = items.first().map(PageRow::total_count).unwrap_or(0);
        Self::new(items, total_count, page, limit)
    }
}
