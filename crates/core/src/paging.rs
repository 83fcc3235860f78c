//! Paged request/response shapes shared by the backend traits and the API.

use serde::{Deserialize, Serialize};

/// Page selection forwarded to the ERP.
///
/// Query strings from clients often omit paging entirely (ERP callers send
/// `0`), so zero values fall back to the defaults.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRequest {
    pub page_number: u32,
    pub page_size: u32,
}

impl PageRequest {
    pub const DEFAULT_PAGE_SIZE: u32 = 10;
    pub const MAX_PAGE_SIZE: u32 = 500;

    pub fn new(page_number: u32, page_size: u32) -> Self {
        Self {
            page_number: if page_number == 0 { 1 } else { page_number },
            page_size: match page_size {
                0 => Self::DEFAULT_PAGE_SIZE,
                n => n.min(Self::MAX_PAGE_SIZE),
            },
        }
    }

    /// Zero-based offset of the first row of this page.
    pub fn offset(&self) -> usize {
        (self.page_number.saturating_sub(1) as usize) * self.page_size as usize
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(1, Self::DEFAULT_PAGE_SIZE)
    }
}

/// One page of results plus totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PagedList<T> {
    pub items: Vec<T>,
    pub page_number: u32,
    pub page_size: u32,
    pub total_count: u64,
    pub total_pages: u32,
    pub has_previous_page: bool,
    pub has_next_page: bool,
}

impl<T> PagedList<T> {
    pub fn new(items: Vec<T>, page: PageRequest, total_count: u64) -> Self {
        let total_pages = total_count.div_ceil(page.page_size as u64) as u32;
        Self {
            items,
            page_number: page.page_number,
            page_size: page.page_size,
            total_count,
            total_pages,
            has_previous_page: page.page_number > 1,
            has_next_page: page.page_number < total_pages,
        }
    }

    /// Slice an already filtered, fully materialized result set.
    pub fn from_slice(all: &[T], page: PageRequest) -> Self
    where
        T: Clone,
    {
        let items = all
            .iter()
            .skip(page.offset())
            .take(page.page_size as usize)
            .cloned()
            .collect();
        Self::new(items, page, all.len() as u64)
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PagedList<U> {
        PagedList {
            items: self.items.into_iter().map(f).collect(),
            page_number: self.page_number,
            page_size: self.page_size,
            total_count: self.total_count,
            total_pages: self.total_pages,
            has_previous_page: self.has_previous_page,
            has_next_page: self.has_next_page,
        }
    }
}
