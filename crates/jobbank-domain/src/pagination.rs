//! Pagination - bounded, metadata-annotated slices of an ordered query
//!
//! ```text
//! count() ──► PageWindow::locate(total, request) ──► fetch(skip, take)
//!                 │
//!                 └── clamps the page into [1, max(total_pages, 1)]
//! ```
//!
//! Asking for a page past the end returns the last page, never an empty
//! "past the end" page.

use core::future::Future;

/// Page sizes offered to the user
pub const PAGE_SIZE_OPTIONS: [u32; 9] = [3, 5, 10, 20, 30, 40, 50, 100, 500];

/// Used when neither the request nor the stored preference names a size
pub const DEFAULT_PAGE_SIZE: u32 = 3;

/// Number of items per page. Always positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageSize(u32);

impl PageSize {
    /// Any positive size
    pub fn new(size: u32) -> Option<Self> {
        (size > 0).then_some(Self(size))
    }

    /// Only sizes from [`PAGE_SIZE_OPTIONS`]
    pub fn listed(size: u32) -> Option<Self> {
        PAGE_SIZE_OPTIONS.contains(&size).then_some(Self(size))
    }

    pub fn value(&self) -> u32 {
        self.0
    }
}

impl Default for PageSize {
    fn default() -> Self {
        Self(DEFAULT_PAGE_SIZE)
    }
}

impl core::fmt::Display for PageSize {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A 1-based page number and a page size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub size: PageSize,
}

impl PageRequest {
    /// `page` defaults to 1 when absent
    pub fn new(page: Option<u32>, size: PageSize) -> Self {
        Self {
            page: page.unwrap_or(1),
            size,
        }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(None, PageSize::default())
    }
}

/// Where a page request lands once the total is known
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    page_index: u32,
    page_size: PageSize,
    total_pages: u32,
}

impl PageWindow {
    pub fn locate(total_count: u64, request: PageRequest) -> Self {
        let size = u64::from(request.size.value());
        let total_pages = u32::try_from(total_count.div_ceil(size)).unwrap_or(u32::MAX);
        let last_page = total_pages.max(1);

        Self {
            page_index: request.page.clamp(1, last_page),
            page_size: request.size,
            total_pages,
        }
    }

    pub fn page_index(&self) -> u32 {
        self.page_index
    }

    pub fn total_pages(&self) -> u32 {
        self.total_pages
    }

    pub fn skip(&self) -> u64 {
        u64::from(self.page_index - 1) * u64::from(self.page_size.value())
    }

    pub fn take(&self) -> u64 {
        u64::from(self.page_size.value())
    }
}

/// One page of items plus the numbers needed to render a pager
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PagedResult<T> {
    items: Vec<T>,
    page_index: u32,
    page_size: PageSize,
    total_count: u64,
    total_pages: u32,
}

impl<T> PagedResult<T> {
    pub fn new(items: Vec<T>, window: PageWindow, total_count: u64) -> Self {
        Self {
            items,
            page_index: window.page_index,
            page_size: window.page_size,
            total_count,
            total_pages: window.total_pages,
        }
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn into_items(self) -> Vec<T> {
        self.items
    }

    pub fn page_index(&self) -> u32 {
        self.page_index
    }

    pub fn page_size(&self) -> PageSize {
        self.page_size
    }

    pub fn total_count(&self) -> u64 {
        self.total_count
    }

    pub fn total_pages(&self) -> u32 {
        self.total_pages
    }

    pub fn has_previous_page(&self) -> bool {
        self.page_index > 1
    }

    pub fn has_next_page(&self) -> bool {
        self.page_index < self.total_pages
    }

    /// Convert the items while keeping the page metadata
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PagedResult<U> {
        PagedResult {
            items: self.items.into_iter().map(f).collect(),
            page_index: self.page_index,
            page_size: self.page_size,
            total_count: self.total_count,
            total_pages: self.total_pages,
        }
    }
}

/// An ordered query that can be counted and sliced
pub trait PageSource {
    type Item;
    type Error;

    fn count(&self) -> impl Future<Output = Result<u64, Self::Error>> + Send;

    fn fetch(
        &self,
        skip: u64,
        take: u64,
    ) -> impl Future<Output = Result<Vec<Self::Item>, Self::Error>> + Send;
}

/// Count, clamp, then slice.
pub async fn paginate<S>(source: &S, request: PageRequest) -> Result<PagedResult<S::Item>, S::Error>
where
    S: PageSource + Sync,
{
    let total_count = source.count().await?;
    let window = PageWindow::locate(total_count, request);
    let items = source.fetch(window.skip(), window.take()).await?;

    Ok(PagedResult::new(items, window, total_count))
}
