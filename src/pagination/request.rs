//! Page requests and pageables

use serde::{Deserialize, Serialize};

use crate::aggregation::SortField;

/// Zero-based page number, page size, and optional sort keys
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    page: usize,
    size: usize,
    #[serde(default)]
    sort: Vec<SortField>,
}

impl PageRequest {
    /// Page `page` of `size` rows, unsorted
    pub fn of(page: usize, size: usize) -> Self {
        Self {
            page,
            size,
            sort: Vec::new(),
        }
    }

    /// Add a sort key
    pub fn sorted(mut self, sort: SortField) -> Self {
        self.sort.push(sort);
        self
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn sort(&self) -> &[SortField] {
        &self.sort
    }

    /// Rows before this page
    pub fn offset(&self) -> usize {
        self.page * self.size
    }

    /// Same size and sort, next page number
    pub fn next(&self) -> Self {
        Self {
            page: self.page + 1,
            size: self.size,
            sort: self.sort.clone(),
        }
    }
}

/// Where the next page comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pageable {
    /// No further page
    Unpaged,
    /// A plain offset page
    Paged(PageRequest),
    /// The next batch of an open cursor
    Cursor { request: PageRequest, cursor_id: i64 },
}

impl Pageable {
    /// True for `Unpaged`
    pub fn is_unpaged(&self) -> bool {
        matches!(self, Pageable::Unpaged)
    }

    /// Page request, unless unpaged
    pub fn request(&self) -> Option<&PageRequest> {
        match self {
            Pageable::Unpaged => None,
            Pageable::Paged(request) | Pageable::Cursor { request, .. } => Some(request),
        }
    }
}

/// Number of pages needed for `total` rows; zero when either is zero
pub fn total_pages(total: u64, size: usize) -> usize {
    if total == 0 || size == 0 {
        return 0;
    }
    let size = size as u64;
    ((total + size - 1) / size) as usize
}
