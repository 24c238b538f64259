// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};

use crate::error::{BuildResult, QueryError};

pub const DEFAULT_PAGE_SIZE: u32 = 500;
pub const MAX_PAGE_SIZE: u32 = 10_000;

/// Page sizes offered by the grid's page-size picker
pub const PAGE_SIZE_OPTIONS: &[u32] = &[100, 250, 500, 1000, 5000];

/// A validated, 1-based page request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRequest {
    page: u64,
    page_size: u32,
}

/// LIMIT / OFFSET pair for a page request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub limit: u32,
    pub offset: u64,
}

impl PageRequest {
    pub fn new(page: u64, page_size: u32) -> BuildResult<Self> {
        Self::with_max(page, page_size, MAX_PAGE_SIZE)
    }

    pub fn with_max(page: u64, page_size: u32, max_page_size: u32) -> BuildResult<Self> {
        if page == 0 {
            return Err(QueryError::InvalidPage);
        }
        validate_page_size(page_size, max_page_size)?;
        Ok(Self { page, page_size })
    }

    pub fn first(page_size: u32) -> BuildResult<Self> {
        Self::new(1, page_size)
    }

    pub fn page(&self) -> u64 {
        self.page
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn window(&self) -> PageWindow {
        PageWindow {
            limit: self.page_size,
            offset: (self.page - 1).saturating_mul(self.page_size as u64),
        }
    }

    /// 1-based absolute row number of the `index`-th row on this page
    pub fn row_number(&self, index: usize) -> u64 {
        self.window().offset + index as u64 + 1
    }
}

pub fn validate_page_size(page_size: u32, max_page_size: u32) -> BuildResult<()> {
    if page_size == 0 || page_size > max_page_size {
        return Err(QueryError::InvalidPageSize { max: max_page_size });
    }
    Ok(())
}

/// `ceil(total_rows / page_size)`; zero rows is zero pages.
pub fn total_pages(total_rows: u64, page_size: u32) -> u64 {
    if page_size == 0 {
        return 0;
    }
    total_rows.div_ceil(page_size as u64)
}

/// Checks `page` against a known page count.
pub fn check_page_in_range(page: u64, total_pages: u64) -> BuildResult<()> {
    let max = total_pages.max(1);
    if page == 0 || page > max {
        return Err(QueryError::PageOutOfRange { max });
    }
    Ok(())
}

/// Parses the page-number input box. Anything that is not a positive
/// integer is rejected.
pub fn parse_page_input(input: &str) -> BuildResult<u64> {
    match input.trim().parse::<u64>() {
        Ok(page) if page >= 1 => Ok(page),
        _ => Err(QueryError::InvalidPage),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_offsets() {
        let request = PageRequest::new(3, 500).unwrap();
        assert_eq!(request.window(), PageWindow { limit: 500, offset: 1000 });
        assert_eq!(request.row_number(0), 1001);

        let first = PageRequest::first(DEFAULT_PAGE_SIZE).unwrap();
        assert_eq!(first.window().offset, 0);
    }

    #[test]
    fn rejects_bad_requests() {
        assert_eq!(PageRequest::new(0, 10), Err(QueryError::InvalidPage));
        assert_eq!(
            PageRequest::new(1, 0),
            Err(QueryError::InvalidPageSize { max: MAX_PAGE_SIZE })
        );
        assert_eq!(
            PageRequest::with_max(1, 200, 100),
            Err(QueryError::InvalidPageSize { max: 100 })
        );
    }

    #[test]
    fn total_pages_rounds_up() {
        assert_eq!(total_pages(0, 500), 0);
        assert_eq!(total_pages(1, 500), 1);
        assert_eq!(total_pages(500, 500), 1);
        assert_eq!(total_pages(1234, 500), 3);
        assert_eq!(total_pages(10, 0), 0);
    }

    #[test]
    fn page_range_check() {
        assert!(check_page_in_range(3, 3).is_ok());
        assert_eq!(
            check_page_in_range(4, 3),
            Err(QueryError::PageOutOfRange { max: 3 })
        );
        // an empty table still has page 1
        assert!(check_page_in_range(1, 0).is_ok());
        assert_eq!(
            QueryError::PageOutOfRange { max: 3 }.to_string(),
            "Page must be between 1 and 3"
        );
    }

    #[test]
    fn parses_page_input() {
        assert_eq!(parse_page_input(" 7 "), Ok(7));
        assert_eq!(parse_page_input("0"), Err(QueryError::InvalidPage));
        assert_eq!(parse_page_input("-2"), Err(QueryError::InvalidPage));
        assert_eq!(parse_page_input("abc"), Err(QueryError::InvalidPage));
    }
}
