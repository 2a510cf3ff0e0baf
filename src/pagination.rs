//! This modules defines the common functionality for paging data.

use crate::Error;

/// The config for pagination
#[derive(Debug, Clone)]
pub struct PaginationConfig {
    /// The page number to default to when not specified in a request.
    pub default_page: u64,
    /// The maximum transactions to return per page when not specified in a request.
    pub default_page_size: u64,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_page: 1,
            default_page_size: 10,
        }
    }
}

/// A validated, 1-based page of results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    number: u64,
    size: u64,
}

impl Page {
    /// Create a page from optional request values, falling back to `config`.
    ///
    /// # Errors
    /// Returns [Error::InvalidPagination] if the page number or size is zero.
    pub fn new(number: Option<u64>, size: Option<u64>, config: &PaginationConfig) -> Result<Self, Error> {
        let number = number.unwrap_or(config.default_page);
        let size = size.unwrap_or(config.default_page_size);

        if number == 0 || size == 0 {
            return Err(Error::InvalidPagination);
        }

        Ok(Self { number, size })
    }

    /// The maximum number of items on the page.
    pub fn limit(self) -> u64 {
        self.size
    }

    /// The number of items on the pages before this one.
    pub fn offset(self) -> u64 {
        (self.number - 1).saturating_mul(self.size)
    }
}
