//! # Pagination
//!
//! Offset/limit paging shared by every query surface.

use serde::{Deserialize, Serialize};

use crate::errors::ParseError;

pub const DEFAULT_LIMIT: usize = 10;
pub const MAX_LIMIT: usize = 100;

/// Requested window over a filtered, sorted result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Pagination {
    pub offset: usize,
    pub limit: usize,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl Pagination {
    pub fn new(offset: usize, limit: usize) -> Self {
        Self { offset, limit }
    }

    /// Reject limits outside `1..=MAX_LIMIT`.
    pub fn validate(&self) -> Result<(), ParseError> {
        if self.limit == 0 || self.limit > MAX_LIMIT {
            return Err(ParseError::InvalidLimit {
                limit: self.limit,
                max: MAX_LIMIT,
            });
        }
        Ok(())
    }

    /// Cut the window out of `items`, reporting the pre-pagination total.
    pub fn apply<T>(&self, items: Vec<T>) -> Page<T> {
        let total = items.len();
        let data: Vec<T> = items.into_iter().skip(self.offset).take(self.limit).collect();
        Page {
            meta: PageMeta {
                count: data.len(),
                offset: self.offset,
                total,
            },
            data,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMeta {
    pub count: usize,
    pub offset: usize,
    pub total: usize,
}

/// One page of results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub meta: PageMeta,
}
