//! Offset cursor for paged iteration.
//!
//! A [`PageCursor`] is owned by exactly one paged stream. It starts at offset
//! zero and moves forward by exactly one page size per fetched page, so
//! successive pages never overlap and never leave a gap.

use crate::error::{Result, StreamError};
use std::fmt::{self, Display};

/// Position of a paged stream within its source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageCursor {
  page_size: usize,
  offset: u64,
}

impl PageCursor {
  /// Creates a cursor at offset zero.
  ///
  /// # Errors
  ///
  /// Returns [`StreamError::InvalidPageSize`] when `page_size` is zero.
  pub fn new(page_size: usize) -> Result<Self> {
    if page_size == 0 {
      return Err(StreamError::InvalidPageSize(page_size));
    }
    Ok(Self {
      page_size,
      offset: 0,
    })
  }

  /// Creates a cursor that resumes at `offset`.
  pub fn starting_at(page_size: usize, offset: u64) -> Result<Self> {
    let mut cursor = Self::new(page_size)?;
    cursor.offset = offset;
    Ok(cursor)
  }

  /// Offset of the next page to fetch.
  pub fn offset(&self) -> u64 {
    self.offset
  }

  /// Rows requested per fetch.
  pub fn page_size(&self) -> usize {
    self.page_size
  }

  /// Moves past the current page and returns the new offset.
  ///
  /// # Errors
  ///
  /// Returns [`StreamError::OffsetOverflow`] if the offset would not fit in a `u64`.
  pub fn advance(&mut self) -> Result<u64> {
    let next = u64::try_from(self.page_size)
      .ok()
      .and_then(|step| self.offset.checked_add(step))
      .ok_or(StreamError::OffsetOverflow {
        offset: self.offset,
        page_size: self.page_size,
      })?;
    self.offset = next;
    Ok(next)
  }
}

impl Display for PageCursor {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "offset:{} limit:{}", self.offset, self.page_size)
  }
}
