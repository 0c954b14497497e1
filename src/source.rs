//! The paged query interface that streamers read from.
//!
//! A [`RowSource`] is the only thing a [`PagedRowStreamer`](crate::PagedRowStreamer)
//! needs from the storage engine: a bounded read at an offset, and an
//! unbounded read over a single connection. It never needs write access.
//!
//! Implementations must release whatever they acquire for a call (a pooled
//! connection, a cursor) when the call returns or, for the scan methods, when
//! the returned stream ends or is dropped.

use crate::error::Result;
use crate::row::{Column, UserRow};
use async_trait::async_trait;
use futures::stream::BoxStream;

/// Read-only access to one table of user rows.
#[async_trait]
pub trait RowSource: Send + Sync + 'static {
  /// Label used in logs and error messages.
  fn name(&self) -> &str;

  /// Fetches at most `page_size` rows starting at `offset`, in source order.
  ///
  /// An empty result means the offset is past the end of the table.
  async fn fetch_page(&self, page_size: usize, offset: u64) -> Result<Vec<UserRow>>;

  /// Streams every row over one connection held for the life of the stream.
  fn scan_rows(&self) -> BoxStream<'_, Result<UserRow>>;

  /// Streams one column of every row, decoded as floating point.
  fn scan_column(&self, column: Column) -> BoxStream<'_, Result<f64>>;
}
