//! # Paged Row Streaming
//!
//! [`PagedRowStreamer`] turns a [`RowSource`] into lazy, memory-bounded
//! streams. Nothing is read until the consumer polls, and each stream owns
//! all of its state: the page cursor lives inside the stream, never in the
//! streamer, so two streams from the same streamer never interfere.
//!
//! ## Access patterns
//!
//! - [`stream_rows`](PagedRowStreamer::stream_rows): one connection, one
//!   unbounded query, one row per poll.
//! - [`stream_pages`](PagedRowStreamer::stream_pages): pages fetched at
//!   offsets `0, p, 2p, ...` until a fetch comes back empty.
//! - [`stream_filtered`](PagedRowStreamer::stream_filtered): paged rows that
//!   satisfy a predicate, in source order.
//! - [`stream_scalar`](PagedRowStreamer::stream_scalar): one column, for
//!   running aggregates.
//!
//! ## Termination
//!
//! A paged stream ends normally only when a fetch returns no rows. A short
//! page is not taken as the end; the next offset is still fetched. For a
//! table of `N` rows and page size `p`, a stream driven to completion makes
//! exactly `ceil(N / p) + 1` fetches.
//!
//! Source failures are yielded as a single `Err` item, after which the
//! stream ends. Rows already yielded are unaffected.
//!
//! ## Example
//!
//! ```rust
//! use futures::TryStreamExt;
//! use rowweave::{PagedRowStreamer, UserRow, VecSource};
//!
//! # tokio_test::block_on(async {
//! let source = VecSource::new(vec![
//!   UserRow::new("1", "Ada", "ada@example.com", 20.0),
//!   UserRow::new("2", "Grace", "grace@example.com", 30.0),
//! ]);
//! let streamer = PagedRowStreamer::new(source);
//!
//! let older: Vec<UserRow> = streamer.stream_older_than(1, 25.0).try_collect().await?;
//! assert_eq!(older.len(), 1);
//! # Ok::<(), rowweave::StreamError>(())
//! # }).unwrap();
//! ```

use crate::config::StreamerConfig;
use crate::cursor::PageCursor;
use crate::error::{Result, StreamError};
use crate::row::{Batch, Column, Page, UserRow};
use crate::source::RowSource;
use async_stream::try_stream;
use futures::{Stream, StreamExt};
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use tracing::{debug, error};

/// Owned, boxed stream of fallible items produced by a streamer.
pub type RowStream<T> = Pin<Box<dyn Stream<Item = Result<T>> + Send>>;

/// Counters shared by every stream a streamer hands out.
#[derive(Debug, Default)]
pub struct StreamStats {
  fetches: AtomicU64,
  rows_fetched: AtomicU64,
  peak_buffered: AtomicUsize,
}

impl StreamStats {
  fn record_fetch(&self, rows: usize) {
    self.fetches.fetch_add(1, Ordering::Relaxed);
    self.record_rows(rows);
  }

  fn record_rows(&self, rows: usize) {
    self.rows_fetched.fetch_add(rows as u64, Ordering::Relaxed);
    self.peak_buffered.fetch_max(rows, Ordering::Relaxed);
  }

  /// Returns a copy of the current counters.
  pub fn snapshot(&self) -> StreamStatsSnapshot {
    StreamStatsSnapshot {
      fetches: self.fetches.load(Ordering::Relaxed),
      rows_fetched: self.rows_fetched.load(Ordering::Relaxed),
      peak_buffered: self.peak_buffered.load(Ordering::Relaxed),
    }
  }
}

/// Point-in-time view of [`StreamStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamStatsSnapshot {
  /// Page fetches issued, including the empty terminating fetch.
  pub fetches: u64,
  /// Rows read from the source.
  pub rows_fetched: u64,
  /// Largest number of rows held by the producer at one time.
  pub peak_buffered: usize,
}

/// Produces lazy row, page and scalar streams from a [`RowSource`].
#[derive(Debug)]
pub struct PagedRowStreamer<S> {
  source: Arc<S>,
  config: StreamerConfig,
  stats: Arc<StreamStats>,
}

impl<S> Clone for PagedRowStreamer<S> {
  fn clone(&self) -> Self {
    Self {
      source: Arc::clone(&self.source),
      config: self.config.clone(),
      stats: Arc::clone(&self.stats),
    }
  }
}

impl<S: RowSource> PagedRowStreamer<S> {
  /// Creates a streamer over `source` with default configuration.
  pub fn new(source: S) -> Self {
    Self::from_arc(Arc::new(source))
  }

  /// Creates a streamer over a shared source.
  pub fn from_arc(source: Arc<S>) -> Self {
    Self {
      source,
      config: StreamerConfig::default(),
      stats: Arc::new(StreamStats::default()),
    }
  }

  /// Replaces the streamer configuration.
  #[must_use]
  pub fn with_config(mut self, config: StreamerConfig) -> Self {
    self.config = config;
    self
  }

  /// Sets the name used in logs.
  #[must_use]
  pub fn with_name(mut self, name: impl Into<String>) -> Self {
    self.config = self.config.with_name(name);
    self
  }

  /// Sets the default page size.
  #[must_use]
  pub fn with_page_size(mut self, page_size: usize) -> Self {
    self.config = self.config.with_page_size(page_size);
    self
  }

  /// Returns the streamer configuration.
  pub fn config(&self) -> &StreamerConfig {
    &self.config
  }

  /// Returns the underlying source.
  pub fn source(&self) -> &Arc<S> {
    &self.source
  }

  /// Returns the counters accumulated across all streams so far.
  pub fn stats(&self) -> StreamStatsSnapshot {
    self.stats.snapshot()
  }

  fn component_name(&self) -> String {
    self
      .config
      .name()
      .unwrap_or_else(|| self.source.name())
      .to_string()
  }

  /// Streams every row of the source over a single connection.
  ///
  /// Each call is a fresh pass on a fresh connection. The connection is held
  /// while the stream is alive and released when it is exhausted, fails, or
  /// is dropped.
  pub fn stream_rows(&self) -> RowStream<UserRow> {
    let source = Arc::clone(&self.source);
    let stats = Arc::clone(&self.stats);
    let component = self.component_name();

    Box::pin(try_stream! {
      debug!(component = %component, "starting row scan");
      let mut rows = source.scan_rows();
      while let Some(row) = rows.next().await {
        let row = row.map_err(|e| aborted(&component, e))?;
        stats.record_rows(1);
        yield row;
      }
      debug!(component = %component, "row scan exhausted");
    })
  }

  /// Streams pages of at most `page_size` rows.
  ///
  /// Offsets start at zero and advance by `page_size` after every page. The
  /// stream ends when a fetch returns no rows. A `page_size` of zero yields
  /// [`StreamError::InvalidPageSize`].
  pub fn stream_pages(&self, page_size: usize) -> RowStream<Page> {
    let source = Arc::clone(&self.source);
    let stats = Arc::clone(&self.stats);
    let component = self.component_name();

    Box::pin(try_stream! {
      let mut cursor = PageCursor::new(page_size).map_err(|e| aborted(&component, e))?;
      loop {
        let offset = cursor.offset();
        debug!(component = %component, offset, page_size, "fetching page");
        let rows = source
          .fetch_page(page_size, offset)
          .await
          .map_err(|e| aborted(&component, e))?;
        stats.record_fetch(rows.len());
        if rows.is_empty() {
          debug!(component = %component, offset, "empty page, source exhausted");
          break;
        }
        yield Page::new(offset, rows);
        cursor.advance().map_err(|e| aborted(&component, e))?;
      }
    })
  }

  /// Streams batches of at most `batch_size` rows. Same as [`stream_pages`](Self::stream_pages).
  pub fn stream_batches(&self, batch_size: usize) -> RowStream<Batch> {
    self.stream_pages(batch_size)
  }

  /// Streams pages using the configured default page size.
  pub fn stream_default_pages(&self) -> RowStream<Page> {
    self.stream_pages(self.config.page_size())
  }

  /// Streams the rows that satisfy `predicate`, reading the source page by page.
  ///
  /// Source order is preserved within and across pages, and at most one page
  /// is held at a time.
  pub fn stream_filtered<P>(&self, page_size: usize, predicate: P) -> RowStream<UserRow>
  where
    P: Fn(&UserRow) -> bool + Send + Sync + 'static,
  {
    let mut pages = self.stream_pages(page_size);

    Box::pin(try_stream! {
      while let Some(page) = pages.next().await {
        for row in page? {
          if predicate(&row) {
            yield row;
          }
        }
      }
    })
  }

  /// Streams the rows whose age is strictly greater than `threshold`.
  pub fn stream_older_than(&self, page_size: usize, threshold: f64) -> RowStream<UserRow> {
    self.stream_filtered(page_size, move |row| row.is_older_than(threshold))
  }

  /// Streams a single column of every row as floating point values.
  ///
  /// Meant for running aggregates such as [`average`](crate::consumers::average):
  /// the consumer keeps a running sum and count instead of collecting.
  pub fn stream_scalar(&self, column: Column) -> RowStream<f64> {
    let source = Arc::clone(&self.source);
    let stats = Arc::clone(&self.stats);
    let component = self.component_name();

    Box::pin(try_stream! {
      debug!(component = %component, column = %column, "starting column scan");
      let mut values = source.scan_column(column);
      while let Some(value) = values.next().await {
        let value = value.map_err(|e| aborted(&component, e))?;
        stats.record_rows(1);
        yield value;
      }
    })
  }
}

fn aborted(component: &str, error: StreamError) -> StreamError {
  error!(component = %component, error = %error, "stream aborted");
  error
}
