//! In-memory row source.
//!
//! [`VecSource`] serves rows from a `Vec` but behaves like a connected
//! source: every call "opens a connection" that is released through a
//! scope guard on every exit path, and every page fetch is counted. Failures
//! can be injected to exercise the error paths of the streamers.

use crate::error::{Result, StreamError};
use crate::row::{Column, UserRow};
use crate::source::RowSource;
use async_stream::try_stream;
use async_trait::async_trait;
use futures::stream::BoxStream;
use scopeguard::ScopeGuard;
use std::sync::atomic::{AtomicUsize, Ordering};

/// A [`RowSource`] over an in-memory table.
#[derive(Debug, Default)]
pub struct VecSource {
  name: String,
  rows: Vec<UserRow>,
  fetches: AtomicUsize,
  open: AtomicUsize,
  opened: AtomicUsize,
  refuse_connections: bool,
  fail_on_fetch: Option<usize>,
  fail_scan_after: Option<usize>,
}

impl VecSource {
  /// Creates a source serving `rows` in order.
  pub fn new(rows: Vec<UserRow>) -> Self {
    Self {
      name: "vec_source".to_string(),
      rows,
      ..Self::default()
    }
  }

  /// Sets the source name.
  #[must_use]
  pub fn with_name(mut self, name: impl Into<String>) -> Self {
    self.name = name.into();
    self
  }

  /// Makes every connection attempt fail.
  #[must_use]
  pub fn refuse_connections(mut self) -> Self {
    self.refuse_connections = true;
    self
  }

  /// Makes the `n`th page fetch (1-based) fail with a query error.
  #[must_use]
  pub fn fail_on_fetch(mut self, n: usize) -> Self {
    self.fail_on_fetch = Some(n);
    self
  }

  /// Makes scans fail with a query error after yielding `n` rows.
  #[must_use]
  pub fn fail_scan_after(mut self, n: usize) -> Self {
    self.fail_scan_after = Some(n);
    self
  }

  /// Rows held by the source.
  pub fn rows(&self) -> &[UserRow] {
    &self.rows
  }

  /// Number of page fetches issued so far, including failed ones.
  pub fn fetch_count(&self) -> usize {
    self.fetches.load(Ordering::SeqCst)
  }

  /// Number of connections currently held.
  pub fn open_connections(&self) -> usize {
    self.open.load(Ordering::SeqCst)
  }

  /// Number of connections opened over the life of the source.
  pub fn connections_opened(&self) -> usize {
    self.opened.load(Ordering::SeqCst)
  }

  fn connect(&self) -> Result<ScopeGuard<&AtomicUsize, fn(&AtomicUsize)>> {
    if self.refuse_connections {
      return Err(StreamError::connect(&self.name, "connection refused"));
    }
    self.open.fetch_add(1, Ordering::SeqCst);
    self.opened.fetch_add(1, Ordering::SeqCst);
    Ok(scopeguard::guard(&self.open, release as fn(&AtomicUsize)))
  }

  fn check_scan(&self, yielded: usize) -> Result<()> {
    if self.fail_scan_after == Some(yielded) {
      return Err(StreamError::query(
        &self.name,
        format!("cursor lost after {yielded} rows"),
      ));
    }
    Ok(())
  }
}

fn release(open: &AtomicUsize) {
  open.fetch_sub(1, Ordering::SeqCst);
}

#[async_trait]
impl RowSource for VecSource {
  fn name(&self) -> &str {
    &self.name
  }

  async fn fetch_page(&self, page_size: usize, offset: u64) -> Result<Vec<UserRow>> {
    let _conn = self.connect()?;
    let fetch = self.fetches.fetch_add(1, Ordering::SeqCst) + 1;
    if self.fail_on_fetch == Some(fetch) {
      return Err(StreamError::query(
        &self.name,
        format!("fetch #{fetch} at offset {offset} failed"),
      ));
    }
    let start = usize::try_from(offset)
      .unwrap_or(usize::MAX)
      .min(self.rows.len());
    let end = start.saturating_add(page_size).min(self.rows.len());
    Ok(self.rows[start..end].to_vec())
  }

  fn scan_rows(&self) -> BoxStream<'_, Result<UserRow>> {
    Box::pin(try_stream! {
      let _conn = self.connect()?;
      for (yielded, row) in self.rows.iter().enumerate() {
        self.check_scan(yielded)?;
        yield row.clone();
      }
    })
  }

  fn scan_column(&self, column: Column) -> BoxStream<'_, Result<f64>> {
    Box::pin(try_stream! {
      let _conn = self.connect()?;
      for (yielded, row) in self.rows.iter().enumerate() {
        self.check_scan(yielded)?;
        let value = row
          .scalar(column)
          .ok_or_else(|| StreamError::decode(column.as_str(), "column is not numeric"))?;
        yield value;
      }
    })
  }
}
