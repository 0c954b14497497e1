//! Running two independent streams at the same time.
//!
//! [`fetch_concurrently`] reads "all rows" and "rows above an age threshold"
//! as two separately scheduled tokio tasks. Each task opens its own
//! connection and owns its own stream state; the tasks share nothing but the
//! read-only source, so no locking is involved.

use crate::error::Result;
use crate::row::UserRow;
use crate::source::RowSource;
use crate::streamer::PagedRowStreamer;
use futures::TryStreamExt;
use tracing::info;

/// Results of [`fetch_concurrently`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConcurrentFetch {
  /// Every row of the source.
  pub all: Vec<UserRow>,
  /// Rows whose age is above the threshold.
  pub older: Vec<UserRow>,
}

/// Collects every row and the rows older than `threshold` in two concurrent tasks.
///
/// The filtered task pages with the streamer's configured page size. Both
/// tasks run to completion before this returns. A stream error from either
/// task, or a task that panicked, is returned.
pub async fn fetch_concurrently<S: RowSource>(
  streamer: &PagedRowStreamer<S>,
  threshold: f64,
) -> Result<ConcurrentFetch> {
  let all = tokio::spawn(streamer.stream_rows().try_collect::<Vec<_>>());
  let older = tokio::spawn(
    streamer
      .stream_older_than(streamer.config().page_size(), threshold)
      .try_collect::<Vec<_>>(),
  );

  let (all, older) = tokio::join!(all, older);
  let fetched = ConcurrentFetch {
    all: all??,
    older: older??,
  };
  info!(
    all = fetched.all.len(),
    older = fetched.older.len(),
    threshold,
    "concurrent fetch finished"
  );
  Ok(fetched)
}
