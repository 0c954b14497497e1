//! # rowweave
//!
//! Lazy, memory-bounded streaming over row-oriented SQL sources.
//!
//! rowweave reads a table without ever holding more than one page of it.
//! A [`PagedRowStreamer`] wraps a [`RowSource`] and hands out async streams
//! that fetch only when polled:
//!
//! - **Row streams** read the whole table over one connection, one row at a time.
//! - **Page streams** fetch `LIMIT p OFFSET n` pages until an empty page comes back.
//! - **Filtered streams** apply a predicate to paged rows without collecting them.
//! - **Scalar streams** read one column for running aggregates.
//!
//! Connections are scoped to the stream that acquired them and are released
//! when the stream is exhausted, fails, or is dropped.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use futures::StreamExt;
//! use rowweave::consumers::average;
//! use rowweave::{Column, PagedRowStreamer, SourceConfig, SqliteSource};
//!
//! # async fn example() -> rowweave::Result<()> {
//! let config = SourceConfig::new("sqlite://users.db").with_page_size(50);
//! let streamer = PagedRowStreamer::new(SqliteSource::new(&config)?).with_page_size(config.page_size);
//!
//! let mut pages = streamer.stream_pages(50);
//! while let Some(page) = pages.next().await {
//!   let page = page?;
//!   println!("{} rows at offset {}", page.len(), page.offset);
//! }
//!
//! let mean_age = average(streamer.stream_scalar(Column::Age)).await?;
//! println!("average age: {mean_age:.2}");
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]

/// Running independent streams concurrently.
pub mod concurrent;
/// Source and streamer configuration.
pub mod config;
/// Stream consumers: running mean and row printing.
pub mod consumers;
/// Page offset cursor.
pub mod cursor;
/// Error types.
pub mod error;
/// Row, column and page types.
pub mod row;
/// Scoped connection and transaction helpers.
pub mod scoped;
/// Table creation and CSV seeding.
pub mod seed;
/// The row source interface.
pub mod source;
/// Built-in row sources.
pub mod sources;
/// Keyed reads and writes.
pub mod store;
/// The paged row streamer.
pub mod streamer;
/// Logging setup.
pub mod telemetry;

pub use concurrent::{ConcurrentFetch, fetch_concurrently};
pub use config::{SourceConfig, StreamerConfig};
pub use cursor::PageCursor;
pub use error::{Result, StreamError};
pub use row::{Batch, Column, Page, UserRow};
pub use source::RowSource;
pub use sources::{SqliteSource, VecSource};
pub use store::UserStore;
pub use streamer::{PagedRowStreamer, RowStream, StreamStats, StreamStatsSnapshot};
