//! # Error Handling
//!
//! Every fallible operation in rowweave reports a [`StreamError`].
//!
//! Streams never swallow failures: a connection or query error is yielded to
//! the consumer as an `Err` item and the stream ends right after it. Rows
//! that were already yielded stay valid. Running out of data is *not* an
//! error; a paged stream ends normally on the first empty page.
//!
//! ## Taxonomy
//!
//! - **Connect**: the source could not hand out a connection.
//! - **Query**: a statement failed while executing or while reading rows.
//! - **Decode**: a column value could not be converted to the requested type.
//! - Everything else is a caller or configuration mistake (zero page size,
//!   unsafe identifiers, malformed configuration) or ambient I/O.
//!
//! ## Example
//!
//! ```rust
//! use rowweave::StreamError;
//!
//! let error = StreamError::connect("sqlite:user_data", "connection refused");
//! assert!(error.is_connection());
//! assert!(!error.is_query());
//! ```

use thiserror::Error;

/// Boxed error used as the underlying cause of source failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result alias used throughout the crate.
pub type Result<T, E = StreamError> = std::result::Result<T, E>;

/// Error raised while streaming rows from a source.
#[derive(Debug, Error)]
pub enum StreamError {
  /// A connection to the source could not be established or acquired.
  #[error("connection to {component} failed: {source}")]
  Connect {
    /// Source that failed to connect.
    component: String,
    /// Underlying driver error.
    #[source]
    source: BoxError,
  },
  /// A query failed while executing or while reading its results.
  #[error("query on {component} failed: {source}")]
  Query {
    /// Source that ran the query.
    component: String,
    /// Underlying driver error.
    #[source]
    source: BoxError,
  },
  /// A column value could not be decoded.
  #[error("failed to decode column `{column}`: {source}")]
  Decode {
    /// Column that failed to decode.
    column: String,
    /// Underlying decode error.
    #[source]
    source: BoxError,
  },
  /// Paged iteration was requested with a page size of zero.
  #[error("page size must be a positive integer, got {0}")]
  InvalidPageSize(usize),
  /// Advancing the page cursor would overflow the offset.
  #[error("page offset overflowed advancing from {offset} by {page_size}")]
  OffsetOverflow {
    /// Offset the cursor was at.
    offset: u64,
    /// Page size it tried to advance by.
    page_size: usize,
  },
  /// A table or column name is not a plain SQL identifier.
  #[error("`{0}` is not a valid SQL identifier")]
  InvalidIdentifier(String),
  /// Configuration could not be loaded or failed validation.
  #[error("configuration error: {0}")]
  Config(String),
  /// CSV input could not be read or parsed.
  #[error("csv error: {0}")]
  Csv(#[from] csv::Error),
  /// Writing output failed.
  #[error("io error: {0}")]
  Io(#[from] std::io::Error),
  /// A spawned streaming task panicked or was cancelled.
  #[error("stream task failed: {0}")]
  Task(#[from] tokio::task::JoinError),
}

impl StreamError {
  /// Creates a [`StreamError::Connect`] for `component`.
  pub fn connect(component: impl Into<String>, source: impl Into<BoxError>) -> Self {
    Self::Connect {
      component: component.into(),
      source: source.into(),
    }
  }

  /// Creates a [`StreamError::Query`] for `component`.
  pub fn query(component: impl Into<String>, source: impl Into<BoxError>) -> Self {
    Self::Query {
      component: component.into(),
      source: source.into(),
    }
  }

  /// Creates a [`StreamError::Decode`] for `column`.
  pub fn decode(column: impl Into<String>, source: impl Into<BoxError>) -> Self {
    Self::Decode {
      column: column.into(),
      source: source.into(),
    }
  }

  /// Returns true for connection-establishment failures.
  pub fn is_connection(&self) -> bool {
    matches!(self, Self::Connect { .. })
  }

  /// Returns true for query-execution and decode failures.
  pub fn is_query(&self) -> bool {
    matches!(self, Self::Query { .. } | Self::Decode { .. })
  }
}
