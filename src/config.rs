//! Source and streamer configuration.
//!
//! [`SourceConfig`] describes how to reach the table: connection URL, table
//! and ordering column, pool sizing and timeouts, and the default page size.
//! It can be built in code with the `with_*` methods, deserialized from JSON,
//! or read from `ROWWEAVE_*` environment variables.
//!
//! [`StreamerConfig`] carries the per-streamer settings: a name used in logs
//! and the page size used when the caller does not pass one.

use crate::error::{Result, StreamError};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Environment variable holding the connection URL.
pub const ENV_DATABASE_URL: &str = "ROWWEAVE_DATABASE_URL";
/// Environment variable holding the table name.
pub const ENV_TABLE: &str = "ROWWEAVE_TABLE";
/// Environment variable holding the default page size.
pub const ENV_PAGE_SIZE: &str = "ROWWEAVE_PAGE_SIZE";

/// Table read when none is configured.
pub const DEFAULT_TABLE: &str = "user_data";
/// Default number of rows per page.
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// Connection and query settings for a SQL row source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
  /// Database connection URL (e.g. `sqlite://users.db?mode=rwc`).
  pub connection_url: String,
  /// Table to read rows from.
  pub table: String,
  /// Column giving the stable order used for offset paging.
  pub order_by: String,
  /// Maximum number of connections in the pool.
  pub max_connections: u32,
  /// Minimum number of idle connections in the pool.
  pub min_connections: u32,
  /// How long to wait when acquiring a connection.
  pub connect_timeout: Duration,
  /// Maximum idle time before closing a connection.
  pub idle_timeout: Option<Duration>,
  /// Maximum lifetime of a connection.
  pub max_lifetime: Option<Duration>,
  /// Rows per page when the caller does not choose.
  pub page_size: usize,
}

impl Default for SourceConfig {
  fn default() -> Self {
    Self {
      connection_url: String::new(),
      table: DEFAULT_TABLE.to_string(),
      order_by: "rowid".to_string(),
      max_connections: 10,
      min_connections: 0,
      connect_timeout: Duration::from_secs(30),
      idle_timeout: Some(Duration::from_secs(600)),
      max_lifetime: Some(Duration::from_secs(1800)),
      page_size: DEFAULT_PAGE_SIZE,
    }
  }
}

impl SourceConfig {
  /// Creates a configuration for `connection_url` with default settings.
  #[must_use]
  pub fn new(connection_url: impl Into<String>) -> Self {
    Self::default().with_connection_url(connection_url)
  }

  /// Sets the connection URL.
  #[must_use]
  pub fn with_connection_url(mut self, url: impl Into<String>) -> Self {
    self.connection_url = url.into();
    self
  }

  /// Sets the table name.
  #[must_use]
  pub fn with_table(mut self, table: impl Into<String>) -> Self {
    self.table = table.into();
    self
  }

  /// Sets the ordering column.
  #[must_use]
  pub fn with_order_by(mut self, column: impl Into<String>) -> Self {
    self.order_by = column.into();
    self
  }

  /// Sets the maximum number of pooled connections.
  #[must_use]
  pub fn with_max_connections(mut self, max: u32) -> Self {
    self.max_connections = max;
    self
  }

  /// Sets the connection acquire timeout.
  #[must_use]
  pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
    self.connect_timeout = timeout;
    self
  }

  /// Sets the default page size.
  #[must_use]
  pub fn with_page_size(mut self, page_size: usize) -> Self {
    self.page_size = page_size;
    self
  }

  /// Parses a configuration from JSON. Missing fields take their defaults.
  pub fn from_json(json: &str) -> Result<Self> {
    serde_json::from_str(json).map_err(|e| StreamError::Config(e.to_string()))
  }

  /// Reads the configuration from `ROWWEAVE_*` environment variables.
  ///
  /// `ROWWEAVE_DATABASE_URL` is required; `ROWWEAVE_TABLE` and
  /// `ROWWEAVE_PAGE_SIZE` fall back to their defaults.
  pub fn from_env() -> Result<Self> {
    Self::from_lookup(|key| std::env::var(key).ok())
  }

  pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
    let url = lookup(ENV_DATABASE_URL)
      .ok_or_else(|| StreamError::Config(format!("{ENV_DATABASE_URL} is not set")))?;
    let mut config = Self::new(url);
    if let Some(table) = lookup(ENV_TABLE) {
      config.table = table;
    }
    if let Some(page_size) = lookup(ENV_PAGE_SIZE) {
      config.page_size = page_size.trim().parse().map_err(|e| {
        StreamError::Config(format!("{ENV_PAGE_SIZE}={page_size:?} is not a page size: {e}"))
      })?;
    }
    Ok(config)
  }

  /// Checks the configuration for values that cannot work.
  pub fn validate(&self) -> Result<()> {
    if self.connection_url.trim().is_empty() {
      return Err(StreamError::Config("connection_url is empty".to_string()));
    }
    if self.page_size == 0 {
      return Err(StreamError::InvalidPageSize(self.page_size));
    }
    if self.max_connections == 0 {
      return Err(StreamError::Config(
        "max_connections must be at least 1".to_string(),
      ));
    }
    if self.min_connections > self.max_connections {
      return Err(StreamError::Config(format!(
        "min_connections ({}) exceeds max_connections ({})",
        self.min_connections, self.max_connections
      )));
    }
    check_identifier(&self.table)?;
    check_identifier(&self.order_by)?;
    Ok(())
  }
}

/// Settings for one [`PagedRowStreamer`](crate::PagedRowStreamer).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamerConfig {
  /// Optional name identifying the streamer in logs.
  pub name: Option<String>,
  /// Page size used by streams that do not take one explicitly.
  pub page_size: usize,
}

impl Default for StreamerConfig {
  fn default() -> Self {
    Self {
      name: None,
      page_size: DEFAULT_PAGE_SIZE,
    }
  }
}

impl StreamerConfig {
  /// Sets the streamer name.
  #[must_use]
  pub fn with_name(mut self, name: impl Into<String>) -> Self {
    self.name = Some(name.into());
    self
  }

  /// Sets the default page size.
  #[must_use]
  pub fn with_page_size(mut self, page_size: usize) -> Self {
    self.page_size = page_size;
    self
  }

  /// Returns the name, if set.
  pub fn name(&self) -> Option<&str> {
    self.name.as_deref()
  }

  /// Returns the default page size.
  pub fn page_size(&self) -> usize {
    self.page_size
  }
}

/// Rejects anything but a plain `[A-Za-z_][A-Za-z0-9_]*` identifier.
pub(crate) fn check_identifier(name: &str) -> Result<()> {
  let mut chars = name.chars();
  let valid = match chars.next() {
    Some(first) => {
      (first.is_ascii_alphabetic() || first == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
    }
    None => false,
  };
  if valid {
    Ok(())
  } else {
    Err(StreamError::InvalidIdentifier(name.to_string()))
  }
}
