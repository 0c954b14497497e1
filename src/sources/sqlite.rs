//! SQLite row source.
//!
//! [`SqliteSource`] reads the user table through a lazily connected `sqlx`
//! pool. Nothing touches the database until the first fetch, so connection
//! failures surface on first demand as [`StreamError::Connect`].
//!
//! - `fetch_page` borrows one pooled connection for a single
//!   `LIMIT ? OFFSET ?` query and hands it back before returning.
//! - `scan_rows` / `scan_column` hold one connection for as long as the
//!   returned stream lives and read rows off the statement cursor one at a
//!   time. Dropping the stream early returns the connection to the pool.
//!
//! Every statement is logged at `debug` level with its SQL text.

use crate::config::{SourceConfig, check_identifier};
use crate::error::{Result, StreamError};
use crate::row::{Column, UserRow};
use crate::source::RowSource;
use async_stream::try_stream;
use async_trait::async_trait;
use futures::StreamExt;
use futures::stream::BoxStream;
use sqlx::pool::PoolConnection;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Sqlite;
use std::str::FromStr;
use tracing::debug;

const ROW_COLUMNS: &str = "user_id, name, email, age";

/// A [`RowSource`] backed by a SQLite database.
#[derive(Debug, Clone)]
pub struct SqliteSource {
  name: String,
  pool: SqlitePool,
  table: String,
  order_by: String,
}

impl SqliteSource {
  /// Creates a source from `config` without opening any connection yet.
  ///
  /// # Errors
  ///
  /// Fails if the configuration is invalid or the URL cannot be parsed.
  pub fn new(config: &SourceConfig) -> Result<Self> {
    config.validate()?;
    let options = SqliteConnectOptions::from_str(&config.connection_url)
      .map_err(|e| StreamError::Config(format!("invalid connection url: {e}")))?;
    let pool = SqlitePoolOptions::new()
      .max_connections(config.max_connections)
      .min_connections(config.min_connections)
      .acquire_timeout(config.connect_timeout)
      .idle_timeout(config.idle_timeout)
      .max_lifetime(config.max_lifetime)
      .connect_lazy_with(options);
    Self::with_pool(pool, &config.table, &config.order_by)
  }

  /// Wraps an existing pool.
  pub fn with_pool(pool: SqlitePool, table: &str, order_by: &str) -> Result<Self> {
    check_identifier(table)?;
    check_identifier(order_by)?;
    Ok(Self {
      name: format!("sqlite:{table}"),
      pool,
      table: table.to_string(),
      order_by: order_by.to_string(),
    })
  }

  /// The underlying connection pool.
  pub fn pool(&self) -> &SqlitePool {
    &self.pool
  }

  /// The table this source reads.
  pub fn table(&self) -> &str {
    &self.table
  }

  async fn acquire(&self) -> Result<PoolConnection<Sqlite>> {
    self
      .pool
      .acquire()
      .await
      .map_err(|e| StreamError::connect(&self.name, e))
  }

  fn select(&self, columns: &str) -> String {
    format!(
      "SELECT {columns} FROM {} ORDER BY {}",
      self.table, self.order_by
    )
  }

  /// Maps a driver error. `column` names the scanned column for scalar
  /// reads; row reads pass `None` and report the column sqlx failed on.
  fn query_error(&self, column: Option<Column>, error: sqlx::Error) -> StreamError {
    match (error, column) {
      (sqlx::Error::ColumnDecode { source, .. }, Some(column))
      | (sqlx::Error::Decode(source), Some(column)) => StreamError::decode(column.as_str(), source),
      (sqlx::Error::ColumnDecode { index, source }, None) => {
        StreamError::decode(index.trim_matches('"'), source)
      }
      (sqlx::Error::Decode(source), None) => StreamError::decode(ROW_COLUMNS, source),
      (other, _) => StreamError::query(&self.name, other),
    }
  }
}

#[async_trait]
impl RowSource for SqliteSource {
  fn name(&self) -> &str {
    &self.name
  }

  async fn fetch_page(&self, page_size: usize, offset: u64) -> Result<Vec<UserRow>> {
    // LIMIT only caps the row count
    let limit = i64::try_from(page_size).unwrap_or(i64::MAX);
    // no table holds more than i64::MAX rows
    let Ok(start) = i64::try_from(offset) else {
      return Ok(Vec::new());
    };
    let sql = format!("{} LIMIT ? OFFSET ?", self.select(ROW_COLUMNS));

    let mut conn = self.acquire().await?;
    debug!(component = %self.name, sql = %sql, limit, offset = start, "executing query");
    sqlx::query_as::<_, UserRow>(&sql)
      .bind(limit)
      .bind(start)
      .fetch_all(&mut *conn)
      .await
      .map_err(|e| self.query_error(None, e))
  }

  fn scan_rows(&self) -> BoxStream<'_, Result<UserRow>> {
    let sql = self.select(ROW_COLUMNS);
    Box::pin(try_stream! {
      let mut conn = self.acquire().await?;
      debug!(component = %self.name, sql = %sql, "executing query");
      let mut rows = sqlx::query_as::<_, UserRow>(&sql).fetch(&mut *conn);
      while let Some(row) = rows.next().await {
        yield row.map_err(|e| self.query_error(None, e))?;
      }
    })
  }

  fn scan_column(&self, column: Column) -> BoxStream<'_, Result<f64>> {
    let sql = self.select(column.as_str());
    Box::pin(try_stream! {
      let mut conn = self.acquire().await?;
      debug!(component = %self.name, sql = %sql, "executing query");
      let mut values = sqlx::query_scalar::<_, f64>(&sql).fetch(&mut *conn);
      while let Some(value) = values.next().await {
        yield value.map_err(|e| self.query_error(Some(column), e))?;
      }
    })
  }
}
