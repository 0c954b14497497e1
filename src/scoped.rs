//! Scoped database access.
//!
//! These helpers acquire a resource, run the caller's operation, and release
//! the resource on every exit path:
//!
//! - [`with_connection`] lends one pooled connection for the duration of `f`.
//! - [`transactional`] wraps `f` in a transaction that commits on `Ok` and
//!   rolls back on `Err`.
//! - [`execute_query`] runs one parameterized read and returns all its rows.
//!
//! ```rust,no_run
//! use rowweave::scoped::with_connection;
//! use rowweave::StreamError;
//!
//! # async fn example(pool: sqlx::SqlitePool) -> Result<(), StreamError> {
//! let total: i64 = with_connection(&pool, |conn| {
//!   Box::pin(async move {
//!     sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM user_data")
//!       .fetch_one(conn)
//!       .await
//!       .map_err(|e| StreamError::query("user_data", e))
//!   })
//! })
//! .await?;
//! # Ok(())
//! # }
//! ```

use crate::error::{Result, StreamError};
use crate::row::UserRow;
use futures::future::BoxFuture;
use sqlx::sqlite::{SqliteArguments, SqliteConnection, SqlitePool};
use sqlx::Sqlite;
use tracing::{debug, error, info, warn};

const COMPONENT: &str = "sqlite";

/// Runs `f` with a connection borrowed from `pool`.
///
/// The connection goes back to the pool when `f` finishes, whether it
/// succeeded or not.
pub async fn with_connection<T, F>(pool: &SqlitePool, f: F) -> Result<T>
where
  F: for<'c> FnOnce(&'c mut SqliteConnection) -> BoxFuture<'c, Result<T>>,
{
  let mut conn = pool
    .acquire()
    .await
    .map_err(|e| StreamError::connect(COMPONENT, e))?;
  f(&mut *conn).await
}

/// Runs `f` inside a transaction.
///
/// Commits when `f` returns `Ok`. Rolls back and returns the error when it
/// returns `Err`.
pub async fn transactional<T, F>(pool: &SqlitePool, f: F) -> Result<T>
where
  F: for<'c> FnOnce(&'c mut SqliteConnection) -> BoxFuture<'c, Result<T>>,
{
  let mut tx = pool
    .begin()
    .await
    .map_err(|e| StreamError::connect(COMPONENT, e))?;

  let outcome = f(&mut *tx).await;
  match outcome {
    Ok(value) => {
      tx.commit()
        .await
        .map_err(|e| StreamError::query(COMPONENT, e))?;
      info!("transaction committed");
      Ok(value)
    }
    Err(e) => {
      warn!(error = %e, "rolling back transaction");
      if let Err(rollback) = tx.rollback().await {
        error!(error = %rollback, "rollback failed");
      }
      Err(e)
    }
  }
}

/// Runs `sql` with `params` bound in order and returns every row.
///
/// Parameters are JSON values: numbers bind as `INTEGER` or `REAL`, booleans
/// as `0`/`1`, strings as `TEXT`, null as `NULL`, and arrays or objects as
/// their JSON text.
pub async fn execute_query(
  pool: &SqlitePool,
  sql: &str,
  params: &[serde_json::Value],
) -> Result<Vec<UserRow>> {
  let mut query = sqlx::query_as::<_, UserRow>(sql);
  for param in params {
    query = bind_json(query, param)?;
  }
  debug!(sql = %sql, params = params.len(), "executing query");
  query
    .fetch_all(pool)
    .await
    .map_err(|e| StreamError::query(COMPONENT, e))
}

type RowQuery<'q> = sqlx::query::QueryAs<'q, Sqlite, UserRow, SqliteArguments<'q>>;

fn bind_json<'q>(query: RowQuery<'q>, param: &serde_json::Value) -> Result<RowQuery<'q>> {
  let bound = match param {
    serde_json::Value::Null => query.bind(None::<String>),
    serde_json::Value::Bool(b) => query.bind(i64::from(*b)),
    serde_json::Value::Number(n) => {
      if let Some(i) = n.as_i64() {
        query.bind(i)
      } else if let Some(f) = n.as_f64() {
        query.bind(f)
      } else {
        return Err(StreamError::Config(format!(
          "unsupported numeric parameter {n}"
        )));
      }
    }
    serde_json::Value::String(s) => query.bind(s.clone()),
    serde_json::Value::Array(_) | serde_json::Value::Object(_) => query.bind(param.to_string()),
  };
  Ok(bound)
}
