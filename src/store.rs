//! Point reads and writes on the user table.
//!
//! Built on the scoped helpers: reads borrow a pooled connection through
//! [`with_connection`], writes run inside [`transactional`].

use crate::config::check_identifier;
use crate::error::{Result, StreamError};
use crate::row::UserRow;
use crate::scoped::{transactional, with_connection};
use sqlx::sqlite::SqlitePool;

/// Keyed access to a user table.
#[derive(Debug, Clone)]
pub struct UserStore {
  pool: SqlitePool,
  table: String,
}

impl UserStore {
  /// Creates a store over `table`.
  pub fn new(pool: SqlitePool, table: &str) -> Result<Self> {
    check_identifier(table)?;
    Ok(Self {
      pool,
      table: table.to_string(),
    })
  }

  /// The underlying connection pool.
  pub fn pool(&self) -> &SqlitePool {
    &self.pool
  }

  /// Looks up a row by primary key.
  pub async fn get_by_id(&self, user_id: &str) -> Result<Option<UserRow>> {
    let sql = format!(
      "SELECT user_id, name, email, age FROM {} WHERE user_id = ?",
      self.table
    );
    let table = self.table.clone();
    let user_id = user_id.to_string();
    with_connection(&self.pool, move |conn| {
      Box::pin(async move {
        sqlx::query_as::<_, UserRow>(&sql)
          .bind(user_id)
          .fetch_optional(conn)
          .await
          .map_err(|e| StreamError::query(table, e))
      })
    })
    .await
  }

  /// Changes a user's email. Returns false if no row has `user_id`.
  pub async fn update_email(&self, user_id: &str, email: &str) -> Result<bool> {
    let sql = format!("UPDATE {} SET email = ? WHERE user_id = ?", self.table);
    let table = self.table.clone();
    let user_id = user_id.to_string();
    let email = email.to_string();
    transactional(&self.pool, move |conn| {
      Box::pin(async move {
        let result = sqlx::query(&sql)
          .bind(email)
          .bind(user_id)
          .execute(conn)
          .await
          .map_err(|e| StreamError::query(table, e))?;
        Ok(result.rows_affected() > 0)
      })
    })
    .await
  }

  /// Number of rows in the table.
  pub async fn count(&self) -> Result<u64> {
    count_rows(&self.pool, &self.table).await
  }
}

pub(crate) async fn count_rows(pool: &SqlitePool, table: &str) -> Result<u64> {
  let sql = format!("SELECT COUNT(*) FROM {table}");
  let component = table.to_string();
  let count: i64 = with_connection(pool, move |conn| {
    Box::pin(async move {
      sqlx::query_scalar::<_, i64>(&sql)
        .fetch_one(conn)
        .await
        .map_err(|e| StreamError::query(component, e))
    })
  })
  .await?;
  Ok(count.max(0) as u64)
}
