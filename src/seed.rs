//! Creating and populating the user table.
//!
//! CSV input has a header row with `name`, `email` and `age` columns. Each
//! record gets a fresh v4 UUID as its `user_id`. Seeding is idempotent in the
//! coarse sense: if the table already holds any rows, nothing is inserted.

use crate::config::check_identifier;
use crate::error::{Result, StreamError};
use crate::row::UserRow;
use crate::scoped::transactional;
use crate::store::count_rows;
use serde::Deserialize;
use sqlx::sqlite::SqlitePool;
use std::io::Read;
use std::path::Path;
use tracing::info;
use uuid::Uuid;

/// What [`seed_from_csv`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedOutcome {
  /// The table was empty and this many rows were inserted.
  Inserted(u64),
  /// The table already held this many rows; nothing was inserted.
  AlreadyPopulated(u64),
}

#[derive(Debug, Deserialize)]
struct CsvUser {
  name: String,
  email: String,
  age: f64,
}

/// Creates the user table if it does not exist.
pub async fn create_table(pool: &SqlitePool, table: &str) -> Result<()> {
  check_identifier(table)?;
  let sql = format!(
    "CREATE TABLE IF NOT EXISTS {table} (
      user_id TEXT PRIMARY KEY,
      name TEXT NOT NULL,
      email TEXT NOT NULL,
      age REAL NOT NULL
    )"
  );
  sqlx::query(&sql)
    .execute(pool)
    .await
    .map_err(|e| StreamError::query(table, e))?;
  info!(table, "table ready");
  Ok(())
}

/// Inserts `rows` in a single transaction and returns how many were written.
pub async fn insert_rows(pool: &SqlitePool, table: &str, rows: Vec<UserRow>) -> Result<u64> {
  check_identifier(table)?;
  let sql = format!("INSERT INTO {table} (user_id, name, email, age) VALUES (?, ?, ?, ?)");
  let component = table.to_string();
  transactional(pool, move |conn| {
    Box::pin(async move {
      let mut inserted = 0;
      for row in &rows {
        sqlx::query(&sql)
          .bind(&row.user_id)
          .bind(&row.name)
          .bind(&row.email)
          .bind(row.age)
          .execute(&mut *conn)
          .await
          .map_err(|e| StreamError::query(&component, e))?;
        inserted += 1;
      }
      Ok(inserted)
    })
  })
  .await
}

/// Reads users from CSV and inserts them, unless the table already has rows.
pub async fn seed_from_csv<R: Read>(
  pool: &SqlitePool,
  table: &str,
  reader: R,
) -> Result<SeedOutcome> {
  let existing = count_rows(pool, table).await?;
  if existing > 0 {
    info!(table, existing, "table already populated, skipping seed");
    return Ok(SeedOutcome::AlreadyPopulated(existing));
  }

  let rows = read_csv_rows(reader)?;
  let inserted = insert_rows(pool, table, rows).await?;
  info!(table, inserted, "seeded table");
  Ok(SeedOutcome::Inserted(inserted))
}

fn read_csv_rows<R: Read>(reader: R) -> Result<Vec<UserRow>> {
  let mut csv_reader = csv::ReaderBuilder::new()
    .has_headers(true)
    .trim(csv::Trim::All)
    .from_reader(reader);
  let mut rows = Vec::new();
  for record in csv_reader.deserialize::<CsvUser>() {
    let user = record?;
    rows.push(UserRow::new(
      Uuid::new_v4().to_string(),
      user.name,
      user.email,
      user.age,
    ));
  }
  Ok(rows)
}

/// Opens `path` and seeds the table from it.
pub async fn seed_from_path(
  pool: &SqlitePool,
  table: &str,
  path: impl AsRef<Path>,
) -> Result<SeedOutcome> {
  let file = std::fs::File::open(path.as_ref())?;
  seed_from_csv(pool, table, std::io::BufReader::new(file)).await
}
