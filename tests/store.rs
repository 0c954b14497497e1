use rowweave::scoped::{execute_query, transactional, with_connection};
use rowweave::seed::{SeedOutcome, create_table, insert_rows, seed_from_csv, seed_from_path};
use rowweave::{StreamError, UserRow, UserStore};
use serde_json::json;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tempfile::TempDir;

const CSV: &str = "name,email,age
Dan Altenwerth Jr.,Molly59@gmail.com,67
Glenda Wisozk,Miriam21@gmail.com,119
Daniel Fahey IV,Delia.Lesch11@hotmail.com,49
";

async fn pool() -> (TempDir, SqlitePool) {
  let dir = tempfile::tempdir().unwrap();
  let options = SqliteConnectOptions::new()
    .filename(dir.path().join("users.db"))
    .create_if_missing(true);
  let pool = SqlitePoolOptions::new()
    .max_connections(2)
    .connect_with(options)
    .await
    .unwrap();
  create_table(&pool, "user_data").await.unwrap();
  (dir, pool)
}

fn sample() -> Vec<UserRow> {
  vec![
    UserRow::new("1", "Ada", "ada@example.com", 36.0),
    UserRow::new("2", "Grace", "grace@example.com", 45.0),
  ]
}

// ============================================================================
// seeding
// ============================================================================

#[tokio::test]
async fn test_seed_from_csv_inserts_into_empty_table() {
  let (_dir, pool) = pool().await;
  let outcome = seed_from_csv(&pool, "user_data", CSV.as_bytes()).await.unwrap();
  assert_eq!(outcome, SeedOutcome::Inserted(3));

  let store = UserStore::new(pool, "user_data").unwrap();
  assert_eq!(store.count().await.unwrap(), 3);
}

#[tokio::test]
async fn test_seed_from_csv_skips_populated_table() {
  let (_dir, pool) = pool().await;
  seed_from_csv(&pool, "user_data", CSV.as_bytes()).await.unwrap();
  let outcome = seed_from_csv(&pool, "user_data", CSV.as_bytes()).await.unwrap();
  assert_eq!(outcome, SeedOutcome::AlreadyPopulated(3));
}

#[tokio::test]
async fn test_seed_assigns_distinct_uuids() {
  let (_dir, pool) = pool().await;
  seed_from_csv(&pool, "user_data", CSV.as_bytes()).await.unwrap();
  let rows = execute_query(&pool, "SELECT user_id, name, email, age FROM user_data", &[])
    .await
    .unwrap();
  assert_eq!(rows.len(), 3);
  for row in &rows {
    assert!(uuid::Uuid::parse_str(&row.user_id).is_ok(), "{}", row.user_id);
  }
  assert_ne!(rows[0].user_id, rows[1].user_id);
  assert_eq!(rows[1].age, 119.0);
}

#[tokio::test]
async fn test_seed_rejects_malformed_csv() {
  let (_dir, pool) = pool().await;
  let err = seed_from_csv(&pool, "user_data", "name,email,age\nBob,bob@example.com,old\n".as_bytes())
    .await
    .unwrap_err();
  assert!(matches!(err, StreamError::Csv(_)));
}

#[tokio::test]
async fn test_seed_from_missing_path_is_io_error() {
  let (dir, pool) = pool().await;
  let err = seed_from_path(&pool, "user_data", dir.path().join("user_data.csv"))
    .await
    .unwrap_err();
  assert!(matches!(err, StreamError::Io(_)));
}

#[tokio::test]
async fn test_seed_from_path() {
  let (dir, pool) = pool().await;
  let path = dir.path().join("user_data.csv");
  std::fs::write(&path, CSV).unwrap();
  let outcome = seed_from_path(&pool, "user_data", &path).await.unwrap();
  assert_eq!(outcome, SeedOutcome::Inserted(3));
}

// ============================================================================
// UserStore
// ============================================================================

#[tokio::test]
async fn test_store_get_by_id() {
  let (_dir, pool) = pool().await;
  insert_rows(&pool, "user_data", sample()).await.unwrap();
  let store = UserStore::new(pool, "user_data").unwrap();

  assert_eq!(store.get_by_id("2").await.unwrap(), Some(sample()[1].clone()));
  assert_eq!(store.get_by_id("missing").await.unwrap(), None);
}

#[tokio::test]
async fn test_store_update_email() {
  let (_dir, pool) = pool().await;
  insert_rows(&pool, "user_data", sample()).await.unwrap();
  let store = UserStore::new(pool, "user_data").unwrap();

  assert!(store.update_email("1", "Crawford_Cartwright@hotmail.com").await.unwrap());
  let row = store.get_by_id("1").await.unwrap().unwrap();
  assert_eq!(row.email, "Crawford_Cartwright@hotmail.com");

  assert!(!store.update_email("missing", "x@example.com").await.unwrap());
}

#[tokio::test]
async fn test_store_rejects_unsafe_table_name() {
  let pool = SqlitePoolOptions::new().connect_lazy("sqlite::memory:").unwrap();
  let err = UserStore::new(pool, "users; DROP TABLE users").unwrap_err();
  assert!(matches!(err, StreamError::InvalidIdentifier(_)));
}

// ============================================================================
// scoped helpers
// ============================================================================

#[tokio::test]
async fn test_transactional_rolls_back_on_error() {
  let (_dir, pool) = pool().await;
  insert_rows(&pool, "user_data", sample()).await.unwrap();

  let result: Result<(), StreamError> = transactional(&pool, |conn| {
    Box::pin(async move {
      sqlx::query("UPDATE user_data SET email = 'changed@example.com' WHERE user_id = '1'")
        .execute(&mut *conn)
        .await
        .map_err(|e| StreamError::query("user_data", e))?;
      Err(StreamError::Config("abort after update".to_string()))
    })
  })
  .await;
  assert!(matches!(result, Err(StreamError::Config(_))));

  let store = UserStore::new(pool, "user_data").unwrap();
  let row = store.get_by_id("1").await.unwrap().unwrap();
  assert_eq!(row.email, "ada@example.com");
}

#[tokio::test]
async fn test_insert_rows_is_atomic() {
  let (_dir, pool) = pool().await;
  let mut rows = sample();
  rows.push(UserRow::new("1", "Duplicate", "dup@example.com", 1.0));
  let err = insert_rows(&pool, "user_data", rows).await.unwrap_err();
  assert!(err.is_query());

  let store = UserStore::new(pool, "user_data").unwrap();
  assert_eq!(store.count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_with_connection_returns_value() {
  let (_dir, pool) = pool().await;
  insert_rows(&pool, "user_data", sample()).await.unwrap();
  let oldest: f64 = with_connection(&pool, |conn| {
    Box::pin(async move {
      sqlx::query_scalar::<_, f64>("SELECT MAX(age) FROM user_data")
        .fetch_one(conn)
        .await
        .map_err(|e| StreamError::query("user_data", e))
    })
  })
  .await
  .unwrap();
  assert_eq!(oldest, 45.0);
}

#[tokio::test]
async fn test_execute_query_binds_parameters() {
  let (_dir, pool) = pool().await;
  insert_rows(&pool, "user_data", sample()).await.unwrap();
  let rows = execute_query(
    &pool,
    "SELECT user_id, name, email, age FROM user_data WHERE age > ? AND name != ?",
    &[json!(25), json!("Ada")],
  )
  .await
  .unwrap();
  assert_eq!(rows, vec![sample()[1].clone()]);
}

// ============================================================================
// telemetry
// ============================================================================

#[test]
fn test_init_tracing_installs_once() {
  let _ = rowweave::telemetry::init_tracing();
  let err = rowweave::telemetry::init_tracing().unwrap_err();
  assert!(matches!(err, StreamError::Config(_)));
}
