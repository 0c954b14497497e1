use futures::{StreamExt, TryStreamExt};
use rowweave::consumers::average;
use rowweave::seed::{create_table, insert_rows};
use rowweave::{
  Column, Page, PagedRowStreamer, RowSource, SourceConfig, SqliteSource, StreamError, UserRow,
  fetch_concurrently,
};
use std::time::Duration;
use tempfile::TempDir;

struct TestDb {
  _dir: TempDir,
  config: SourceConfig,
}

fn users(ages: &[f64]) -> Vec<UserRow> {
  ages
    .iter()
    .enumerate()
    .map(|(i, age)| UserRow::new(format!("id-{i:03}"), format!("user {i}"), format!("u{i}@example.com"), *age))
    .collect()
}

async fn seeded(ages: &[f64]) -> (TestDb, PagedRowStreamer<SqliteSource>) {
  let dir = tempfile::tempdir().unwrap();
  let url = format!("sqlite://{}?mode=rwc", dir.path().join("users.db").display());
  let config = SourceConfig::new(url)
    .with_max_connections(4)
    .with_connect_timeout(Duration::from_secs(5));
  let source = SqliteSource::new(&config).unwrap();
  create_table(source.pool(), "user_data").await.unwrap();
  insert_rows(source.pool(), "user_data", users(ages)).await.unwrap();
  (TestDb { _dir: dir, config }, PagedRowStreamer::new(source))
}

#[tokio::test]
async fn test_sqlite_stream_rows_in_insertion_order() {
  let ages = [20.0, 30.0, 45.0, 50.0];
  let (_db, streamer) = seeded(&ages).await;
  let rows: Vec<UserRow> = streamer.stream_rows().try_collect().await.unwrap();
  assert_eq!(rows, users(&ages));
}

#[tokio::test]
async fn test_sqlite_stream_pages_matches_unpaged_rows() {
  let ages: Vec<f64> = (0..17).map(|i| f64::from(18 + i * 3)).collect();
  let (_db, streamer) = seeded(&ages).await;
  for page_size in [1, 2, 4, 5, 16, 17, 18, 100] {
    let pages: Vec<Page> = streamer.stream_pages(page_size).try_collect().await.unwrap();
    assert!(pages.iter().all(|p| p.len() <= page_size));
    let rows: Vec<UserRow> = pages.into_iter().flatten().collect();
    assert_eq!(rows, users(&ages), "page_size {page_size}");
  }
}

#[tokio::test]
async fn test_sqlite_largest_page_size_reads_whole_table() {
  let ages = [20.0, 30.0];
  let (_db, streamer) = seeded(&ages).await;
  let pages: Vec<Page> = streamer.stream_pages(usize::MAX).try_collect().await.unwrap();
  assert_eq!(pages.len(), 1);
  assert_eq!(pages[0].rows(), users(&ages).as_slice());
  assert_eq!(streamer.stats().fetches, 2);
}

#[tokio::test]
async fn test_sqlite_fetch_page_beyond_sqlite_offset_range_is_empty() {
  let (_db, streamer) = seeded(&[20.0]).await;
  let rows = streamer.source().fetch_page(10, u64::MAX).await.unwrap();
  assert!(rows.is_empty());
}

#[tokio::test]
async fn test_sqlite_fetch_page_past_end_is_empty() {
  let (_db, streamer) = seeded(&[20.0, 30.0]).await;
  let rows = streamer.source().fetch_page(10, 2).await.unwrap();
  assert!(rows.is_empty());
}

#[tokio::test]
async fn test_sqlite_stream_filtered_example() {
  let (_db, streamer) = seeded(&[20.0, 30.0, 45.0, 50.0]).await;
  let rows: Vec<UserRow> = streamer
    .stream_filtered(2, |row| row.age > 25.0)
    .try_collect()
    .await
    .unwrap();
  let ages: Vec<f64> = rows.iter().map(|r| r.age).collect();
  assert_eq!(ages, vec![30.0, 45.0, 50.0]);
  assert_eq!(streamer.stats().fetches, 3);
}

#[tokio::test]
async fn test_sqlite_average_age() {
  let (_db, streamer) = seeded(&[20.0, 30.0, 45.0, 50.0]).await;
  let mean = average(streamer.stream_scalar(Column::Age)).await.unwrap();
  assert_eq!(mean, 36.25);
}

#[tokio::test]
async fn test_sqlite_average_age_of_empty_table() {
  let (_db, streamer) = seeded(&[]).await;
  let mean = average(streamer.stream_scalar(Column::Age)).await.unwrap();
  assert_eq!(mean, 0.0);
}

#[tokio::test]
async fn test_sqlite_text_column_fails_to_decode_as_number() {
  let (_db, streamer) = seeded(&[20.0]).await;
  let err = average(streamer.stream_scalar(Column::Email)).await.unwrap_err();
  assert!(
    matches!(err, StreamError::Decode { ref column, .. } if column == "email"),
    "{err}"
  );
}

#[tokio::test]
async fn test_sqlite_row_decode_error_names_the_column() {
  let (db, streamer) = seeded(&[]).await;
  let pool = streamer.source().pool();
  sqlx::query("CREATE TABLE loose_users (user_id TEXT, name TEXT, email TEXT, age TEXT)")
    .execute(pool)
    .await
    .unwrap();
  sqlx::query("INSERT INTO loose_users VALUES ('1', 'Ada', 'ada@example.com', 'old')")
    .execute(pool)
    .await
    .unwrap();

  let config = db.config.clone().with_table("loose_users");
  let streamer = PagedRowStreamer::new(SqliteSource::new(&config).unwrap());
  let err = streamer.stream_rows().try_collect::<Vec<_>>().await.unwrap_err();
  assert!(
    matches!(err, StreamError::Decode { ref column, .. } if column == "age"),
    "{err}"
  );
}

#[tokio::test]
async fn test_sqlite_abandoned_scan_does_not_block_later_streams() {
  let (db, _) = seeded(&[1.0, 2.0, 3.0, 4.0]).await;
  let config = db.config.clone().with_max_connections(1);
  let streamer = PagedRowStreamer::new(SqliteSource::new(&config).unwrap());

  let mut rows = streamer.stream_rows();
  rows.next().await.unwrap().unwrap();
  drop(rows);

  // the only pooled connection must have been handed back
  let pages: Vec<Page> = streamer.stream_pages(3).try_collect().await.unwrap();
  assert_eq!(pages.len(), 2);
}

#[tokio::test]
async fn test_sqlite_missing_table_is_query_error() {
  let (db, _) = seeded(&[1.0]).await;
  let config = db.config.clone().with_table("no_such_table");
  let streamer = PagedRowStreamer::new(SqliteSource::new(&config).unwrap());
  let items: Vec<_> = streamer.stream_pages(2).collect().await;
  assert_eq!(items.len(), 1);
  assert!(items[0].as_ref().unwrap_err().is_query());
}

#[tokio::test]
async fn test_sqlite_unreachable_database_is_connection_error() {
  let dir = tempfile::tempdir().unwrap();
  let url = format!(
    "sqlite://{}?mode=ro",
    dir.path().join("missing").join("users.db").display()
  );
  let config = SourceConfig::new(url).with_connect_timeout(Duration::from_secs(2));
  let streamer = PagedRowStreamer::new(SqliteSource::new(&config).unwrap());

  let items: Vec<_> = streamer.stream_rows().collect().await;
  assert_eq!(items.len(), 1);
  assert!(items[0].as_ref().unwrap_err().is_connection());
}

#[tokio::test]
async fn test_sqlite_invalid_config_is_rejected_up_front() {
  let err = SqliteSource::new(&SourceConfig::default()).unwrap_err();
  assert!(matches!(err, StreamError::Config(_)));

  let err = SqliteSource::new(&SourceConfig::new("sqlite::memory:").with_table("x; --")).unwrap_err();
  assert!(matches!(err, StreamError::InvalidIdentifier(_)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_sqlite_fetch_concurrently() {
  let (_db, streamer) = seeded(&[22.0, 41.0, 38.0, 65.0, 40.0]).await;
  let fetched = fetch_concurrently(&streamer.with_page_size(2), 40.0).await.unwrap();
  assert_eq!(fetched.all.len(), 5);
  let older: Vec<f64> = fetched.older.iter().map(|r| r.age).collect();
  assert_eq!(older, vec![41.0, 65.0]);
}
