//! Built-in [`RowSource`](crate::RowSource) implementations.

/// SQLite-backed source using a `sqlx` connection pool.
pub mod sqlite;
/// In-memory source with connection and fetch instrumentation.
pub mod vec;

pub use sqlite::SqliteSource;
pub use vec::VecSource;
