//! Row, column and page types.
//!
//! A [`UserRow`] is one record of the `user_data` table. A [`Page`] is the
//! bounded, ordered slice of rows returned by a single paged query; it only
//! lives until the consumer is done with it.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

/// One record of the user table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserRow {
  /// Primary key.
  pub user_id: String,
  /// Display name.
  pub name: String,
  /// Email address.
  pub email: String,
  /// Age in years.
  pub age: f64,
}

impl UserRow {
  /// Creates a row from its fields.
  pub fn new(
    user_id: impl Into<String>,
    name: impl Into<String>,
    email: impl Into<String>,
    age: f64,
  ) -> Self {
    Self {
      user_id: user_id.into(),
      name: name.into(),
      email: email.into(),
      age,
    }
  }

  /// Returns true when the age is strictly greater than `threshold`.
  pub fn is_older_than(&self, threshold: f64) -> bool {
    self.age > threshold
  }

  /// Returns the value of a numeric column, or `None` for text columns.
  pub fn scalar(&self, column: Column) -> Option<f64> {
    match column {
      Column::Age => Some(self.age),
      Column::UserId | Column::Name | Column::Email => None,
    }
  }
}

impl Display for UserRow {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "({}, {}, {}, {})",
      self.user_id, self.name, self.email, self.age
    )
  }
}

/// Columns of the user table.
///
/// Scalar streaming takes a `Column` rather than a free-form name so that no
/// caller-supplied text ever reaches the SQL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Column {
  /// `user_id`
  UserId,
  /// `name`
  Name,
  /// `email`
  Email,
  /// `age`
  Age,
}

impl Column {
  /// Every column, in table order.
  pub const ALL: [Column; 4] = [Column::UserId, Column::Name, Column::Email, Column::Age];

  /// Returns the SQL column name.
  pub fn as_str(self) -> &'static str {
    match self {
      Column::UserId => "user_id",
      Column::Name => "name",
      Column::Email => "email",
      Column::Age => "age",
    }
  }
}

impl Display for Column {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Rows returned by one paged query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
  /// Offset the page was fetched at.
  pub offset: u64,
  /// Rows in source order.
  pub rows: Vec<UserRow>,
}

/// A page in the batch-processing vocabulary.
pub type Batch = Page;

impl Page {
  /// Creates a page fetched at `offset`.
  pub fn new(offset: u64, rows: Vec<UserRow>) -> Self {
    Self { offset, rows }
  }

  /// Number of rows in the page.
  pub fn len(&self) -> usize {
    self.rows.len()
  }

  /// Returns true if the page holds no rows.
  pub fn is_empty(&self) -> bool {
    self.rows.is_empty()
  }

  /// Borrows the rows.
  pub fn rows(&self) -> &[UserRow] {
    &self.rows
  }

  /// Consumes the page, returning its rows.
  pub fn into_rows(self) -> Vec<UserRow> {
    self.rows
  }
}

impl IntoIterator for Page {
  type Item = UserRow;
  type IntoIter = std::vec::IntoIter<UserRow>;

  fn into_iter(self) -> Self::IntoIter {
    self.rows.into_iter()
  }
}
