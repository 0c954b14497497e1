use crate::error::Result;
use crate::row::UserRow;
use futures::{Stream, StreamExt};
use std::io::Write;

/// Writes each row of `stream` to `writer` on its own line as it arrives.
///
/// Returns the number of rows written. Stops at the first stream or write
/// error; rows written before it stay written.
pub async fn print_rows<S, W>(stream: S, mut writer: W) -> Result<usize>
where
  S: Stream<Item = Result<UserRow>>,
  W: Write,
{
  let mut stream = std::pin::pin!(stream);
  let mut written = 0;
  while let Some(row) = stream.next().await {
    writeln!(writer, "{}", row?)?;
    written += 1;
  }
  writer.flush()?;
  Ok(written)
}
