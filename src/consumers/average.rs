use crate::error::Result;
use futures::{Stream, StreamExt};

/// Running sum and count of a sequence of values.
///
/// Holds two numbers no matter how many values it has seen. The mean of an
/// empty sequence is `0.0`.
///
/// # Example
///
/// ```rust
/// use rowweave::consumers::RunningMean;
///
/// let mut mean = RunningMean::new();
/// assert_eq!(mean.mean(), 0.0);
/// mean.push(20.0);
/// mean.push(30.0);
/// assert_eq!(mean.mean(), 25.0);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RunningMean {
  sum: f64,
  count: u64,
}

impl RunningMean {
  /// Creates an empty accumulator.
  pub fn new() -> Self {
    Self::default()
  }

  /// Adds one value.
  pub fn push(&mut self, value: f64) {
    self.sum += value;
    self.count += 1;
  }

  /// Sum of the values seen.
  pub fn sum(&self) -> f64 {
    self.sum
  }

  /// Number of values seen.
  pub fn count(&self) -> u64 {
    self.count
  }

  /// Mean of the values seen, or `0.0` if there were none.
  pub fn mean(&self) -> f64 {
    if self.count == 0 {
      0.0
    } else {
      self.sum / self.count as f64
    }
  }
}

/// Consumes `stream` once and returns the mean of its values.
///
/// Returns `0.0` for an empty stream and the first error if the stream fails.
pub async fn average<S>(stream: S) -> Result<f64>
where
  S: Stream<Item = Result<f64>>,
{
  let mut stream = std::pin::pin!(stream);
  let mut mean = RunningMean::new();
  while let Some(value) = stream.next().await {
    mean.push(value?);
  }
  Ok(mean.mean())
}
