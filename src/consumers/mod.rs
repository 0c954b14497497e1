//! Consumers that drain row and scalar streams in constant memory.

/// Running mean over a scalar stream.
pub mod average;
/// Writes rows to any `std::io::Write` as they arrive.
pub mod print;

pub use average::{RunningMean, average};
pub use print::print_rows;
