//! Monotonic value source for unique field generation.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;

/// A strictly increasing integer stream.
///
/// Seeded from the wall clock so that back-to-back runs against the same
/// store do not collide with values left over from a previous run. Within one
/// run every call advances the counter by exactly 1, and concurrent callers
/// never observe the same value.
#[derive(Debug)]
pub struct Sequence {
  counter: AtomicU64,
}

impl Sequence {
  /// Seed from the current UNIX time in milliseconds.
  pub fn seeded_from_clock() -> Self {
    let millis = Utc::now().timestamp_millis().max(0) as u64;
    Self::starting_at(millis)
  }

  /// Start the stream at a fixed point; the first draw yields `seed + 1`.
  pub fn starting_at(seed: u64) -> Self {
    Self { counter: AtomicU64::new(seed) }
  }

  /// Draw the next value. No two calls, however interleaved, yield the same
  /// value.
  pub fn next(&self) -> u64 {
    self.counter.fetch_add(1, Ordering::Relaxed) + 1
  }
}
