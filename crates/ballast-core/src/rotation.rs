//! Deterministic cycling over a fixed collection.

use std::sync::atomic::{AtomicUsize, Ordering};

use crate::{Error, Result};

/// Hands out elements of a fixed collection one at a time, wrapping back to
/// the start after the last.
///
/// The cursor only ever grows; the element index is always `cursor % len`.
/// That gives concurrent draws a well-defined total order: within any window
/// of `len` consecutive draws, every element is handed out exactly once, no
/// matter how the drawing tasks interleave.
#[derive(Debug)]
pub struct RoundRobin<T> {
  items:  Vec<T>,
  cursor: AtomicUsize,
}

impl<T> RoundRobin<T> {
  /// Build a selector over `items`. At least one element is required; an
  /// empty rotation has no meaningful draw.
  pub fn new(items: Vec<T>) -> Result<Self> {
    if items.is_empty() {
      return Err(Error::EmptyRotation);
    }
    Ok(Self { items, cursor: AtomicUsize::new(0) })
  }

  /// Draw the next element in rotation order.
  pub fn next(&self) -> &T {
    let drawn = self.cursor.fetch_add(1, Ordering::Relaxed);
    &self.items[drawn % self.items.len()]
  }
}
