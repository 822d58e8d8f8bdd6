//! Console progress: one dot per batch of persisted entities.

use std::{
  io::Write as _,
  sync::{Mutex, MutexGuard, PoisonError},
};

use ballast_core::entity::EntityKind;
use ballast_pipeline::{progress::Progress, Stage};

/// Entities per printed dot.
const CREATIONS_PER_DOT: u64 = 100;
/// Dots per line.
const DOTS_PER_LINE: u64 = 75;

/// Prints a dot for every [`CREATIONS_PER_DOT`] persisted entities and wraps
/// the line after [`DOTS_PER_LINE`] dots, so a run in the hundreds of
/// thousands stays readable on a terminal.
pub struct DotMeter {
  state: Mutex<MeterState>,
}

#[derive(Default)]
struct MeterState {
  creations: u64,
  dots:      u64,
  /// Whether output is pending a trailing newline.
  dirty:     bool,
}

impl DotMeter {
  pub fn new() -> Self {
    Self { state: Mutex::new(MeterState::default()) }
  }

  /// Terminate the dot line, if one was started.
  pub fn finish(&self) {
    let mut state = self.lock();
    if state.dirty {
      println!();
      state.dirty = false;
    }
  }

  fn lock(&self) -> MutexGuard<'_, MeterState> {
    self.state.lock().unwrap_or_else(PoisonError::into_inner)
  }
}

impl Default for DotMeter {
  fn default() -> Self {
    Self::new()
  }
}

impl Progress for DotMeter {
  fn created(&self, _kind: EntityKind) {
    let mut state = self.lock();
    state.creations += 1;
    if state.creations % CREATIONS_PER_DOT != 0 {
      return;
    }

    print!(".");
    std::io::stdout().flush().ok();
    state.dirty = true;

    state.dots += 1;
    if state.dots % DOTS_PER_LINE == 0 {
      println!();
      state.dirty = false;
    }
  }

  fn stage_started(&self, _stage: Stage) {
    // Stages never share a dot line.
    self.finish();
  }
}
