//! Progress signals from the pipeline to an external reporter.

use ballast_core::entity::EntityKind;

use crate::seeder::Stage;

/// Consumer of per-entity and per-stage progress signals.
///
/// Implementations must tolerate concurrent calls; whichever task finishes a
/// creation reports it.
pub trait Progress: Send + Sync {
  /// One entity of `kind` became durable.
  fn created(&self, kind: EntityKind);

  /// A stage passed its barrier and is about to issue tasks.
  fn stage_started(&self, stage: Stage) {
    let _ = stage;
  }
}

/// Discards every signal; the default sink.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullProgress;

impl Progress for NullProgress {
  fn created(&self, _kind: EntityKind) {}
}
