//! Error types for `ballast-pipeline`.

use thiserror::Error;

use crate::seeder::Stage;

/// A failure inside the pipeline.
///
/// The wrapping variants record *where* in a batch the first observed
/// failure happened; the innermost [`ballast_core::Error`] says what went
/// wrong with the entity itself.
#[derive(Debug, Error)]
pub enum Error {
  /// An entity creation failed, in validation or in the store.
  #[error(transparent)]
  Create(#[from] ballast_core::Error),

  /// The first failure a stage observed, tagged with the failing task's
  /// submission index.
  #[error("task {index} failed: {source}")]
  Task {
    index:  usize,
    #[source]
    source: Box<Error>,
  },

  /// A dependent-creation chain stopped, tagged with the failing step.
  #[error("chain step {step} failed: {source}")]
  Step {
    step:   usize,
    #[source]
    source: Box<Error>,
  },

  /// A stage task aborted instead of returning a result.
  #[error("stage task panicked: {0}")]
  Panic(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Terminal pipeline failure: the stage that ended the run and the first
/// error it observed.
#[derive(Debug, Error)]
#[error("{stage} failed: {source}")]
pub struct RunError {
  pub stage:  Stage,
  #[source]
  pub source: Error,
}
