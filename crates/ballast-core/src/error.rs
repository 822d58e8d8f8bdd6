//! Error types for `ballast-core`.

use thiserror::Error;

use crate::entity::{EntityKind, FieldValue};

/// A field value rejected by one of its blueprint rules.
///
/// Raised while the entity is still in memory; nothing has been written when
/// one of these surfaces.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("field `{field}` failed the `{rule}` rule (value {value:?})")]
pub struct ValidationError {
  pub field: String,
  /// Name of the violated rule, e.g. `"required"` or `"min_length"`.
  pub rule:  &'static str,
  pub value: FieldValue,
}

/// A store write that could not complete.
///
/// Uniqueness collisions and backend failures surface through the same type
/// because the pipeline treats them identically: the creation failed and is
/// not retried.
#[derive(Debug, Error)]
pub enum StoreError {
  /// Another entity of this kind already claimed the value.
  #[error("{kind} already has {field} = {value:?}")]
  UniqueViolation {
    kind:  EntityKind,
    field: String,
    value: FieldValue,
  },

  /// The backend itself failed; the wrapped error says how.
  #[error("store backend: {0}")]
  Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl StoreError {
  /// Wrap a backend-specific error.
  pub fn backend(
    error: impl std::error::Error + Send + Sync + 'static,
  ) -> Self {
    Self::Backend(Box::new(error))
  }
}

/// Any failure producible while building or persisting an entity.
#[derive(Debug, Error)]
pub enum Error {
  #[error(transparent)]
  Validation(#[from] ValidationError),

  #[error(transparent)]
  Store(#[from] StoreError),

  /// An override named a field the kind's blueprint does not declare.
  #[error("{kind} has no `{field}` field to override")]
  UnknownField { kind: EntityKind, field: String },

  /// A round-robin selector was handed nothing to draw from.
  #[error("cannot rotate over an empty collection")]
  EmptyRotation,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
