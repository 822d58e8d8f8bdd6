//! Entity records: kinds, identities, field values and relation references.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ─── Kinds and identities ────────────────────────────────────────────────────

/// The kind of record a creation task produces.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize,
  Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
  User,
  Topic,
  Post,
}

impl EntityKind {
  /// The discriminant string used in store keys and log output.
  pub fn name(self) -> &'static str {
    match self {
      Self::User => "user",
      Self::Topic => "topic",
      Self::Post => "post",
    }
  }
}

impl std::fmt::Display for EntityKind {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.name())
  }
}

/// Store-assigned identity: a per-kind sequence starting at 1.
///
/// Identities are only meaningful together with an [`EntityKind`]; user 3 and
/// topic 3 are unrelated records.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize,
  Deserialize,
)]
#[serde(transparent)]
pub struct EntityId(pub u64);

impl std::fmt::Display for EntityId {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.0)
  }
}

// ─── Field values ────────────────────────────────────────────────────────────

/// The value of one entity field.
///
/// Deliberately small; the records themselves are trivial and the interesting
/// part of the system is how they are produced.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
  Text(String),
  Int(i64),
  Bool(bool),
  List(Vec<String>),
}

impl FieldValue {
  pub fn text(value: impl Into<String>) -> Self { Self::Text(value.into()) }

  pub fn as_text(&self) -> Option<&str> {
    match self {
      Self::Text(value) => Some(value),
      _ => None,
    }
  }

  pub fn as_int(&self) -> Option<i64> {
    match self {
      Self::Int(value) => Some(*value),
      _ => None,
    }
  }
}

/// Field-name to value map, ordered for stable iteration and encoding.
pub type FieldMap = BTreeMap<String, FieldValue>;

// ─── Relations ───────────────────────────────────────────────────────────────

/// A directed, named reference to an already-persisted entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationRef {
  pub kind: EntityKind,
  pub id:   EntityId,
}

// ─── Pending and persisted records ───────────────────────────────────────────

/// An entity built in memory: validated, possibly linked, not yet durable.
#[derive(Debug, Clone)]
pub struct PendingEntity {
  pub kind:   EntityKind,
  pub fields: FieldMap,
  relations:  BTreeMap<String, RelationRef>,
}

impl PendingEntity {
  pub fn new(kind: EntityKind, fields: FieldMap) -> Self {
    Self { kind, fields, relations: BTreeMap::new() }
  }

  /// Attach the named relation, replacing any previous target under the same
  /// name. Taking the target as a persisted handle keeps references to
  /// entities without a store identity unrepresentable.
  pub fn link(&mut self, name: impl Into<String>, target: &PersistedEntity) {
    self
      .relations
      .insert(name.into(), RelationRef { kind: target.kind, id: target.id });
  }

  pub fn relation(&self, name: &str) -> Option<RelationRef> {
    self.relations.get(name).copied()
  }

  /// Convert into the store's input record, naming the fields whose values
  /// must be claimed store-wide.
  pub fn into_new(self, uniques: Vec<String>) -> NewEntity {
    NewEntity {
      kind: self.kind,
      fields: self.fields,
      uniques,
      relations: self.relations,
    }
  }
}

/// Input to [`crate::store::SeedStore::save`]: everything durable about one
/// entity except what the store itself assigns.
#[derive(Debug, Clone)]
pub struct NewEntity {
  pub kind:      EntityKind,
  pub fields:    FieldMap,
  /// Field names whose values must be claimed atomically with the record.
  pub uniques:   Vec<String>,
  pub relations: BTreeMap<String, RelationRef>,
}

/// A durable entity. Identity and creation time are store-assigned; records
/// are never mutated after their save.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedEntity {
  pub id:         EntityId,
  pub kind:       EntityKind,
  pub fields:     FieldMap,
  pub relations:  BTreeMap<String, RelationRef>,
  pub created_at: DateTime<Utc>,
}

impl PersistedEntity {
  pub fn text_field(&self, name: &str) -> Option<&str> {
    self.fields.get(name).and_then(FieldValue::as_text)
  }

  pub fn int_field(&self, name: &str) -> Option<i64> {
    self.fields.get(name).and_then(FieldValue::as_int)
  }

  pub fn relation(&self, name: &str) -> Option<RelationRef> {
    self.relations.get(name).copied()
  }
}
