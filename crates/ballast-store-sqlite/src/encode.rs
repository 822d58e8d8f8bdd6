//! Encoding and decoding helpers between core types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings. Field maps and individual
//! claimed values are stored as compact JSON; identities as plain integers.

use ballast_core::entity::{
  EntityId, EntityKind, FieldMap, FieldValue, PersistedEntity, RelationRef,
};
use chrono::{DateTime, Utc};

use crate::{Error, Result};

// ─── EntityKind ──────────────────────────────────────────────────────────────

pub fn encode_kind(kind: EntityKind) -> &'static str { kind.name() }

pub fn decode_kind(s: &str) -> Result<EntityKind> {
  match s {
    "user" => Ok(EntityKind::User),
    "topic" => Ok(EntityKind::Topic),
    "post" => Ok(EntityKind::Post),
    other => Err(Error::Corrupt(format!("unknown entity kind: {other:?}"))),
  }
}

// ─── Identities ──────────────────────────────────────────────────────────────

pub fn encode_id(id: EntityId) -> i64 { id.0 as i64 }

pub fn decode_id(raw: i64) -> Result<EntityId> {
  u64::try_from(raw)
    .map(EntityId)
    .map_err(|_| Error::Corrupt(format!("negative entity id: {raw}")))
}

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Field values ────────────────────────────────────────────────────────────

pub fn encode_value(value: &FieldValue) -> Result<String> {
  Ok(serde_json::to_string(value)?)
}

pub fn encode_fields(fields: &FieldMap) -> Result<String> {
  Ok(serde_json::to_string(fields)?)
}

pub fn decode_fields(s: &str) -> Result<FieldMap> {
  Ok(serde_json::from_str(s)?)
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw column values read directly from an `entities` row.
pub struct RawEntity {
  pub kind:       String,
  pub id:         i64,
  pub fields:     String,
  pub created_at: String,
}

impl RawEntity {
  pub fn into_persisted(
    self,
    relations: std::collections::BTreeMap<String, RelationRef>,
  ) -> Result<PersistedEntity> {
    Ok(PersistedEntity {
      id: decode_id(self.id)?,
      kind: decode_kind(&self.kind)?,
      fields: decode_fields(&self.fields)?,
      relations,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

/// Raw column values read directly from a `relations` row.
pub struct RawRelation {
  pub source_id:   i64,
  pub name:        String,
  pub target_kind: String,
  pub target_id:   i64,
}

impl RawRelation {
  pub fn into_ref(self) -> Result<(String, RelationRef)> {
    Ok((self.name, RelationRef {
      kind: decode_kind(&self.target_kind)?,
      id:   decode_id(self.target_id)?,
    }))
  }
}
