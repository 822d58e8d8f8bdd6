//! [`SqliteStore`] — the SQLite implementation of [`SeedStore`].

use std::{
  collections::{BTreeMap, HashMap},
  path::Path,
};

use ballast_core::{
  entity::{
    EntityId, EntityKind, FieldValue, NewEntity, PersistedEntity, RelationRef,
  },
  error::StoreError,
  store::SeedStore,
};
use chrono::{DateTime, Utc};
use rusqlite::OptionalExtension as _;

use crate::{
  encode::{
    decode_id, encode_dt, encode_fields, encode_id, encode_kind, encode_value,
    RawEntity, RawRelation,
  },
  schema::SCHEMA,
  Error, Result,
};

/// Outcome of the save transaction, before collisions are shaped into a
/// store error.
enum SaveOutcome {
  Saved { id: i64 },
  Collision { field: String },
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A seed store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted. All access
/// funnels through one connection thread, so saves issued by many concurrent
/// tasks serialise there; the per-save transaction keeps each one atomic even
/// against a second process on the same file.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn claim_exists(
    &self,
    kind: EntityKind,
    field: &str,
    value: &FieldValue,
  ) -> Result<bool> {
    let kind_str = encode_kind(kind).to_owned();
    let field = field.to_owned();
    let value_json = encode_value(value)?;

    let hit: Option<i64> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT id FROM unique_claims
               WHERE kind = ?1 AND field = ?2 AND value = ?3",
              rusqlite::params![kind_str, field, value_json],
              |row| row.get(0),
            )
            .optional()?,
        )
      })
      .await?;

    Ok(hit.is_some())
  }

  /// Run the save transaction: bump the kind's counter, claim the unique
  /// values, insert the record and its relations. A collision returns before
  /// the commit, so the whole transaction — counter bump included — rolls
  /// back.
  async fn save_entity(
    &self,
    entity: &NewEntity,
    created_at: DateTime<Utc>,
  ) -> Result<SaveOutcome> {
    let kind_str = encode_kind(entity.kind).to_owned();
    let created_at_str = encode_dt(created_at);
    let fields_json = encode_fields(&entity.fields)?;

    let mut claims = Vec::with_capacity(entity.uniques.len());
    for field in &entity.uniques {
      if let Some(value) = entity.fields.get(field) {
        claims.push((field.clone(), encode_value(value)?));
      }
    }

    let relation_rows: Vec<(String, String, i64)> = entity
      .relations
      .iter()
      .map(|(name, target)| {
        (
          name.clone(),
          encode_kind(target.kind).to_owned(),
          encode_id(target.id),
        )
      })
      .collect();

    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        tx.execute(
          "INSERT INTO counters (kind, next) VALUES (?1, 1)
           ON CONFLICT(kind) DO UPDATE SET next = next + 1",
          rusqlite::params![kind_str],
        )?;
        let id: i64 = tx.query_row(
          "SELECT next FROM counters WHERE kind = ?1",
          rusqlite::params![kind_str],
          |row| row.get(0),
        )?;

        for (field, value_json) in &claims {
          let inserted = tx.execute(
            "INSERT OR IGNORE INTO unique_claims (kind, field, value, id)
             VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![kind_str, field, value_json, id],
          )?;
          if inserted == 0 {
            return Ok(SaveOutcome::Collision { field: field.clone() });
          }
        }

        tx.execute(
          "INSERT INTO entities (kind, id, fields, created_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![kind_str, id, fields_json, created_at_str],
        )?;

        for (name, target_kind, target_id) in &relation_rows {
          tx.execute(
            "INSERT INTO relations
               (source_kind, source_id, name, target_kind, target_id)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![kind_str, id, name, target_kind, target_id],
          )?;
        }

        tx.commit()?;
        Ok(SaveOutcome::Saved { id })
      })
      .await?;

    Ok(outcome)
  }

  async fn fetch(
    &self,
    kind: EntityKind,
    id: EntityId,
  ) -> Result<Option<PersistedEntity>> {
    let kind_str = encode_kind(kind).to_owned();
    let id_raw = encode_id(id);

    let fetched: Option<(RawEntity, Vec<RawRelation>)> = self
      .conn
      .call(move |conn| {
        let entity = conn
          .query_row(
            "SELECT kind, id, fields, created_at FROM entities
             WHERE kind = ?1 AND id = ?2",
            rusqlite::params![kind_str, id_raw],
            |row| {
              Ok(RawEntity {
                kind:       row.get(0)?,
                id:         row.get(1)?,
                fields:     row.get(2)?,
                created_at: row.get(3)?,
              })
            },
          )
          .optional()?;

        let Some(entity) = entity else {
          return Ok(None);
        };

        let mut stmt = conn.prepare(
          "SELECT name, target_kind, target_id FROM relations
           WHERE source_kind = ?1 AND source_id = ?2",
        )?;
        let relations = stmt
          .query_map(rusqlite::params![kind_str, id_raw], |row| {
            Ok(RawRelation {
              source_id:   id_raw,
              name:        row.get(0)?,
              target_kind: row.get(1)?,
              target_id:   row.get(2)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(Some((entity, relations)))
      })
      .await?;

    match fetched {
      None => Ok(None),
      Some((raw, rows)) => {
        let mut relations = BTreeMap::new();
        for row in rows {
          let (name, target) = row.into_ref()?;
          relations.insert(name, target);
        }
        Ok(Some(raw.into_persisted(relations)?))
      }
    }
  }

  async fn fetch_all(&self, kind: EntityKind) -> Result<Vec<PersistedEntity>> {
    let kind_str = encode_kind(kind).to_owned();

    let (raws, relation_rows): (Vec<RawEntity>, Vec<RawRelation>) = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT kind, id, fields, created_at FROM entities
           WHERE kind = ?1 ORDER BY id",
        )?;
        let raws = stmt
          .query_map(rusqlite::params![kind_str], |row| {
            Ok(RawEntity {
              kind:       row.get(0)?,
              id:         row.get(1)?,
              fields:     row.get(2)?,
              created_at: row.get(3)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut stmt = conn.prepare(
          "SELECT source_id, name, target_kind, target_id FROM relations
           WHERE source_kind = ?1",
        )?;
        let relation_rows = stmt
          .query_map(rusqlite::params![kind_str], |row| {
            Ok(RawRelation {
              source_id:   row.get(0)?,
              name:        row.get(1)?,
              target_kind: row.get(2)?,
              target_id:   row.get(3)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok((raws, relation_rows))
      })
      .await?;

    let mut by_source: HashMap<i64, BTreeMap<String, RelationRef>> =
      HashMap::new();
    for row in relation_rows {
      let source_id = row.source_id;
      let (name, target) = row.into_ref()?;
      by_source.entry(source_id).or_default().insert(name, target);
    }

    raws
      .into_iter()
      .map(|raw| {
        let relations = by_source.remove(&raw.id).unwrap_or_default();
        raw.into_persisted(relations)
      })
      .collect()
  }

  async fn count_kind(&self, kind: EntityKind) -> Result<u64> {
    let kind_str = encode_kind(kind).to_owned();

    let count: i64 = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          "SELECT COUNT(*) FROM entities WHERE kind = ?1",
          rusqlite::params![kind_str],
          |row| row.get(0),
        )?)
      })
      .await?;

    Ok(count as u64)
  }
}

// ─── SeedStore impl ──────────────────────────────────────────────────────────

impl SeedStore for SqliteStore {
  async fn exists(
    &self,
    kind: EntityKind,
    field: &str,
    value: &FieldValue,
  ) -> Result<bool, StoreError> {
    Ok(self.claim_exists(kind, field, value).await?)
  }

  async fn save(
    &self,
    entity: NewEntity,
  ) -> Result<PersistedEntity, StoreError> {
    let created_at = Utc::now();

    match self.save_entity(&entity, created_at).await? {
      SaveOutcome::Saved { id } => Ok(PersistedEntity {
        id: decode_id(id)?,
        kind: entity.kind,
        fields: entity.fields,
        relations: entity.relations,
        created_at,
      }),
      SaveOutcome::Collision { field } => {
        let value = entity.fields.get(&field).cloned().ok_or_else(|| {
          Error::Corrupt(format!("collision on absent field {field:?}"))
        })?;
        Err(StoreError::UniqueViolation { kind: entity.kind, field, value })
      }
    }
  }

  async fn get(
    &self,
    kind: EntityKind,
    id: EntityId,
  ) -> Result<Option<PersistedEntity>, StoreError> {
    Ok(self.fetch(kind, id).await?)
  }

  async fn list(
    &self,
    kind: EntityKind,
  ) -> Result<Vec<PersistedEntity>, StoreError> {
    Ok(self.fetch_all(kind).await?)
  }

  async fn count(&self, kind: EntityKind) -> Result<u64, StoreError> {
    Ok(self.count_kind(kind).await?)
  }
}
