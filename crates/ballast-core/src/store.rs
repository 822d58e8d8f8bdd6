//! The `SeedStore` trait and the in-memory reference backend.

use std::{
  collections::{BTreeMap, HashMap, HashSet},
  future::Future,
  sync::{Mutex, MutexGuard, PoisonError},
};

use chrono::Utc;

use crate::{
  entity::{EntityId, EntityKind, FieldValue, NewEntity, PersistedEntity},
  error::StoreError,
};

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over the store the seeder writes through.
///
/// `save` must be atomic per entity: the record, its relation references and
/// its unique-value claims become durable together or not at all. All methods
/// return `Send` futures because many creation tasks share one store
/// concurrently.
pub trait SeedStore: Send + Sync {
  /// Whether some entity of `kind` has already claimed `value` for `field`.
  fn exists<'a>(
    &'a self,
    kind: EntityKind,
    field: &'a str,
    value: &'a FieldValue,
  ) -> impl Future<Output = Result<bool, StoreError>> + Send + 'a;

  /// Persist one entity: claim its unique values, assign the next identity
  /// of its kind and record its relation references, atomically.
  fn save(
    &self,
    entity: NewEntity,
  ) -> impl Future<Output = Result<PersistedEntity, StoreError>> + Send + '_;

  /// Fetch one persisted entity; `None` if the identity was never assigned.
  fn get(
    &self,
    kind: EntityKind,
    id: EntityId,
  ) -> impl Future<Output = Result<Option<PersistedEntity>, StoreError>>
       + Send
       + '_;

  /// All persisted entities of `kind`, in identity order.
  fn list(
    &self,
    kind: EntityKind,
  ) -> impl Future<Output = Result<Vec<PersistedEntity>, StoreError>>
       + Send
       + '_;

  /// Number of persisted entities of `kind`.
  fn count(
    &self,
    kind: EntityKind,
  ) -> impl Future<Output = Result<u64, StoreError>> + Send + '_;
}

// ─── In-memory backend ───────────────────────────────────────────────────────

/// A fully in-memory [`SeedStore`].
///
/// Backs tests and dry runs. One mutex over the whole state makes every save
/// trivially atomic; the lock is never held across an await point.
#[derive(Debug, Default)]
pub struct MemoryStore {
  inner: Mutex<MemoryInner>,
}

#[derive(Debug, Default)]
struct MemoryInner {
  entities: BTreeMap<(EntityKind, EntityId), PersistedEntity>,
  claims:   HashSet<(EntityKind, String, FieldValue)>,
  counters: HashMap<EntityKind, u64>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }

  fn lock(&self) -> MutexGuard<'_, MemoryInner> {
    self.inner.lock().unwrap_or_else(PoisonError::into_inner)
  }
}

impl SeedStore for MemoryStore {
  async fn exists(
    &self,
    kind: EntityKind,
    field: &str,
    value: &FieldValue,
  ) -> Result<bool, StoreError> {
    let inner = self.lock();
    Ok(
      inner
        .claims
        .contains(&(kind, field.to_owned(), value.clone())),
    )
  }

  async fn save(
    &self,
    entity: NewEntity,
  ) -> Result<PersistedEntity, StoreError> {
    let mut inner = self.lock();

    for field in &entity.uniques {
      if let Some(value) = entity.fields.get(field) {
        if inner
          .claims
          .contains(&(entity.kind, field.clone(), value.clone()))
        {
          return Err(StoreError::UniqueViolation {
            kind:  entity.kind,
            field: field.clone(),
            value: value.clone(),
          });
        }
      }
    }

    let next = inner.counters.entry(entity.kind).or_insert(0);
    *next += 1;
    let id = EntityId(*next);

    for field in &entity.uniques {
      if let Some(value) = entity.fields.get(field) {
        inner
          .claims
          .insert((entity.kind, field.clone(), value.clone()));
      }
    }

    let persisted = PersistedEntity {
      id,
      kind: entity.kind,
      fields: entity.fields,
      relations: entity.relations,
      created_at: Utc::now(),
    };
    inner.entities.insert((entity.kind, id), persisted.clone());

    Ok(persisted)
  }

  async fn get(
    &self,
    kind: EntityKind,
    id: EntityId,
  ) -> Result<Option<PersistedEntity>, StoreError> {
    let inner = self.lock();
    Ok(inner.entities.get(&(kind, id)).cloned())
  }

  async fn list(
    &self,
    kind: EntityKind,
  ) -> Result<Vec<PersistedEntity>, StoreError> {
    let inner = self.lock();
    Ok(
      inner
        .entities
        .range((kind, EntityId(0))..=(kind, EntityId(u64::MAX)))
        .map(|(_, entity)| entity.clone())
        .collect(),
    )
  }

  async fn count(&self, kind: EntityKind) -> Result<u64, StoreError> {
    let inner = self.lock();
    let count = inner
      .entities
      .range((kind, EntityId(0))..=(kind, EntityId(u64::MAX)))
      .count();
    Ok(count as u64)
  }
}
