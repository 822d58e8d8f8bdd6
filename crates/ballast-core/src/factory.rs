//! Builds, validates and persists entities from blueprints.

use std::sync::Arc;

use crate::{
  blueprint::BlueprintSet,
  entity::{EntityKind, FieldMap, PendingEntity, PersistedEntity},
  error::StoreError,
  sequence::Sequence,
  store::SeedStore,
  Error, Result,
};

/// Creates entities of any kind from a blueprint set.
///
/// [`EntityFactory::create`] is pure in-memory work: merge defaults with
/// overrides, then validate. [`EntityFactory::persist`] is the single point
/// where an entity becomes durable. Keeping the two apart lets callers attach
/// relations in between, once the targets they need have store identities.
#[derive(Debug, Clone)]
pub struct EntityFactory {
  blueprints: BlueprintSet,
  sequence:   Arc<Sequence>,
}

impl EntityFactory {
  pub fn new(blueprints: BlueprintSet, sequence: Arc<Sequence>) -> Self {
    Self { blueprints, sequence }
  }

  /// Build a pending entity: blueprint defaults first, `overrides` on top,
  /// then every field checked against its rules.
  ///
  /// Overriding a field the blueprint does not declare is an error; silently
  /// dropping the value would hide typos in callers. A rule violation aborts
  /// the creation before anything touches a store.
  pub fn create(
    &self,
    kind: EntityKind,
    overrides: FieldMap,
  ) -> Result<PendingEntity> {
    let blueprint = self.blueprints.of(kind);

    for name in overrides.keys() {
      if blueprint.field(name).is_none() {
        return Err(Error::UnknownField { kind, field: name.clone() });
      }
    }

    let mut fields = FieldMap::new();
    for spec in &blueprint.fields {
      let value = match overrides.get(&spec.name) {
        Some(value) => value.clone(),
        None => spec.default.produce(&self.sequence),
      };
      for rule in &spec.rules {
        rule.check(&spec.name, &value)?;
      }
      fields.insert(spec.name.clone(), value);
    }

    Ok(PendingEntity::new(kind, fields))
  }

  /// Persist `pending` through `store`.
  ///
  /// Unique fields are probed with [`SeedStore::exists`] first, so the
  /// common collision reports as a validation-time failure; the save itself
  /// re-claims the values atomically and remains the actual guarantee.
  pub async fn persist<S: SeedStore>(
    &self,
    store: &S,
    pending: PendingEntity,
  ) -> Result<PersistedEntity> {
    let blueprint = self.blueprints.of(pending.kind);
    let uniques: Vec<String> =
      blueprint.unique_fields().map(str::to_owned).collect();

    for field in &uniques {
      if let Some(value) = pending.fields.get(field) {
        if store.exists(pending.kind, field, value).await? {
          return Err(
            StoreError::UniqueViolation {
              kind:  pending.kind,
              field: field.clone(),
              value: value.clone(),
            }
            .into(),
          );
        }
      }
    }

    let persisted = store.save(pending.into_new(uniques)).await?;
    Ok(persisted)
  }
}
