use std::{collections::BTreeSet, sync::Arc, thread};

use crate::{
  blueprint::{
    Blueprint, BlueprintOptions, BlueprintSet, FieldDefault, FieldSpec,
  },
  entity::{EntityKind, FieldMap, FieldValue},
  factory::EntityFactory,
  rotation::RoundRobin,
  rules::Rule,
  sequence::Sequence,
  store::{MemoryStore, SeedStore},
  Error, StoreError,
};

fn factory() -> EntityFactory {
  EntityFactory::new(
    BlueprintSet::standard(BlueprintOptions::default()),
    Arc::new(Sequence::starting_at(0)),
  )
}

fn overrides(pairs: &[(&str, FieldValue)]) -> FieldMap {
  pairs
    .iter()
    .map(|(name, value)| (name.to_string(), value.clone()))
    .collect()
}

// ─── Sequence ────────────────────────────────────────────────────────────────

#[test]
fn sequence_draws_increase_by_one() {
  let sequence = Sequence::starting_at(41);
  assert_eq!(sequence.next(), 42);
  assert_eq!(sequence.next(), 43);
  assert_eq!(sequence.next(), 44);
}

#[test]
fn sequence_concurrent_draws_are_distinct() {
  let sequence = Arc::new(Sequence::starting_at(0));

  let mut handles = Vec::new();
  for _ in 0..8 {
    let sequence = Arc::clone(&sequence);
    handles.push(thread::spawn(move || {
      (0..250).map(|_| sequence.next()).collect::<Vec<_>>()
    }));
  }

  let mut seen = BTreeSet::new();
  for handle in handles {
    for value in handle.join().unwrap() {
      assert!(seen.insert(value), "value {value} drawn twice");
    }
  }
  assert_eq!(seen.len(), 2000);
  assert_eq!(seen.first().copied(), Some(1));
  assert_eq!(seen.last().copied(), Some(2000));
}

// ─── Rotation ────────────────────────────────────────────────────────────────

#[test]
fn rotation_wraps_in_order() {
  let rotation = RoundRobin::new(vec!["a", "b", "c"]).unwrap();
  let drawn: Vec<_> = (0..7).map(|_| *rotation.next()).collect();
  assert_eq!(drawn, ["a", "b", "c", "a", "b", "c", "a"]);
}

#[test]
fn rotation_rejects_empty_collection() {
  let result = RoundRobin::<u8>::new(Vec::new());
  assert!(matches!(result, Err(Error::EmptyRotation)));
}

#[test]
fn rotation_concurrent_draws_stay_balanced() {
  let rotation = Arc::new(RoundRobin::new(vec![0usize, 1, 2]).unwrap());

  let mut handles = Vec::new();
  for _ in 0..6 {
    let rotation = Arc::clone(&rotation);
    handles.push(thread::spawn(move || {
      let mut counts = [0u32; 3];
      for _ in 0..4 {
        counts[*rotation.next()] += 1;
      }
      counts
    }));
  }

  // 24 draws over 3 elements: the shared cursor hands every element out
  // exactly 8 times no matter how the threads interleave.
  let mut totals = [0u32; 3];
  for handle in handles {
    for (total, count) in totals.iter_mut().zip(handle.join().unwrap()) {
      *total += count;
    }
  }
  assert_eq!(totals, [8, 8, 8]);
}

// ─── Rules ───────────────────────────────────────────────────────────────────

#[test]
fn required_rule_rejects_empty_values() {
  let rule = Rule::Required;
  assert!(rule.check("name", &FieldValue::text("bob")).is_ok());
  assert!(rule.check("keywords", &FieldValue::Int(0)).is_ok());

  let err = rule.check("name", &FieldValue::text("")).unwrap_err();
  assert_eq!(err.field, "name");
  assert_eq!(err.rule, "required");

  let empty_list = FieldValue::List(Vec::new());
  assert!(rule.check("keywords", &empty_list).is_err());
}

#[test]
fn email_rule_wants_a_dotted_domain() {
  let rule = Rule::Email;
  assert!(rule.check("email", &FieldValue::text("u1@example.test")).is_ok());

  for bad in ["plain", "@example.test", "u1@nodot", "u1@.bad", "u1@bad."] {
    assert!(
      rule.check("email", &FieldValue::text(bad)).is_err(),
      "accepted {bad:?}"
    );
  }
}

#[test]
fn min_length_rule_counts_characters_not_bytes() {
  let rule = Rule::MinLength(8);
  assert!(rule.check("password", &FieldValue::text("pässwörd")).is_ok());

  let err = rule.check("password", &FieldValue::text("short")).unwrap_err();
  assert_eq!(err.rule, "min_length");
}

// ─── Blueprints ──────────────────────────────────────────────────────────────

#[test]
fn pattern_defaults_draw_fresh_values() {
  let users = Blueprint::new(EntityKind::User, vec![FieldSpec::new(
    "code",
    FieldDefault::Pattern("u{n}-{n}".into()),
  )]);
  let set = BlueprintSet::custom(
    users,
    Blueprint::new(EntityKind::Topic, Vec::new()),
    Blueprint::new(EntityKind::Post, Vec::new()),
  );
  let factory = EntityFactory::new(set, Arc::new(Sequence::starting_at(0)));

  let pending = factory.create(EntityKind::User, FieldMap::new()).unwrap();
  assert_eq!(pending.fields.get("code"), Some(&FieldValue::text("u1-2")));
}

#[test]
fn standard_blueprints_flag_the_right_uniques() {
  let set = BlueprintSet::standard(BlueprintOptions::default());
  let users: Vec<_> = set.of(EntityKind::User).unique_fields().collect();
  assert_eq!(users, ["name", "email"]);
  let posts: Vec<_> = set.of(EntityKind::Post).unique_fields().collect();
  assert_eq!(posts, ["title"]);
  assert!(set.of(EntityKind::Topic).field("title").unwrap().unique);

  let relaxed =
    BlueprintSet::standard(BlueprintOptions { unique_topic_titles: false });
  assert!(!relaxed.of(EntityKind::Topic).field("title").unwrap().unique);
}

// ─── Factory ─────────────────────────────────────────────────────────────────

#[test]
fn create_applies_defaults_in_declaration_order() {
  let factory = factory();
  let pending = factory.create(EntityKind::User, FieldMap::new()).unwrap();

  assert_eq!(pending.fields.get("name"), Some(&FieldValue::text("user1")));
  assert_eq!(
    pending.fields.get("email"),
    Some(&FieldValue::text("user2@example.test"))
  );
  assert_eq!(
    pending.fields.get("password"),
    Some(&FieldValue::text("password3"))
  );
}

#[test]
fn create_lets_overrides_win() {
  let factory = factory();
  let pending = factory
    .create(
      EntityKind::User,
      overrides(&[("name", FieldValue::text("fixed"))]),
    )
    .unwrap();

  assert_eq!(pending.fields.get("name"), Some(&FieldValue::text("fixed")));
  // The email default still draws from the shared sequence.
  assert_eq!(
    pending.fields.get("email"),
    Some(&FieldValue::text("user1@example.test"))
  );
}

#[test]
fn create_rejects_unknown_override_fields() {
  let factory = factory();
  let result = factory.create(
    EntityKind::User,
    overrides(&[("nickname", FieldValue::text("bob"))]),
  );

  assert!(matches!(
    result,
    Err(Error::UnknownField { kind: EntityKind::User, ref field })
      if field == "nickname"
  ));
}

#[test]
fn create_rejects_rule_violations() {
  let factory = factory();
  let result = factory.create(
    EntityKind::User,
    overrides(&[("name", FieldValue::text(""))]),
  );

  match result {
    Err(Error::Validation(err)) => {
      assert_eq!(err.field, "name");
      assert_eq!(err.rule, "required");
    }
    other => panic!("expected a validation error, got {other:?}"),
  }
}

#[tokio::test]
async fn persist_assigns_sequential_identities_per_kind() {
  let factory = factory();
  let store = MemoryStore::new();

  for expected in 1..=3 {
    let pending = factory.create(EntityKind::User, FieldMap::new()).unwrap();
    let user = factory.persist(&store, pending).await.unwrap();
    assert_eq!(user.id.0, expected);
  }
  let pending = factory.create(EntityKind::Topic, FieldMap::new()).unwrap();
  let topic = factory.persist(&store, pending).await.unwrap();
  assert_eq!(topic.id.0, 1);

  assert_eq!(store.count(EntityKind::User).await.unwrap(), 3);
  assert_eq!(store.count(EntityKind::Topic).await.unwrap(), 1);
}

#[tokio::test]
async fn persist_rejects_duplicate_unique_values() {
  let factory = factory();
  let store = MemoryStore::new();

  let first = factory
    .create(EntityKind::User, overrides(&[("name", FieldValue::text("dupe"))]))
    .unwrap();
  factory.persist(&store, first).await.unwrap();

  let second = factory
    .create(EntityKind::User, overrides(&[("name", FieldValue::text("dupe"))]))
    .unwrap();
  let result = factory.persist(&store, second).await;

  assert!(matches!(
    result,
    Err(Error::Store(StoreError::UniqueViolation { ref field, .. }))
      if field == "name"
  ));
  assert_eq!(store.count(EntityKind::User).await.unwrap(), 1);
}

#[tokio::test]
async fn persist_honours_the_topic_title_toggle() {
  let relaxed = EntityFactory::new(
    BlueprintSet::standard(BlueprintOptions { unique_topic_titles: false }),
    Arc::new(Sequence::starting_at(0)),
  );
  let store = MemoryStore::new();

  for _ in 0..2 {
    let pending = relaxed
      .create(
        EntityKind::Topic,
        overrides(&[("title", FieldValue::text("Same Title"))]),
      )
      .unwrap();
    relaxed.persist(&store, pending).await.unwrap();
  }
  assert_eq!(store.count(EntityKind::Topic).await.unwrap(), 2);
}

#[test]
fn link_replaces_a_previous_target() {
  let factory = factory();
  let mut pending =
    factory.create(EntityKind::Post, post_overrides()).unwrap();

  let first = persisted_user(1);
  let second = persisted_user(2);
  pending.link("author", &first);
  pending.link("author", &second);

  assert_eq!(pending.relation("author").unwrap().id.0, 2);
}

// ─── Memory store ────────────────────────────────────────────────────────────

#[tokio::test]
async fn save_claims_all_uniques_or_none() {
  let store = MemoryStore::new();
  let factory = factory();

  let first = factory
    .create(
      EntityKind::User,
      overrides(&[
        ("name", FieldValue::text("same")),
        ("email", FieldValue::text("a@example.test")),
      ]),
    )
    .unwrap();
  store
    .save(first.into_new(vec!["name".into(), "email".into()]))
    .await
    .unwrap();

  let second = factory
    .create(
      EntityKind::User,
      overrides(&[
        ("name", FieldValue::text("same")),
        ("email", FieldValue::text("b@example.test")),
      ]),
    )
    .unwrap();
  let result = store
    .save(second.into_new(vec!["name".into(), "email".into()]))
    .await;
  assert!(matches!(
    result,
    Err(StoreError::UniqueViolation { ref field, .. })
      if field == "name"
  ));

  // The failed save must not leave a stray claim for its other unique.
  let leaked = store
    .exists(
      EntityKind::User,
      "email",
      &FieldValue::text("b@example.test"),
    )
    .await
    .unwrap();
  assert!(!leaked);
  assert_eq!(store.count(EntityKind::User).await.unwrap(), 1);
}

#[tokio::test]
async fn memory_store_lists_in_identity_order() {
  let store = MemoryStore::new();
  let factory = factory();

  for _ in 0..4 {
    let pending = factory.create(EntityKind::User, FieldMap::new()).unwrap();
    factory.persist(&store, pending).await.unwrap();
  }

  let users = store.list(EntityKind::User).await.unwrap();
  let ids: Vec<_> = users.iter().map(|user| user.id.0).collect();
  assert_eq!(ids, [1, 2, 3, 4]);
}

#[tokio::test]
async fn relations_survive_the_round_trip() {
  let store = MemoryStore::new();
  let factory = factory();

  let author = {
    let pending = factory.create(EntityKind::User, FieldMap::new()).unwrap();
    factory.persist(&store, pending).await.unwrap()
  };
  let topic = {
    let pending = factory.create(EntityKind::Topic, FieldMap::new()).unwrap();
    factory.persist(&store, pending).await.unwrap()
  };

  let mut pending =
    factory.create(EntityKind::Post, post_overrides()).unwrap();
  pending.link("author", &author);
  pending.link("topic", &topic);
  let post = factory.persist(&store, pending).await.unwrap();

  let fetched = store
    .get(EntityKind::Post, post.id)
    .await
    .unwrap()
    .expect("post should exist");
  assert_eq!(fetched.relation("author").unwrap().id, author.id);
  assert_eq!(fetched.relation("topic").unwrap().kind, EntityKind::Topic);
  assert!(fetched.relation("parent").is_none());
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

fn post_overrides() -> FieldMap {
  overrides(&[
    ("author_name", FieldValue::text("user1")),
    ("author_id", FieldValue::Int(1)),
  ])
}

fn persisted_user(id: u64) -> crate::entity::PersistedEntity {
  crate::entity::PersistedEntity {
    id:         crate::entity::EntityId(id),
    kind:       EntityKind::User,
    fields:     FieldMap::new(),
    relations:  Default::default(),
    created_at: chrono::Utc::now(),
  }
}
