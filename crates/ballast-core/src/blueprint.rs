//! Per-kind field blueprints: defaults, validation rules and uniqueness.

use serde::{Deserialize, Serialize};

use crate::{
  entity::{EntityKind, FieldValue},
  rules::Rule,
  sequence::Sequence,
};

// ─── Field defaults ──────────────────────────────────────────────────────────

/// Where a field's value comes from when the caller does not override it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "default", content = "value", rename_all = "snake_case")]
pub enum FieldDefault {
  /// A fixed value, used as-is.
  Value(FieldValue),
  /// A text template; every `{n}` is replaced with its own sequence draw.
  Pattern(String),
  /// UNIX epoch seconds at the moment of creation.
  Timestamp,
}

impl FieldDefault {
  /// Materialise the default, drawing from `sequence` where the template
  /// calls for fresh values.
  pub(crate) fn produce(&self, sequence: &Sequence) -> FieldValue {
    match self {
      Self::Value(value) => value.clone(),
      Self::Pattern(pattern) => {
        FieldValue::Text(expand_pattern(pattern, sequence))
      }
      Self::Timestamp => FieldValue::Int(chrono::Utc::now().timestamp()),
    }
  }
}

fn expand_pattern(pattern: &str, sequence: &Sequence) -> String {
  let mut out = String::with_capacity(pattern.len() + 8);
  let mut rest = pattern;
  while let Some(at) = rest.find("{n}") {
    out.push_str(&rest[..at]);
    out.push_str(&sequence.next().to_string());
    rest = &rest[at + 3..];
  }
  out.push_str(rest);
  out
}

// ─── Field and kind blueprints ───────────────────────────────────────────────

/// One field of an entity kind: name, default, rules and uniqueness flag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldSpec {
  pub name:    String,
  pub default: FieldDefault,
  #[serde(default)]
  pub rules:   Vec<Rule>,
  /// Unique fields have their values claimed in the store; a second entity
  /// of the kind with the same value fails its save.
  #[serde(default)]
  pub unique:  bool,
}

impl FieldSpec {
  pub fn new(name: impl Into<String>, default: FieldDefault) -> Self {
    Self {
      name: name.into(),
      default,
      rules: Vec::new(),
      unique: false,
    }
  }

  pub fn with_rule(mut self, rule: Rule) -> Self {
    self.rules.push(rule);
    self
  }

  pub fn unique(mut self) -> Self {
    self.unique = true;
    self
  }
}

/// All fields of one entity kind, in declaration order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Blueprint {
  pub kind:   EntityKind,
  pub fields: Vec<FieldSpec>,
}

impl Blueprint {
  pub fn new(kind: EntityKind, fields: Vec<FieldSpec>) -> Self {
    Self { kind, fields }
  }

  pub fn field(&self, name: &str) -> Option<&FieldSpec> {
    self.fields.iter().find(|spec| spec.name == name)
  }

  /// Names of all fields flagged unique, in declaration order.
  pub fn unique_fields(&self) -> impl Iterator<Item = &str> {
    self
      .fields
      .iter()
      .filter(|spec| spec.unique)
      .map(|spec| spec.name.as_str())
  }
}

// ─── The standard set ────────────────────────────────────────────────────────

/// Switches for the stock blueprints.
#[derive(Debug, Clone, Copy)]
pub struct BlueprintOptions {
  /// Whether topic titles are claimed as unique. Tight loops generating
  /// titles from a shared sequence never collide, so the claim is optional
  /// load on the store rather than a correctness requirement.
  pub unique_topic_titles: bool,
}

impl Default for BlueprintOptions {
  fn default() -> Self {
    Self { unique_topic_titles: true }
  }
}

/// The blueprints for every kind the seeder knows.
#[derive(Debug, Clone)]
pub struct BlueprintSet {
  users:  Blueprint,
  topics: Blueprint,
  posts:  Blueprint,
}

impl BlueprintSet {
  /// The stock forum-shaped blueprints: users with unique names and
  /// addresses, topics titled from the sequence, posts carrying the fields a
  /// real board would store.
  pub fn standard(options: BlueprintOptions) -> Self {
    let users = Blueprint::new(EntityKind::User, vec![
      FieldSpec::new("name", FieldDefault::Pattern("user{n}".into()))
        .with_rule(Rule::Required)
        .unique(),
      FieldSpec::new(
        "email",
        FieldDefault::Pattern("user{n}@example.test".into()),
      )
      .with_rule(Rule::Required)
      .with_rule(Rule::Email)
      .unique(),
      FieldSpec::new("password", FieldDefault::Pattern("password{n}".into()))
        .with_rule(Rule::MinLength(8)),
    ]);

    let mut title =
      FieldSpec::new("title", FieldDefault::Pattern("Topic #{n}".into()))
        .with_rule(Rule::Required);
    if options.unique_topic_titles {
      title = title.unique();
    }
    let topics = Blueprint::new(EntityKind::Topic, vec![
      title,
      FieldSpec::new(
        "keywords",
        FieldDefault::Value(FieldValue::List(Vec::new())),
      ),
    ]);

    let posts = Blueprint::new(EntityKind::Post, vec![
      FieldSpec::new("title", FieldDefault::Pattern("Post #{n}".into()))
        .with_rule(Rule::Required)
        .unique(),
      FieldSpec::new(
        "body",
        FieldDefault::Pattern("Generated post body {n}".into()),
      )
      .with_rule(Rule::Required)
      .with_rule(Rule::MinLength(10)),
      FieldSpec::new("author_name", FieldDefault::Value(FieldValue::text("")))
        .with_rule(Rule::Required),
      FieldSpec::new("author_id", FieldDefault::Value(FieldValue::Int(0))),
      FieldSpec::new("ts", FieldDefault::Timestamp),
      FieldSpec::new("flags", FieldDefault::Value(FieldValue::Int(0))),
      FieldSpec::new("ip", FieldDefault::Value(FieldValue::text("127.0.0.1"))),
      FieldSpec::new("icon_id", FieldDefault::Value(FieldValue::Int(0))),
      FieldSpec::new(
        "attach_ids",
        FieldDefault::Value(FieldValue::List(Vec::new())),
      ),
    ]);

    Self { users, topics, posts }
  }

  /// Assemble a set from hand-built blueprints.
  pub fn custom(users: Blueprint, topics: Blueprint, posts: Blueprint) -> Self {
    Self { users, topics, posts }
  }

  pub fn of(&self, kind: EntityKind) -> &Blueprint {
    match kind {
      EntityKind::User => &self.users,
      EntityKind::Topic => &self.topics,
      EntityKind::Post => &self.posts,
    }
  }
}
