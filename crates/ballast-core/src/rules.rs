//! Field validation rules.

use serde::{Deserialize, Serialize};

use crate::{entity::FieldValue, error::ValidationError};

/// A single validation predicate attached to a blueprint field.
///
/// Rules are data rather than code so a blueprint loaded from configuration
/// can tighten or relax validation without a rebuild.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "rule", content = "arg", rename_all = "snake_case")]
pub enum Rule {
  /// Text must be non-empty; a list must have at least one element.
  Required,
  /// Text must have the rough shape of an email address.
  Email,
  /// Text must be at least this many characters long.
  MinLength(usize),
}

impl Rule {
  pub fn name(&self) -> &'static str {
    match self {
      Self::Required => "required",
      Self::Email => "email",
      Self::MinLength(_) => "min_length",
    }
  }

  /// Check `value` against this rule, reporting the offending field, rule
  /// name and value on violation.
  pub fn check(
    &self,
    field: &str,
    value: &FieldValue,
  ) -> Result<(), ValidationError> {
    let ok = match self {
      Self::Required => match value {
        FieldValue::Text(text) => !text.is_empty(),
        FieldValue::List(items) => !items.is_empty(),
        FieldValue::Int(_) | FieldValue::Bool(_) => true,
      },
      Self::Email => {
        matches!(value, FieldValue::Text(text) if looks_like_email(text))
      }
      Self::MinLength(min) => {
        matches!(value, FieldValue::Text(text) if text.chars().count() >= *min)
      }
    };

    if ok {
      Ok(())
    } else {
      Err(ValidationError {
        field: field.to_owned(),
        rule:  self.name(),
        value: value.clone(),
      })
    }
  }
}

/// Minimal shape check: one `@` with a non-empty local part and a dotted
/// domain. Real address validation is out of scope for generated data.
fn looks_like_email(text: &str) -> bool {
  let Some((local, domain)) = text.split_once('@') else {
    return false;
  };
  !local.is_empty()
    && domain.contains('.')
    && !domain.starts_with('.')
    && !domain.ends_with('.')
}
