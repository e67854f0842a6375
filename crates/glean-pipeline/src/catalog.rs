//! The set of models a summary may be generated with.

use glean_core::account::Plan;
use serde::Serialize;

use crate::{Error, Result};

#[derive(Debug, Clone, Serialize)]
pub struct ModelCatalog {
  pub default_model: String,
  /// Every offered model, the default included.
  pub models:        Vec<String>,
}

impl ModelCatalog {
  pub fn new(default_model: impl Into<String>, extra: impl IntoIterator<Item = String>) -> Self {
    let default_model = default_model.into();
    let mut models = vec![default_model.clone()];
    for m in extra {
      if !models.contains(&m) {
        models.push(m);
      }
    }
    Self { default_model, models }
  }

  pub fn contains(&self, model: &str) -> bool { self.models.iter().any(|m| m == model) }

  /// Pick the model for a request. Overrides are a pro feature: a free
  /// account's override is ignored, a pro account's must be offered.
  pub fn resolve(&self, plan: Plan, requested: Option<&str>) -> Result<String> {
    let requested = requested.map(str::trim).filter(|m| !m.is_empty());
    match requested {
      Some(model) if plan.is_premium() => {
        if self.contains(model) {
          Ok(model.to_owned())
        } else {
          Err(Error::UnknownModel(model.to_owned()))
        }
      }
      Some(model) => {
        tracing::debug!(model, "ignoring model override on free plan");
        Ok(self.default_model.clone())
      }
      None => Ok(self.default_model.clone()),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn catalog() -> ModelCatalog {
    ModelCatalog::new("gpt-4o-mini", ["gpt-4o".to_string(), "gpt-4o-mini".to_string()])
  }

  #[test]
  fn default_is_listed_once() {
    assert_eq!(catalog().models, vec!["gpt-4o-mini", "gpt-4o"]);
  }

  #[test]
  fn override_is_pro_only() {
    let c = catalog();
    assert_eq!(c.resolve(Plan::Pro, Some("gpt-4o")).unwrap(), "gpt-4o");
    assert_eq!(c.resolve(Plan::Free, Some("gpt-4o")).unwrap(), "gpt-4o-mini");
    assert_eq!(c.resolve(Plan::Pro, None).unwrap(), "gpt-4o-mini");
    assert!(matches!(
      c.resolve(Plan::Pro, Some("davinci")),
      Err(Error::UnknownModel(m)) if m == "davinci"
    ));
  }
}
