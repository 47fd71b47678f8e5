use serde::Serialize;
use thiserror::Error;

use crate::unit::{ResolveError, Scope};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanError {
  #[error("cannot resolve {import_path}: {source}")]
  Resolve {
    import_path: String,
    #[source]
    source: ResolveError,
  },

  #[error("import cycle not allowed involving {0}")]
  Cycle(String),
}

/// One unit in a build plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanUnit {
  pub import_path: String,
  pub scope: Scope,
  pub command: bool,
  pub stale: bool,
  /// The unit's metadata error, if any.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub error: Option<String>,
}

/// Units grouped into waves; every unit's dependencies are in earlier waves.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Plan {
  pub waves: Vec<Vec<PlanUnit>>,
}

impl Plan {
  pub fn unit_count(&self) -> usize {
    self.waves.iter().map(Vec::len).sum()
  }

  pub fn stale_count(&self) -> usize {
    self.waves.iter().flatten().filter(|u| u.stale).count()
  }
}
