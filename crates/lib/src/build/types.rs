use thiserror::Error;

use crate::toolchain::ToolchainError;
use crate::unit::ResolveError;

/// Errors a build target can resolve to.
///
/// Cloneable so every waiter on a target observes the same value. Upstream
/// failures are propagated unchanged, so the error always names the stage and
/// unit that actually failed.
#[derive(Debug, Clone, Error)]
pub enum BuildError {
  /// The unit's own metadata was invalid; no stage work was attempted.
  #[error("{import_path}: {source}")]
  Metadata {
    import_path: String,
    #[source]
    source: ResolveError,
  },

  /// The import graph loops back on itself.
  #[error("import cycle not allowed: {}", .0.join(" -> "))]
  ImportCycle(Vec<String>),

  /// A toolchain invocation failed.
  #[error("{label}: {source}")]
  Stage {
    label: String,
    #[source]
    source: ToolchainError,
  },

  /// Copying a built package into the package directory failed.
  #[error("install {import_path}: {message}")]
  Install { import_path: String, message: String },

  /// The task producing a target went away without resolving it.
  #[error("{label}: target abandoned before completion")]
  Abandoned { label: String },
}

impl BuildError {
  pub fn stage(label: impl Into<String>, source: ToolchainError) -> Self {
    BuildError::Stage {
      label: label.into(),
      source,
    }
  }
}
