use std::fmt;
use std::path::{Path, PathBuf};

use crate::build::BuildError;

/// What kind of file a successful target produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
  /// Output of a compiler or assembler stage.
  Object,
  /// A package archive, built, installed, or reused from the cache.
  Archive,
  /// A linked binary.
  Executable,
}

/// The file a target produced, available once it resolved successfully.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
  pub kind: ArtifactKind,
  pub path: PathBuf,
}

impl Artifact {
  pub fn object(path: impl Into<PathBuf>) -> Self {
    Self {
      kind: ArtifactKind::Object,
      path: path.into(),
    }
  }

  pub fn archive(path: impl Into<PathBuf>) -> Self {
    Self {
      kind: ArtifactKind::Archive,
      path: path.into(),
    }
  }

  pub fn executable(path: impl Into<PathBuf>) -> Self {
    Self {
      kind: ArtifactKind::Executable,
      path: path.into(),
    }
  }

  pub fn path(&self) -> &Path {
    &self.path
  }
}

impl fmt::Display for Artifact {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.path.display())
  }
}

/// Terminal outcome of a target.
pub type Outcome = Result<Artifact, BuildError>;
