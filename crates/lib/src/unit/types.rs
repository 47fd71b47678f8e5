use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The scope a unit is built in.
///
/// Test-scope units are compiled into their own object directory, get the
/// unit's extra include path, and are never installed.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
  #[default]
  Normal,
  Test,
}

impl Scope {
  pub fn as_str(self) -> &'static str {
    match self {
      Scope::Normal => "normal",
      Scope::Test => "test",
    }
  }
}

impl fmt::Display for Scope {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Identifies one unit build: the same import path may be built once per scope.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UnitKey {
  pub scope: Scope,
  pub import_path: String,
}

impl UnitKey {
  pub fn new(scope: Scope, import_path: impl Into<String>) -> Self {
    Self {
      scope,
      import_path: import_path.into(),
    }
  }
}

impl fmt::Display for UnitKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "compile:{}:{}", self.scope, self.import_path)
  }
}

/// Errors produced while resolving an import path to a unit.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
  #[error("cannot find package {0}")]
  NotFound(String),

  #[error("missing source file {}", path.display())]
  MissingSource { path: PathBuf },

  #[error("invalid package {import_path}: {message}")]
  Invalid { import_path: String, message: String },
}

/// One buildable package, as produced by a [`Resolver`](super::Resolver).
///
/// Units are read-only once resolved and are shared behind an `Arc` by every
/// target that builds them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilationUnit {
  /// Unique identifier, e.g. `example.com/lib`.
  pub import_path: String,
  /// Directory containing the unit's sources.
  pub dir: PathBuf,
  pub scope: Scope,
  /// Primary source files, relative to `dir`.
  pub files: Vec<String>,
  /// Assembly source files, relative to `dir`.
  pub sfiles: Vec<String>,
  /// The compiler output alone stands in for the whole package.
  pub complete: bool,
  /// Import paths this unit depends on.
  pub imports: Vec<String>,
  /// The unit links into an executable.
  pub command: bool,
  /// Additional include directory for test-scope compile and link stages.
  pub extra_includes: Option<PathBuf>,
  /// Outcome of resolving this unit's own metadata. A failure here gates all
  /// further processing.
  pub metadata: Result<(), ResolveError>,
}

impl CompilationUnit {
  pub fn new(import_path: impl Into<String>, dir: impl Into<PathBuf>) -> Self {
    Self {
      import_path: import_path.into(),
      dir: dir.into(),
      scope: Scope::Normal,
      files: Vec::new(),
      sfiles: Vec::new(),
      complete: true,
      imports: Vec::new(),
      command: false,
      extra_includes: None,
      metadata: Ok(()),
    }
  }

  /// A placeholder for an import path that could not be resolved.
  pub fn unresolved(import_path: impl Into<String>, err: ResolveError) -> Self {
    let mut unit = Self::new(import_path, PathBuf::new());
    unit.metadata = Err(err);
    unit
  }

  pub fn with_scope(mut self, scope: Scope) -> Self {
    self.scope = scope;
    self
  }

  pub fn with_files<I, S>(mut self, files: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.files = files.into_iter().map(Into::into).collect();
    self
  }

  pub fn with_sfiles<I, S>(mut self, sfiles: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.sfiles = sfiles.into_iter().map(Into::into).collect();
    self
  }

  pub fn with_imports<I, S>(mut self, imports: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.imports = imports.into_iter().map(Into::into).collect();
    self
  }

  pub fn with_complete(mut self, complete: bool) -> Self {
    self.complete = complete;
    self
  }

  pub fn with_command(mut self, command: bool) -> Self {
    self.command = command;
    self
  }

  pub fn with_extra_includes(mut self, dir: impl Into<PathBuf>) -> Self {
    self.extra_includes = Some(dir.into());
    self
  }

  pub fn with_metadata(mut self, metadata: Result<(), ResolveError>) -> Self {
    self.metadata = metadata;
    self
  }

  /// The last element of the import path.
  pub fn name(&self) -> &str {
    self.import_path.rsplit('/').next().unwrap_or(&self.import_path)
  }

  pub fn key(&self) -> UnitKey {
    UnitKey::new(self.scope, self.import_path.clone())
  }

  pub fn is_test(&self) -> bool {
    self.scope == Scope::Test
  }
}

impl fmt::Display for CompilationUnit {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self.scope {
      Scope::Normal => f.write_str(&self.import_path),
      Scope::Test => write!(f, "{} [test]", self.import_path),
    }
  }
}
