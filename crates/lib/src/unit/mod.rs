//! Compilation units and their resolution.
//!
//! A [`CompilationUnit`] is one package to build. Units are produced by a
//! [`Resolver`] before the build core sees them; the core only reads them.

mod types;

use std::collections::BTreeSet;

pub use types::*;

/// Resolves an import path to unit metadata.
pub trait Resolver: Send + Sync {
  fn resolve(&self, import_path: &str, scope: Scope) -> Result<CompilationUnit, ResolveError>;
}

/// Import paths that are assumed pre-built and are pruned from the graph.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct StdLib(BTreeSet<String>);

impl StdLib {
  pub fn new<I, S>(paths: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    Self(paths.into_iter().map(Into::into).collect())
  }

  pub fn contains(&self, import_path: &str) -> bool {
    self.0.contains(import_path)
  }

  pub fn len(&self) -> usize {
    self.0.len()
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }
}
